pub mod event_pipeline;
pub mod ports;
