pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod retry;
pub mod types;

// Page analysis and AI contracts
pub mod extract;
pub mod merge;
pub mod mock;
pub mod prompts;

// Use cases and ports, with their adapters
pub mod app;
pub mod infra;
