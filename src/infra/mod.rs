pub mod ai_backend;
pub mod anthropic;
pub mod browser_session;
pub mod chrome;
pub mod openai;
pub mod overlay;
