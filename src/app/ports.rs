use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// Rendered appearance and markup of a page.
#[derive(Clone, Debug)]
pub struct CaptureResult {
    /// Viewport-only PNG.
    pub screenshot: Vec<u8>,
    pub html: String,
    pub url: String,
}

#[async_trait]
pub trait PageCapturePort: Send + Sync {
    async fn capture(&self, url: &str) -> Result<CaptureResult>;
}

/// Narrow capability set every AI backend provides. Responses are raw text;
/// decoding belongs to the prompt templates.
#[async_trait]
pub trait AiGatewayPort: Send + Sync {
    async fn complete_text(&self, prompt: &str, json_mode: bool) -> Result<String>;
    async fn complete_vision(&self, prompt: &str, image_png: &[u8]) -> Result<String>;
    /// Returns a URL (possibly a `data:` URL) of the generated image.
    async fn generate_image(&self, prompt: &str) -> Result<String>;
}

// Browser control surface used by the capture session
#[async_trait]
pub trait BrowserLauncherPort: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn BrowserPort>>;
}

#[async_trait]
pub trait BrowserPort: Send + Sync {
    async fn is_connected(&self) -> bool;
    async fn new_page(&self) -> Result<Box<dyn PagePort>>;
    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait PagePort: Send + Sync {
    async fn set_viewport(&self, width: u32, height: u32) -> Result<()>;
    async fn set_user_agent(&self, user_agent: &str) -> Result<()>;
    /// Navigate and wait until the page has loaded and its network is mostly
    /// idle, bounded by `timeout`.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;
    /// Run a script in the page and return its string result.
    async fn evaluate(&self, script: &str) -> Result<String>;
    async fn screenshot_png(&self) -> Result<Vec<u8>>;
    async fn content(&self) -> Result<String>;
    async fn close(&self) -> Result<()>;
}
