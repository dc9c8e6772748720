use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::overlay::remove_overlays;
use crate::app::ports::{BrowserLauncherPort, BrowserPort, CaptureResult, PageCapturePort, PagePort};
use crate::config::BrowserSettings;
use crate::constants::{
    NAVIGATION_TIMEOUT_SECS, SETTLE_DELAY_MS, USER_AGENT, VIEWPORT_HEIGHT, VIEWPORT_WIDTH,
};
use crate::error::Result;
use crate::metrics::PipelineMetrics;

#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    pub navigation_timeout: Duration,
    /// Pause after overlay cleanup so late layout shifts settle.
    pub settle_delay: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            user_agent: USER_AGENT.to_string(),
            navigation_timeout: Duration::from_secs(NAVIGATION_TIMEOUT_SECS),
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
        }
    }
}

impl From<&BrowserSettings> for CaptureOptions {
    fn from(settings: &BrowserSettings) -> Self {
        Self {
            viewport_width: settings.viewport_width,
            viewport_height: settings.viewport_height,
            navigation_timeout: Duration::from_secs(settings.navigation_timeout_secs),
            ..Self::default()
        }
    }
}

/// One shared browser per process, launched lazily on first capture.
///
/// The launch happens under the lock, so concurrent first captures wait for a
/// single launch instead of racing to start several browsers. A browser that
/// lost its connection is replaced on the next acquire.
pub struct BrowserSession<L: BrowserLauncherPort> {
    launcher: L,
    options: CaptureOptions,
    browser: Mutex<Option<Arc<dyn BrowserPort>>>,
}

impl<L: BrowserLauncherPort> BrowserSession<L> {
    pub fn new(launcher: L, options: CaptureOptions) -> Self {
        Self {
            launcher,
            options,
            browser: Mutex::new(None),
        }
    }

    pub async fn acquire(&self) -> Result<Arc<dyn BrowserPort>> {
        let mut slot = self.browser.lock().await;
        if let Some(browser) = slot.as_ref() {
            if browser.is_connected().await {
                return Ok(browser.clone());
            }
            warn!("Browser disconnected, relaunching");
        }

        let browser = self.launcher.launch().await?;
        info!("Browser session started");
        *slot = Some(browser.clone());
        Ok(browser)
    }

    /// Close the shared browser if one is running. Safe to call repeatedly.
    pub async fn teardown(&self) {
        let browser = self.browser.lock().await.take();
        if let Some(browser) = browser {
            match browser.close().await {
                Ok(()) => info!("Browser session closed"),
                Err(e) => warn!("Failed to close browser cleanly: {}", e),
            }
        }
    }

    async fn render(&self, page: &dyn PagePort, url: &str) -> Result<CaptureResult> {
        let opts = &self.options;
        page.set_viewport(opts.viewport_width, opts.viewport_height)
            .await?;
        page.set_user_agent(&opts.user_agent).await?;
        page.navigate(url, opts.navigation_timeout).await?;

        match remove_overlays(page).await {
            Ok(removed) => debug!(removed, "Overlay cleanup finished"),
            Err(e) => debug!("Overlay cleanup skipped: {}", e),
        }
        tokio::time::sleep(opts.settle_delay).await;

        let screenshot = page.screenshot_png().await?;
        let html = page.content().await?;
        Ok(CaptureResult {
            screenshot,
            html,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl<L: BrowserLauncherPort> PageCapturePort for BrowserSession<L> {
    #[instrument(skip(self), fields(url = %url))]
    async fn capture(&self, url: &str) -> Result<CaptureResult> {
        let started = Instant::now();
        let browser = self.acquire().await?;
        let page = browser.new_page().await?;

        let result = self.render(page.as_ref(), url).await;

        if let Err(e) = page.close().await {
            warn!("Failed to close page: {}", e);
        }
        PipelineMetrics::record_capture_duration(started.elapsed().as_secs_f64());

        match &result {
            Ok(capture) => info!(
                screenshot_bytes = capture.screenshot.len(),
                html_bytes = capture.html.len(),
                "Captured page"
            ),
            Err(e) => warn!("Capture failed: {}", e),
        }
        result
    }
}
