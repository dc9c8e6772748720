//! Headless Chrome adapter for the browser ports.
//!
//! `headless_chrome` drives the DevTools protocol synchronously, so every
//! call is moved onto the blocking pool.

use anyhow::Context;
use async_trait::async_trait;
use headless_chrome::protocol::cdp::Emulation::SetDeviceMetricsOverride;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::app::ports::{BrowserLauncherPort, BrowserPort, PagePort};
use crate::error::{PipelineError, Result};

/// The DevTools connection is dropped after this long without traffic.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(600);

/// A browser that cannot report its version within this window is treated
/// as gone.
const LIVENESS_TIMEOUT: Duration = Duration::from_secs(5);

/// The page counts as network-idle once no new resource has finished loading
/// for this long.
const NETWORK_QUIET: Duration = Duration::from_millis(500);
const NETWORK_POLL: Duration = Duration::from_millis(250);
/// Upper bound on the idle wait after the load event.
const NETWORK_IDLE_MAX: Duration = Duration::from_secs(5);

const RESOURCE_COUNT_SCRIPT: &str = "performance.getEntriesByType('resource').length";

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PipelineError::Capture(format!("browser task panicked: {}", e)))?
        .map_err(|e| PipelineError::Capture(format!("{:#}", e)))
}

pub struct ChromeLauncher {
    chrome_path: Option<PathBuf>,
}

impl ChromeLauncher {
    pub fn new(chrome_path: Option<String>) -> Self {
        Self {
            chrome_path: chrome_path.map(PathBuf::from),
        }
    }
}

#[async_trait]
impl BrowserLauncherPort for ChromeLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserPort>> {
        let path = self.chrome_path.clone();
        if let Some(ref p) = path {
            info!(path = %p.display(), "Using configured Chrome");
        }

        let browser = blocking(move || {
            let mut builder = LaunchOptions::default_builder();
            builder
                .headless(true)
                .args(vec![
                    OsStr::new("--no-sandbox"),
                    OsStr::new("--disable-setuid-sandbox"),
                    OsStr::new("--disable-dev-shm-usage"),
                    OsStr::new("--disable-gpu"),
                ])
                .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
                .path(path);
            let options = builder
                .build()
                .map_err(|e| anyhow::anyhow!("invalid launch options: {}", e))?;
            Browser::new(options).context("Failed to launch browser")
        })
        .await?;

        debug!("Headless Chrome launched");
        Ok(Arc::new(ChromeBrowser {
            browser: Mutex::new(Some(browser)),
            closed: AtomicBool::new(false),
        }))
    }
}

pub struct ChromeBrowser {
    browser: Mutex<Option<Browser>>,
    closed: AtomicBool,
}

impl ChromeBrowser {
    fn handle(&self) -> Option<Browser> {
        self.browser.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl BrowserPort for ChromeBrowser {
    async fn is_connected(&self) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        let Some(browser) = self.handle() else {
            return false;
        };

        let probe = blocking(move || browser.get_version().map(|_| ()));
        let alive = matches!(tokio::time::timeout(LIVENESS_TIMEOUT, probe).await, Ok(Ok(())));
        if !alive {
            debug!("Browser failed its liveness check");
            self.closed.store(true, Ordering::SeqCst);
        }
        alive
    }

    async fn new_page(&self) -> Result<Box<dyn PagePort>> {
        let browser = self
            .handle()
            .ok_or_else(|| PipelineError::Capture("browser is closed".to_string()))?;
        let tab = blocking(move || browser.new_tab().context("Failed to create tab")).await?;
        Ok(Box::new(ChromePage { tab }))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        let browser = self.browser.lock().ok().and_then(|mut guard| guard.take());
        if let Some(browser) = browser {
            // Dropping the last handle shuts the Chrome process down.
            blocking(move || {
                drop(browser);
                Ok(())
            })
            .await?;
        }
        Ok(())
    }
}

/// Poll the count of finished resource loads until it stops growing for
/// `NETWORK_QUIET`. Late or long-polling requests only cost the budget.
fn wait_for_network_idle(tab: &Tab, budget: Duration) {
    let deadline = Instant::now() + budget;
    let resource_count = || {
        tab.evaluate(RESOURCE_COUNT_SCRIPT, false)
            .ok()
            .and_then(|r| r.value)
            .and_then(|v| v.as_u64())
    };

    let mut last = resource_count();
    let mut quiet_since = Instant::now();
    while Instant::now() < deadline {
        std::thread::sleep(NETWORK_POLL);
        let current = resource_count();
        if current != last {
            last = current;
            quiet_since = Instant::now();
        } else if quiet_since.elapsed() >= NETWORK_QUIET {
            return;
        }
    }
    debug!("Network still busy after the idle wait");
}

pub struct ChromePage {
    tab: Arc<Tab>,
}

#[async_trait]
impl PagePort for ChromePage {
    async fn set_viewport(&self, width: u32, height: u32) -> Result<()> {
        let tab = self.tab.clone();
        blocking(move || {
            tab.call_method(SetDeviceMetricsOverride {
                width,
                height,
                device_scale_factor: 1.0,
                mobile: false,
                scale: None,
                screen_width: None,
                screen_height: None,
                position_x: None,
                position_y: None,
                dont_set_visible_size: None,
                screen_orientation: None,
                viewport: None,
                display_feature: None,
                device_posture: None,
            })
            .context("Failed to set device metrics")?;
            Ok(())
        })
        .await
    }

    async fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        let tab = self.tab.clone();
        let user_agent = user_agent.to_string();
        blocking(move || {
            tab.set_user_agent(&user_agent, None, None)
                .context("Failed to set user agent")
        })
        .await
    }

    /// Waits for the load event, then for the network to go mostly quiet.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let tab = self.tab.clone();
        let url = url.to_string();
        blocking(move || {
            let started = Instant::now();
            tab.set_default_timeout(timeout);
            tab.navigate_to(&url)
                .with_context(|| format!("Failed to navigate to {}", url))?
                .wait_until_navigated()
                .with_context(|| format!("Timed out loading {}", url))?;

            let budget = timeout.saturating_sub(started.elapsed()).min(NETWORK_IDLE_MAX);
            wait_for_network_idle(&tab, budget);
            Ok(())
        })
        .await
    }

    async fn evaluate(&self, script: &str) -> Result<String> {
        let tab = self.tab.clone();
        let script = script.to_string();
        blocking(move || {
            let result = tab.evaluate(&script, false).context("Script evaluation failed")?;
            Ok(match result.value {
                Some(Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => String::new(),
            })
        })
        .await
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        let tab = self.tab.clone();
        blocking(move || {
            tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
                .context("Failed to capture screenshot")
        })
        .await
    }

    async fn content(&self) -> Result<String> {
        let tab = self.tab.clone();
        blocking(move || tab.get_content().context("Failed to read page content")).await
    }

    async fn close(&self) -> Result<()> {
        let tab = self.tab.clone();
        blocking(move || {
            tab.close(true).context("Failed to close tab")?;
            Ok(())
        })
        .await
    }
}
