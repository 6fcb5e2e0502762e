//! Headless Chromium renderer built on chromiumoxide.

use super::{NavigationResult, RenderContext, Renderer, ScrapeError};
use crate::config::ScrapeConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Poll interval while waiting for a selector.
const SELECTOR_POLL: Duration = Duration::from_millis(250);

/// Find a Chromium binary: explicit path first, then well-known names on `PATH`.
pub fn find_chromium(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.clone());
        }
        warn!("configured chromium path {} does not exist", path.display());
    }

    ["google-chrome", "chromium", "chromium-browser", "google-chrome-stable"]
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// One launched Chromium process.
pub struct ChromiumRenderer {
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    executable: String,
}

impl ChromiumRenderer {
    /// Launch headless Chromium with the configured flags.
    pub async fn launch(config: &ScrapeConfig) -> Result<Self> {
        let executable = find_chromium(config.chromium_path.as_ref());

        let mut builder = BrowserConfig::builder()
            .args(config.chromium_args.clone())
            .request_timeout(Duration::from_millis(config.nav_timeout_ms));
        if let Some(path) = &executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(anyhow::Error::msg)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("launching chromium")?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler event error: {e}");
                }
            }
        });

        let executable = executable
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "auto-detected".to_string());
        info!("chromium launched ({executable})");

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler: Mutex::new(Some(handle)),
            executable,
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let guard = self.browser.lock().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("browser already shut down"))?;
        let page = browser
            .new_page("about:blank")
            .await
            .context("opening page")?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn shutdown(&self) -> Result<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };
        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            debug!("waiting for chromium exit: {e}");
        }
        if let Some(handle) = self.handler.lock().await.take() {
            handle.abort();
        }
        closed.context("closing chromium")?;
        info!("chromium closed");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("chromium ({})", self.executable)
    }
}

struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self.page.evaluate(script).await.context("evaluating script")?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl RenderContext for ChromiumPage {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();
        match tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await {
            Err(_) => {
                return Err(ScrapeError::Timeout {
                    url: url.to_string(),
                    timeout_ms,
                }
                .into())
            }
            Ok(Err(e)) => {
                return Err(ScrapeError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
                .into())
            }
            Ok(Ok(_)) => {}
        }

        let final_url = self
            .page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());
        let status = self
            .evaluate(
                "(() => { const e = performance.getEntriesByType('navigation')[0]; \
                 return e && e.responseStatus ? e.responseStatus : 0; })()",
            )
            .await
            .ok()
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u16;

        let redirect_chain = if final_url != url {
            vec![url.to_string()]
        } else {
            Vec::new()
        };

        Ok(NavigationResult {
            final_url,
            status,
            redirect_chain,
            load_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let script = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        let poll = async {
            loop {
                if let Ok(serde_json::Value::Bool(true)) = self.evaluate(&script).await {
                    return;
                }
                tokio::time::sleep(SELECTOR_POLL).await;
            }
        };
        tokio::time::timeout(Duration::from_millis(timeout_ms), poll)
            .await
            .map_err(|_| ScrapeError::SelectorTimeout {
                selector: selector.to_string(),
                timeout_ms,
            })?;
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        self.page.content().await.context("reading page content")
    }

    async fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        self.page
            .set_user_agent(SetUserAgentOverrideParams::new(user_agent))
            .await
            .context("setting user agent")?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.page.close().await.context("closing page")
    }
}
