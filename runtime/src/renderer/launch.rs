//! Browser launch with bounded retries.

use super::{ChromiumRenderer, Renderer, ScrapeError, StaticRenderer};
use crate::config::ScrapeConfig;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

/// Starts a renderer for one run.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, config: &ScrapeConfig) -> anyhow::Result<Arc<dyn Renderer>>;
}

/// Launches headless Chromium.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromiumLauncher;

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, config: &ScrapeConfig) -> anyhow::Result<Arc<dyn Renderer>> {
        Ok(Arc::new(ChromiumRenderer::launch(config).await?))
    }
}

/// Replays snapshots; every launch shares the same pages and counters.
#[async_trait]
impl BrowserLauncher for StaticRenderer {
    async fn launch(&self, _config: &ScrapeConfig) -> anyhow::Result<Arc<dyn Renderer>> {
        Ok(Arc::new(self.clone()))
    }
}

/// Run `launch` up to `retries + 1` times, sleeping `backoff_ms * 2^n`
/// between attempts. Exhausting the attempts yields [`ScrapeError::Launch`]
/// carrying the last failure.
pub async fn launch_with_retry<T, F, Fut>(
    retries: u32,
    backoff_ms: u64,
    mut launch: F,
) -> Result<T, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let attempts = retries + 1;
    let mut attempt = 0;
    loop {
        info!("launching headless browser (attempt {}/{attempts})", attempt + 1);
        match launch().await {
            Ok(renderer) => {
                info!("browser launched");
                return Ok(renderer);
            }
            Err(e) => {
                error!("failed to launch browser on attempt {}: {e:#}", attempt + 1);
                if attempt + 1 >= attempts {
                    return Err(ScrapeError::Launch {
                        attempts,
                        source: e,
                    });
                }
                tokio::time::sleep(ScrapeConfig::backoff(backoff_ms, attempt)).await;
                attempt += 1;
            }
        }
    }
}
