//! Scrape runner: one page per category, results aggregated in request order.

use crate::config::ScrapeConfig;
use crate::pool::PagePool;
use crate::renderer::Renderer;
use crate::scrape::resolver::resolve_urls;
use anyhow::Result;
use faq_harvest::{extract_html, CategoryConfig, ExtractOptions, FaqRecord, ScrapeOutcome};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What happened to one category URL.
#[derive(Debug, Clone)]
pub struct CategoryReport {
    pub url: String,
    /// Display name, the key in the run's results.
    pub name: String,
    pub records: Vec<FaqRecord>,
    /// Set when the category could not be loaded or extracted.
    pub error: Option<String>,
}

/// One scrape run over a launched renderer.
///
/// The renderer is shut down by [`ScrapeRun::close`], which consumes the run,
/// so it happens at most once.
pub struct ScrapeRun {
    pool: PagePool,
    config: Arc<ScrapeConfig>,
    run_id: Uuid,
}

impl ScrapeRun {
    pub fn new(renderer: Arc<dyn Renderer>, config: ScrapeConfig) -> Self {
        let pool = PagePool::new(renderer, config.concurrency);
        Self {
            pool,
            config: Arc::new(config),
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Category URLs for this run (see [`resolve_urls`]).
    pub async fn resolve(&self, provided: Option<&[String]>) -> Vec<String> {
        resolve_urls(provided, &self.pool, &self.config).await
    }

    /// Scrape every URL and aggregate the results.
    ///
    /// Never fails: a category that cannot be loaded is recorded with an
    /// empty record list plus an entry in `errors`.
    pub async fn execute(&self, urls: &[String]) -> ScrapeOutcome {
        let start = Instant::now();
        info!(
            run_id = %self.run_id,
            categories = urls.len(),
            concurrency = self.pool.max_pages(),
            renderer = %self.pool.renderer().describe(),
            "starting scrape"
        );

        let reports: Vec<CategoryReport> = stream::iter(urls.iter().cloned())
            .map(|url| self.scrape_category(url))
            .buffered(self.pool.max_pages())
            .collect()
            .await;

        let mut outcome = ScrapeOutcome::default();
        for report in reports {
            if let Some(error) = report.error {
                outcome.push_error(error);
            }
            outcome.insert_category(report.name, report.records);
        }
        outcome.execution_time = start.elapsed();

        info!(
            run_id = %self.run_id,
            total = outcome.total_count,
            errors = outcome.errors.len(),
            seconds = outcome.execution_seconds(),
            "scrape finished"
        );
        outcome
    }

    /// Load and extract one category, retrying the page load with backoff.
    pub async fn scrape_category(&self, url: String) -> CategoryReport {
        let category = CategoryConfig::for_url(&url);
        info!(url = %url, category = %category.id, "processing category");

        let attempts = self.config.category_retries + 1;
        let mut attempt = 0;
        let loaded = loop {
            match self.load_page(&url, &category).await {
                Ok(html) => break Ok(html),
                Err(e) if attempt + 1 < attempts => {
                    let delay = ScrapeConfig::backoff(self.config.category_backoff_ms, attempt);
                    warn!(
                        url = %url,
                        "attempt {}/{attempts} failed, retrying in {:?}: {e:#}",
                        attempt + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => break Err(e),
            }
        };

        let options = ExtractOptions {
            ordinals: self.config.ordinals,
        };
        let result = loaded.and_then(|html| {
            extract_html(&html, &category, options).map_err(anyhow::Error::from)
        });

        match result {
            Ok(extraction) => CategoryReport {
                url,
                name: category.name,
                records: extraction.records,
                error: None,
            },
            Err(e) => {
                let error = format!("Failed to process {url}: {e}");
                warn!("{error}");
                CategoryReport {
                    url,
                    name: category.name,
                    records: Vec::new(),
                    error: Some(error),
                }
            }
        }
    }

    /// Render `url` on a fresh page and return its HTML. A ready selector
    /// that never appears only logs a warning.
    async fn load_page(&self, url: &str, category: &CategoryConfig) -> Result<String> {
        let url = url.to_string();
        let ready_selector = category.ready_selector.clone();
        let user_agent = self.config.user_agent.clone();
        let nav_timeout_ms = self.config.nav_timeout_ms;
        let ready_timeout_ms = self.config.ready_timeout_ms;
        let settle = self.config.settle_delay();

        self.pool
            .with_page(move |page| {
                Box::pin(async move {
                    page.set_user_agent(&user_agent).await?;
                    let nav = page.navigate(&url, nav_timeout_ms).await?;
                    debug!(
                        url = %url,
                        final_url = %nav.final_url,
                        status = nav.status,
                        load_ms = nav.load_time_ms,
                        "page loaded"
                    );
                    let ready = page.wait_for_selector(&ready_selector, ready_timeout_ms);
                    if let Err(e) = ready.await {
                        warn!(url = %url, "page content not ready, extracting anyway: {e:#}");
                    }
                    if settle > Duration::ZERO {
                        tokio::time::sleep(settle).await;
                    }
                    page.content().await
                })
            })
            .await
    }

    /// Shut the renderer down.
    pub async fn close(self) -> Result<()> {
        self.pool.renderer().shutdown().await
    }
}
