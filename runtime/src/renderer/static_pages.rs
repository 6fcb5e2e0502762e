//! In-memory renderer serving pre-rendered HTML.
//!
//! Used to replay saved page snapshots without a browser and as the test
//! double for the scrape runner. Failures can be scripted per URL.

use super::{NavigationResult, RenderContext, Renderer, ScrapeError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use faq_harvest::category::CategoryId;
use faq_harvest::extractor::selector_present;
use faq_harvest::navigation::FAQ_PATH_PREFIX;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Scripted behaviour for one URL.
#[derive(Debug, Clone)]
enum Failure {
    /// Fail the next `n` navigations with a network error.
    Transient(usize),
    /// Always time out.
    Timeout,
}

/// Open/close bookkeeping shared with every page.
#[derive(Debug, Default)]
pub struct PageCounters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub navigations: AtomicUsize,
    pub shutdowns: AtomicUsize,
}

/// Serves HTML documents keyed by URL (fragments ignored).
#[derive(Clone, Default)]
pub struct StaticRenderer {
    pages: Arc<HashMap<String, String>>,
    failures: Arc<Mutex<HashMap<String, Failure>>>,
    counters: Arc<PageCounters>,
    user_agent: Arc<Mutex<Option<String>>>,
}

fn page_key(url: &str) -> String {
    url.split('#').next().unwrap_or(url).trim_end_matches('/').to_string()
}

impl StaticRenderer {
    pub fn new<I, K, V>(pages: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(k, v)| (page_key(k.as_ref()), v.into()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// Load `{category-id}.html` snapshots from `dir`, served under
    /// `{base}/app/{category-id}`. Any other `*.html` file is served under
    /// its file stem as well.
    pub fn from_dir(dir: &Path, base: &str) -> Result<Self> {
        let base = base.trim_end_matches('/');
        let mut pages = Vec::new();

        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("reading snapshot directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let html = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            pages.push((format!("{base}{FAQ_PATH_PREFIX}{stem}"), html));
        }

        let known = pages
            .iter()
            .filter(|(url, _)| CategoryId::from_url(url).is_known())
            .count();
        info!(
            "loaded {} snapshots from {} ({known} known categories)",
            pages.len(),
            dir.display()
        );
        Ok(Self::new(pages))
    }

    /// Fail the next `times` navigations to `url` with a network error.
    pub fn fail_transiently(self, url: &str, times: usize) -> Self {
        self.script(url, Failure::Transient(times))
    }

    /// Make every navigation to `url` time out.
    pub fn always_timeout(self, url: &str) -> Self {
        self.script(url, Failure::Timeout)
    }

    fn script(self, url: &str, failure: Failure) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(page_key(url), failure);
        }
        self
    }

    pub fn counters(&self) -> Arc<PageCounters> {
        Arc::clone(&self.counters)
    }

    /// User agent most recently set on any page.
    pub fn last_user_agent(&self) -> Option<String> {
        self.user_agent.lock().ok().and_then(|ua| ua.clone())
    }

    fn take_failure(&self, key: &str) -> Option<Failure> {
        let mut failures = self.failures.lock().ok()?;
        match failures.get_mut(key)? {
            Failure::Timeout => Some(Failure::Timeout),
            Failure::Transient(0) => None,
            Failure::Transient(n) => {
                *n -= 1;
                Some(Failure::Transient(*n + 1))
            }
        }
    }
}

#[async_trait]
impl Renderer for StaticRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticPage {
            renderer: self.clone(),
            current: None,
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        self.counters.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("static ({} pages)", self.pages.len())
    }
}

struct StaticPage {
    renderer: StaticRenderer,
    current: Option<String>,
}

#[async_trait]
impl RenderContext for StaticPage {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        self.renderer
            .counters
            .navigations
            .fetch_add(1, Ordering::SeqCst);
        let key = page_key(url);

        match self.renderer.take_failure(&key) {
            Some(Failure::Timeout) => {
                return Err(ScrapeError::Timeout {
                    url: url.to_string(),
                    timeout_ms,
                }
                .into())
            }
            Some(Failure::Transient(_)) => {
                return Err(ScrapeError::Navigation {
                    url: url.to_string(),
                    reason: "net::ERR_CONNECTION_RESET".to_string(),
                }
                .into())
            }
            None => {}
        }

        let Some(html) = self.renderer.pages.get(&key) else {
            return Err(ScrapeError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }
            .into());
        };
        debug!(url, bytes = html.len(), "serving static page");
        self.current = Some(html.clone());

        Ok(NavigationResult {
            final_url: key,
            status: 200,
            redirect_chain: Vec::new(),
            load_time_ms: 0,
        })
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let html = self.current.as_deref().unwrap_or("");
        if selector_present(html, selector)? {
            Ok(())
        } else {
            Err(ScrapeError::SelectorTimeout {
                selector: selector.to_string(),
                timeout_ms,
            }
            .into())
        }
    }

    async fn content(&self) -> Result<String> {
        Ok(self.current.clone().unwrap_or_default())
    }

    async fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        if let Ok(mut ua) = self.renderer.user_agent.lock() {
            *ua = Some(user_agent.to_string());
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.renderer.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://mycash.utah.gov/app/faq-general";

    fn renderer() -> StaticRenderer {
        StaticRenderer::new([(
            URL,
            "<section id='page-content'><div class='card-body'></div></section>",
        )])
    }

    #[tokio::test]
    async fn test_serves_page_ignoring_fragment() {
        let renderer = renderer();
        let mut page = renderer.new_context().await.unwrap();
        let nav = page.navigate(&format!("{URL}#top"), 1_000).await.unwrap();
        assert_eq!(nav.final_url, URL);
        assert_eq!(nav.status, 200);
        page.wait_for_selector("section#page-content", 10).await.unwrap();
        assert!(page.content().await.unwrap().contains("card-body"));
        page.close().await.unwrap();

        let counters = renderer.counters();
        assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_selector_times_out() {
        let renderer = renderer();
        let mut page = renderer.new_context().await.unwrap();
        page.navigate(URL, 1_000).await.unwrap();
        let err = page.wait_for_selector("ul.nav-tabs", 10).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScrapeError>(),
            Some(ScrapeError::SelectorTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let renderer = renderer().fail_transiently(URL, 2);
        let mut page = renderer.new_context().await.unwrap();
        assert!(page.navigate(URL, 1_000).await.is_err());
        assert!(page.navigate(URL, 1_000).await.is_err());
        assert!(page.navigate(URL, 1_000).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_url_is_navigation_error() {
        let renderer = renderer();
        let mut page = renderer.new_context().await.unwrap();
        let err = page
            .navigate("https://mycash.utah.gov/app/nowhere", 1_000)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ERR_NAME_NOT_RESOLVED"));
    }

    #[test]
    fn test_from_dir_maps_file_stems() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("faq-claim.html"), "<p>claim</p>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let renderer = StaticRenderer::from_dir(dir.path(), "https://mycash.utah.gov/").unwrap();
        assert_eq!(renderer.describe(), "static (1 pages)");
        assert!(renderer
            .pages
            .contains_key("https://mycash.utah.gov/app/faq-claim"));
    }
}
