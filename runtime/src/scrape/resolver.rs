//! Category URL resolution: caller-supplied URLs, else the live navigation
//! menu, else the fixed list of known categories.

use crate::config::ScrapeConfig;
use crate::pool::PagePool;
use anyhow::Result;
use faq_harvest::navigation::NAV_READY_SELECTOR;
use faq_harvest::{discover_category_urls, fallback_category_urls};
use tracing::{info, warn};

/// Resolve the category URLs to scrape.
///
/// Non-empty `provided` URLs are used verbatim. Discovery is best-effort:
/// any navigation failure or an empty menu falls back to the known URLs, so
/// this never fails.
pub async fn resolve_urls(
    provided: Option<&[String]>,
    pool: &PagePool,
    config: &ScrapeConfig,
) -> Vec<String> {
    if let Some(urls) = provided.filter(|urls| !urls.is_empty()) {
        info!("using {} provided urls", urls.len());
        return urls.to_vec();
    }

    match discover(pool, config).await {
        Ok(urls) if !urls.is_empty() => {
            info!("discovered {} category urls", urls.len());
            urls
        }
        Ok(_) => {
            warn!("navigation menu had no category links, using fallback urls");
            fallback_category_urls(&config.base_url)
        }
        Err(e) => {
            warn!("category discovery failed, using fallback urls: {e:#}");
            fallback_category_urls(&config.base_url)
        }
    }
}

async fn discover(pool: &PagePool, config: &ScrapeConfig) -> Result<Vec<String>> {
    let entry = config.entry_url();
    let user_agent = config.user_agent.clone();
    let nav_timeout_ms = config.discovery_timeout_ms;
    let menu_timeout_ms = config.ready_timeout_ms;
    let html = pool
        .with_page(move |page| {
            Box::pin(async move {
                page.set_user_agent(&user_agent).await?;
                page.navigate(&entry, nav_timeout_ms).await?;
                page.wait_for_selector(NAV_READY_SELECTOR, menu_timeout_ms).await?;
                page.content().await
            })
        })
        .await?;
    Ok(discover_category_urls(
        &html,
        &config.base_url,
        &config.faq_path_prefix,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{ScrapeError, StaticRenderer};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    const ENTRY: &str = "https://mycash.utah.gov/app/faq-general";

    const MENU: &str = r#"
        <ul class="nav nav-tabs">
          <li class="nav-item"><a class="nav-link" href="/app/faq-general">General</a></li>
          <li class="nav-item"><a class="nav-link" href="/app/faq-claim#top">Claims</a></li>
          <li class="nav-item"><a class="nav-link" href="/login">Login</a></li>
        </ul>
    "#;

    fn pool(renderer: &StaticRenderer) -> PagePool {
        PagePool::new(Arc::new(renderer.clone()), 1)
    }

    #[tokio::test]
    async fn test_provided_urls_skip_discovery() {
        let renderer = StaticRenderer::default();
        let urls = vec!["https://example.test/app/faq-x".to_string()];
        let resolved = resolve_urls(Some(&urls), &pool(&renderer), &ScrapeConfig::default()).await;
        assert_eq!(resolved, urls);
        assert_eq!(renderer.counters().opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_discovers_menu_links() {
        let renderer = StaticRenderer::new([(ENTRY, MENU)]);
        let resolved = resolve_urls(None, &pool(&renderer), &ScrapeConfig::default()).await;
        assert_eq!(
            resolved,
            [
                "https://mycash.utah.gov/app/faq-general",
                "https://mycash.utah.gov/app/faq-claim"
            ]
        );
        let counters = renderer.counters();
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_list_and_failed_discovery_fall_back() {
        let renderer = StaticRenderer::default();
        let resolved =
            resolve_urls(Some(&[]), &pool(&renderer), &ScrapeConfig::default()).await;
        assert_eq!(resolved.len(), 6);
        assert_eq!(resolved, fallback_category_urls("https://mycash.utah.gov"));
        assert_eq!(renderer.counters().closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_page_without_menu_falls_back() {
        let renderer = StaticRenderer::new([(ENTRY, "<p>no menu here</p>")]);
        let resolved = resolve_urls(None, &pool(&renderer), &ScrapeConfig::default()).await;
        assert_eq!(resolved.len(), 6);
    }

    #[tokio::test]
    async fn test_menu_wait_uses_ready_timeout() {
        let renderer = StaticRenderer::new([(ENTRY, "<p>no menu here</p>")]);
        let config = ScrapeConfig {
            discovery_timeout_ms: 15_000,
            ready_timeout_ms: 30_000,
            ..ScrapeConfig::default()
        };
        let err = discover(&pool(&renderer), &config).await.unwrap_err();
        match err.downcast_ref::<ScrapeError>() {
            Some(ScrapeError::SelectorTimeout { selector, timeout_ms }) => {
                assert_eq!(selector, NAV_READY_SELECTOR);
                assert_eq!(*timeout_ms, 30_000);
            }
            other => panic!("expected selector timeout, got {other:?}"),
        }
    }
}
