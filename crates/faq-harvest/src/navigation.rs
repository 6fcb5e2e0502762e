//! Category URL discovery from the site's navigation tabs.

use crate::category::CATEGORY_TABLE;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Navigation tab links on FAQ pages.
pub const NAV_LINK_SELECTOR: &str = "ul.nav-tabs li.nav-item a.nav-link";
/// Marker that the navigation menu has rendered.
pub const NAV_READY_SELECTOR: &str = "ul.nav-tabs";
/// Path prefix shared by every category page.
pub const FAQ_PATH_PREFIX: &str = "/app/";
/// Page the navigation menu is read from.
pub const ENTRY_PATH: &str = "/app/faq-general";

/// The six known category URLs under `base`.
pub fn fallback_category_urls(base: &str) -> Vec<String> {
    let base = base.trim_end_matches('/');
    CATEGORY_TABLE
        .iter()
        .map(|(id, _, _)| format!("{base}{FAQ_PATH_PREFIX}{id}"))
        .collect()
}

/// Entry page URL under `base`.
pub fn entry_url(base: &str) -> String {
    format!("{}{ENTRY_PATH}", base.trim_end_matches('/'))
}

/// Category URLs linked from the navigation tabs of `html`.
///
/// Keeps links whose path starts with `path_prefix`, resolves them against
/// `base` and drops fragments and duplicates while keeping menu order.
/// Links pointing to another host are ignored.
pub fn discover_category_urls(html: &str, base: &str, path_prefix: &str) -> Vec<String> {
    let Ok(base_url) = Url::parse(base) else {
        debug!(base, "base url does not parse, skipping discovery");
        return Vec::new();
    };
    let Ok(selector) = Selector::parse(NAV_LINK_SELECTOR) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for link in document.select(&selector) {
        let Some(href) = link.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() {
            continue;
        }
        let Ok(mut resolved) = base_url.join(href) else {
            debug!(href, "unresolvable navigation link");
            continue;
        };
        if resolved.host_str() != base_url.host_str() {
            continue;
        }
        if !resolved.path().starts_with(path_prefix) {
            continue;
        }
        resolved.set_fragment(None);
        let absolute = resolved.to_string();
        if seen.insert(absolute.clone()) {
            urls.push(absolute);
        }
    }

    urls
}
