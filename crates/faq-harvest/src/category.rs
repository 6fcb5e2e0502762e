//! Category table and extraction strategy dispatch.
//!
//! Every category page on the site shares one card layout; the pages differ
//! only in whether they list questions or links. One [`CategoryConfig`]
//! per category carries the selectors and the strategy tag, and unknown
//! categories fall back to the question/answer card strategy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content container holding one category's cards.
pub const CONTENT_CONTAINER: &str = "div.card-body";
/// Question heading inside the container.
pub const QUESTION_MARKER: &str = "h6.card-title";
/// Used when a page carries no `QUESTION_MARKER` headings at all.
pub const QUESTION_MARKER_FALLBACK: &str = "h6";
/// Paragraph carrying answer text.
pub const ANSWER_MARKER: &str = "p.card-text";
/// Element whose presence signals the page body has rendered.
pub const READY_MARKER: &str = "section#page-content";
/// Link element for the link-list strategy.
pub const LINK_MARKER: &str = "a";

/// How records are pulled out of a category page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Question headings followed by paragraphs and lists.
    QaCards,
    /// Every link in the container becomes a record.
    LinkList,
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QaCards => f.write_str("qa-cards"),
            Self::LinkList => f.write_str("link-list"),
        }
    }
}

/// The fixed category table: identifier, display name, strategy.
pub const CATEGORY_TABLE: &[(&str, &str, ExtractionStrategy)] = &[
    ("faq-general", "General", ExtractionStrategy::QaCards),
    ("faq-claim", "Claiming Property", ExtractionStrategy::QaCards),
    ("faq-evidence", "Evidence", ExtractionStrategy::QaCards),
    ("faq-report", "Reporting Property", ExtractionStrategy::QaCards),
    ("finder-info", "Fee Finder", ExtractionStrategy::QaCards),
    ("useful-link", "Useful Links", ExtractionStrategy::LinkList),
];

/// A category identifier, the URL slug of its page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Last path segment of `url` with any `#fragment` or `?query` removed.
    pub fn from_url(url: &str) -> Self {
        let without_fragment = url.split('#').next().unwrap_or(url);
        let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
        let slug = without_query
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("");
        Self(slug.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier appears in [`CATEGORY_TABLE`].
    pub fn is_known(&self) -> bool {
        CATEGORY_TABLE.iter().any(|(id, _, _)| *id == self.0)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display name for a category: the table entry, or the slug title-cased.
pub fn category_display_name(id: &CategoryId) -> String {
    CATEGORY_TABLE
        .iter()
        .find(|(known, _, _)| *known == id.as_str())
        .map(|(_, name, _)| name.to_string())
        .unwrap_or_else(|| slug_to_title(id.as_str()))
}

/// `"some-id"` → `"Some Id"`.
pub fn slug_to_title(slug: &str) -> String {
    slug.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extraction strategy for a category; unknown identifiers get `QaCards`.
pub fn select_strategy(id: &CategoryId) -> ExtractionStrategy {
    CATEGORY_TABLE
        .iter()
        .find(|(known, _, _)| *known == id.as_str())
        .map(|(_, _, strategy)| *strategy)
        .unwrap_or(ExtractionStrategy::QaCards)
}

/// Everything the Question Extractor needs to know about one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub id: CategoryId,
    pub name: String,
    pub strategy: ExtractionStrategy,
    pub container_selector: String,
    pub question_selector: String,
    pub question_fallback_selector: Option<String>,
    pub answer_selector: String,
    pub link_selector: String,
    pub ready_selector: String,
}

impl CategoryConfig {
    /// Configuration for `id` using the site's card layout selectors.
    pub fn for_category(id: CategoryId) -> Self {
        let name = category_display_name(&id);
        let strategy = select_strategy(&id);
        Self {
            id,
            name,
            strategy,
            container_selector: CONTENT_CONTAINER.to_string(),
            question_selector: QUESTION_MARKER.to_string(),
            question_fallback_selector: Some(QUESTION_MARKER_FALLBACK.to_string()),
            answer_selector: ANSWER_MARKER.to_string(),
            link_selector: LINK_MARKER.to_string(),
            ready_selector: READY_MARKER.to_string(),
        }
    }

    /// Configuration for the category a page URL points at.
    pub fn for_url(url: &str) -> Self {
        Self::for_category(CategoryId::from_url(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_id_from_url() {
        assert_eq!(
            CategoryId::from_url("https://mycash.utah.gov/app/faq-claim").as_str(),
            "faq-claim"
        );
        assert_eq!(
            CategoryId::from_url("https://mycash.utah.gov/app/faq-claim#top").as_str(),
            "faq-claim"
        );
        assert_eq!(
            CategoryId::from_url("https://mycash.utah.gov/app/useful-link/?x=1").as_str(),
            "useful-link"
        );
    }

    #[test]
    fn test_known_names() {
        let names: Vec<String> = CATEGORY_TABLE
            .iter()
            .map(|(id, _, _)| category_display_name(&CategoryId::new(*id)))
            .collect();
        assert_eq!(
            names,
            [
                "General",
                "Claiming Property",
                "Evidence",
                "Reporting Property",
                "Fee Finder",
                "Useful Links"
            ]
        );
    }

    #[test]
    fn test_unknown_name_is_title_cased_slug() {
        assert_eq!(category_display_name(&CategoryId::new("some-id")), "Some Id");
        assert_eq!(
            category_display_name(&CategoryId::new("holder-REPORTING")),
            "Holder Reporting"
        );
        assert_eq!(slug_to_title(""), "");
    }

    #[test]
    fn test_strategy_dispatch() {
        assert_eq!(
            select_strategy(&CategoryId::new("useful-link")),
            ExtractionStrategy::LinkList
        );
        assert_eq!(
            select_strategy(&CategoryId::new("finder-info")),
            ExtractionStrategy::QaCards
        );
        assert_eq!(
            select_strategy(&CategoryId::new("brand-new-page")),
            ExtractionStrategy::QaCards
        );
    }

    #[test]
    fn test_config_for_url() {
        let config = CategoryConfig::for_url("https://mycash.utah.gov/app/finder-info");
        assert_eq!(config.name, "Fee Finder");
        assert_eq!(config.strategy, ExtractionStrategy::QaCards);
        assert_eq!(config.container_selector, "div.card-body");
        assert!(config.id.is_known());
        assert!(!CategoryId::new("nope").is_known());
    }
}
