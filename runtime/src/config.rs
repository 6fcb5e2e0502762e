//! Run configuration: defaults, then `FAQ_HARVEST_*` environment overrides.
//! Command-line flags are applied on top by the CLI.

use anyhow::{Context, Result};
use faq_harvest::navigation::{ENTRY_PATH, FAQ_PATH_PREFIX};
use faq_harvest::OrdinalMode;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://mycash.utah.gov";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Chromium flags for running inside containers and serverless sandboxes.
pub const CHROMIUM_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-dev-tools",
    "--disable-gpu",
    "--disable-extensions",
    "--no-zygote",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
];

/// Everything a scrape run needs to know.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Site origin, e.g. `https://mycash.utah.gov`.
    pub base_url: String,
    /// Page whose navigation tabs list the categories.
    pub entry_path: String,
    /// Only navigation links under this path are categories.
    pub faq_path_prefix: String,
    /// Hard limit for one category navigation.
    pub nav_timeout_ms: u64,
    /// Hard limit for the discovery navigation.
    pub discovery_timeout_ms: u64,
    /// Wait bound for a ready selector: the category content, or the
    /// navigation menu during discovery.
    pub ready_timeout_ms: u64,
    /// Pause after navigation for client-side rendering.
    pub settle_ms: u64,
    /// Browser launch attempts beyond the first.
    pub launch_retries: u32,
    /// First launch backoff; doubles per attempt.
    pub launch_backoff_ms: u64,
    /// Navigation attempts per category beyond the first.
    pub category_retries: u32,
    /// First category backoff; doubles per attempt.
    pub category_backoff_ms: u64,
    /// Pages open at the same time. 1 reproduces the sequential reference run.
    pub concurrency: usize,
    pub user_agent: String,
    pub chromium_path: Option<PathBuf>,
    pub chromium_args: Vec<String>,
    pub ordinals: OrdinalMode,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            entry_path: ENTRY_PATH.to_string(),
            faq_path_prefix: FAQ_PATH_PREFIX.to_string(),
            nav_timeout_ms: 60_000,
            discovery_timeout_ms: 15_000,
            ready_timeout_ms: 30_000,
            settle_ms: 3_000,
            launch_retries: 2,
            launch_backoff_ms: 1_000,
            category_retries: 2,
            category_backoff_ms: 1_000,
            concurrency: 1,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chromium_path: None,
            chromium_args: CHROMIUM_ARGS.iter().map(|s| s.to_string()).collect(),
            ordinals: OrdinalMode::Cumulative,
        }
    }
}

impl ScrapeConfig {
    /// Defaults with `FAQ_HARVEST_*` environment variables applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (an environment accessor).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("FAQ_HARVEST_BASE_URL") {
            self.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("FAQ_HARVEST_CHROMIUM_PATH") {
            self.chromium_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("FAQ_HARVEST_CONCURRENCY") {
            self.concurrency = v
                .parse()
                .with_context(|| format!("FAQ_HARVEST_CONCURRENCY is not a number: {v}"))?;
        }
        if let Some(v) = lookup("FAQ_HARVEST_NAV_TIMEOUT_MS") {
            self.nav_timeout_ms = v
                .parse()
                .with_context(|| format!("FAQ_HARVEST_NAV_TIMEOUT_MS is not a number: {v}"))?;
        }
        if let Some(v) = lookup("FAQ_HARVEST_SETTLE_MS") {
            self.settle_ms = v
                .parse()
                .with_context(|| format!("FAQ_HARVEST_SETTLE_MS is not a number: {v}"))?;
        }
        if let Some(v) = lookup("FAQ_HARVEST_ORDINALS") {
            self.ordinals = v.parse().map_err(anyhow::Error::msg)?;
        }
        self.concurrency = self.concurrency.max(1);
        Ok(())
    }

    /// A configuration with every delay and backoff set to zero, for replays.
    pub fn without_delays(mut self) -> Self {
        self.settle_ms = 0;
        self.launch_backoff_ms = 0;
        self.category_backoff_ms = 0;
        self
    }

    pub fn entry_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.entry_path)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Backoff before retry number `attempt` (0-based): `base * 2^attempt`.
    pub fn backoff(base_ms: u64, attempt: u32) -> Duration {
        Duration::from_millis(base_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

/// Directory for run artifacts when no explicit location is given
/// (`$FAQ_HARVEST_HOME`, else `~/.faq-harvest`).
pub fn harvest_home() -> PathBuf {
    if let Ok(p) = std::env::var("FAQ_HARVEST_HOME") {
        return PathBuf::from(p);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".faq-harvest")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ScrapeConfig::default();
        assert_eq!(config.entry_url(), "https://mycash.utah.gov/app/faq-general");
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.launch_retries, 2);
        assert!(config.chromium_args.iter().any(|a| a == "--no-sandbox"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ScrapeConfig::default();
        config
            .apply_env(env(&[
                ("FAQ_HARVEST_BASE_URL", "http://localhost:8080/"),
                ("FAQ_HARVEST_CONCURRENCY", "0"),
                ("FAQ_HARVEST_SETTLE_MS", "250"),
                ("FAQ_HARVEST_ORDINALS", "per-list"),
            ]))
            .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.settle_ms, 250);
        assert_eq!(config.ordinals, OrdinalMode::PerList);
    }

    #[test]
    fn test_bad_env_value_is_error() {
        let mut config = ScrapeConfig::default();
        let err = config
            .apply_env(env(&[("FAQ_HARVEST_NAV_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("FAQ_HARVEST_NAV_TIMEOUT_MS"));
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(ScrapeConfig::backoff(1_000, 0), Duration::from_secs(1));
        assert_eq!(ScrapeConfig::backoff(1_000, 1), Duration::from_secs(2));
        assert_eq!(ScrapeConfig::backoff(1_000, 2), Duration::from_secs(4));
        assert_eq!(ScrapeConfig::backoff(0, 5), Duration::ZERO);
    }
}
