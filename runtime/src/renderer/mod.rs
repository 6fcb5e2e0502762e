//! Browser rendering abstraction.
//!
//! A [`Renderer`] is one launched browser; each [`RenderContext`] is one page
//! opened in it. The scrape runner only talks to these traits, so the
//! Chromium driver and the in-memory [`StaticRenderer`] are interchangeable.

pub mod chromium;
pub mod launch;
pub mod static_pages;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

pub use chromium::ChromiumRenderer;
pub use launch::{launch_with_retry, BrowserLauncher, ChromiumLauncher};
pub use static_pages::StaticRenderer;

/// Outcome of navigating a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationResult {
    /// URL after redirects.
    pub final_url: String,
    /// HTTP status of the main document (0 when the driver cannot tell).
    pub status: u16,
    /// URLs visited before `final_url`.
    pub redirect_chain: Vec<String>,
    /// Navigation wall time in milliseconds.
    pub load_time_ms: u64,
}

/// Failures the scrape runner classifies and reacts to.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to launch browser after {attempts} attempts: {source}")]
    Launch {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("selector `{selector}` did not appear within {timeout_ms}ms")]
    SelectorTimeout { selector: String, timeout_ms: u64 },
}

/// A launched browser that hands out pages.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a new page.
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;

    /// Close the browser. Called once, after every page is closed.
    async fn shutdown(&self) -> Result<()>;

    /// Short description for logs (`chromium 126.0…`, `static (6 pages)`).
    fn describe(&self) -> String;
}

/// One open page.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to `url`, failing with [`ScrapeError::Timeout`] after
    /// `timeout_ms`.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;

    /// Wait until `selector` matches an element, up to `timeout_ms`.
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// Serialized DOM of the current document.
    async fn content(&self) -> Result<String>;

    /// Set the user agent for subsequent navigations.
    async fn set_user_agent(&self, user_agent: &str) -> Result<()>;

    /// Close the page.
    async fn close(self: Box<Self>) -> Result<()>;
}
