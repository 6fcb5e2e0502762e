//! Category URL resolution and the scrape run itself.

pub mod resolver;
pub mod runner;

pub use resolver::resolve_urls;
pub use runner::{CategoryReport, ScrapeRun};
