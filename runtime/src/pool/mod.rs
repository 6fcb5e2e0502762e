//! Page pooling for the scrape runner.

pub mod manager;

pub use manager::{PageHandle, PageJob, PagePool};
