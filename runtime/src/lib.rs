//! FaqHarvest runtime: drives a headless browser over the FAQ category
//! pages, extracts records with `faq-harvest`, and reports each run.

pub mod cli;
pub mod config;
pub mod handler;
pub mod logging;
pub mod pool;
pub mod renderer;
pub mod scrape;
pub mod sinks;

pub use config::ScrapeConfig;
pub use handler::{handle_invocation, Dependencies, InvocationEvent, InvocationResponse};
pub use scrape::ScrapeRun;
