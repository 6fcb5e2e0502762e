//! CLI subcommand implementations for the `faq-harvest` binary.

pub mod categories_cmd;
pub mod doctor;
pub mod extract_cmd;
pub mod output;
pub mod scrape_cmd;
