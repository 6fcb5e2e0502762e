//! `faq-harvest extract`: run the extractor on a saved page.

use crate::cli::output;
use anyhow::{Context, Result};
use clap::Args;
use faq_harvest::{extract_html, CategoryConfig, CategoryId, ExtractOptions, OrdinalMode};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct ExtractArgs {
    /// Category identifier deciding the extraction strategy, e.g. `faq-claim`.
    #[arg(long)]
    pub category: String,

    /// Saved HTML page.
    pub file: PathBuf,

    /// Ordered-list numbering: `cumulative` or `per-list`.
    #[arg(long, default_value_t = OrdinalMode::Cumulative)]
    pub ordinals: OrdinalMode,
}

/// Extract records from `args.file` as a JSON report.
pub fn extract_file(args: &ExtractArgs) -> Result<Value> {
    let html = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let config = CategoryConfig::for_category(CategoryId::new(args.category.as_str()));
    let extraction = extract_html(
        &html,
        &config,
        ExtractOptions {
            ordinals: args.ordinals,
        },
    )?;

    Ok(json!({
        "category": config.id,
        "name": config.name,
        "strategy": config.strategy.to_string(),
        "container_found": extraction.container_found,
        "count": extraction.records.len(),
        "records": extraction.records,
        "skipped": extraction.skipped.iter().map(ToString::to_string).collect::<Vec<_>>(),
    }))
}

pub fn run(args: ExtractArgs) -> Result<()> {
    output::print_json(&extract_file(&args)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_saved_page() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("useful-link.html");
        std::fs::write(
            &file,
            "<div class='card-body'><a href='https://www.irs.gov'>IRS</a></div>",
        )
        .unwrap();

        let report = extract_file(&ExtractArgs {
            category: "useful-link".into(),
            file,
            ordinals: OrdinalMode::Cumulative,
        })
        .unwrap();
        assert_eq!(report["name"], "Useful Links");
        assert_eq!(report["strategy"], "link-list");
        assert_eq!(report["records"][0]["answer"], "[IRS](https://www.irs.gov)");
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = extract_file(&ExtractArgs {
            category: "faq-general".into(),
            file: PathBuf::from("/nonexistent/page.html"),
            ordinals: OrdinalMode::Cumulative,
        })
        .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/page.html"));
    }
}
