//! `faq-harvest categories`: the known category table.

use crate::cli::output::{self, Styled};
use crate::config::ScrapeConfig;
use faq_harvest::category::CATEGORY_TABLE;
use faq_harvest::fallback_category_urls;
use serde_json::{json, Value};

/// Known categories with the URL each resolves to under the configured site.
pub fn category_rows(config: &ScrapeConfig) -> Value {
    let urls = fallback_category_urls(&config.base_url);
    let rows: Vec<Value> = CATEGORY_TABLE
        .iter()
        .zip(urls)
        .map(|((id, name, strategy), url)| {
            json!({
                "id": id,
                "name": name,
                "strategy": strategy.to_string(),
                "url": url,
            })
        })
        .collect();
    Value::Array(rows)
}

pub fn run(config: &ScrapeConfig, json: bool) {
    let rows = category_rows(config);
    if json {
        output::print_json(&rows);
        return;
    }

    let s = Styled::new();
    output::print_header(&s);
    output::print_section(&s, "Categories");
    for row in rows.as_array().into_iter().flatten() {
        let field = |key: &str| row[key].as_str().unwrap_or_default().to_string();
        output::print_check(
            s.ok_sym(),
            &field("id"),
            &format!("{} ({})", field("name"), field("strategy")),
        );
        output::print_detail(&s.dim(&field("url")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_cover_table() {
        let rows = category_rows(&ScrapeConfig::default());
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[5]["id"], "useful-link");
        assert_eq!(rows[5]["strategy"], "link-list");
        assert_eq!(rows[0]["url"], "https://mycash.utah.gov/app/faq-general");
    }
}
