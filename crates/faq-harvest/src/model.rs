//! Records produced by extraction and the per-run aggregate.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One question with its assembled answer.
///
/// `question` is never empty after trimming. `answer` may be empty when the
/// page carried a question without any recognisable answer content; such
/// records are kept so question counts stay faithful to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqRecord {
    pub question: String,
    pub answer: String,
}

impl FaqRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Whether the answer came out empty (an extraction gap, not an error).
    pub fn has_answer(&self) -> bool {
        !self.answer.is_empty()
    }
}

/// Category display name to records, in the order categories were requested.
pub type CategoryResult = IndexMap<String, Vec<FaqRecord>>;

/// Aggregate of a whole scrape run.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOutcome {
    pub results: CategoryResult,
    pub total_count: usize,
    pub errors: Vec<String>,
    pub execution_time: Duration,
}

impl ScrapeOutcome {
    /// Record the result of one category. A repeated category name replaces
    /// the earlier entry and the total is recomputed.
    pub fn insert_category(&mut self, name: String, records: Vec<FaqRecord>) {
        self.results.insert(name, records);
        self.total_count = self.results.values().map(Vec::len).sum();
    }

    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Number of categories with an entry (empty ones included).
    pub fn categories_processed(&self) -> usize {
        self.results.len()
    }

    /// Execution time in seconds rounded to two decimals.
    pub fn execution_seconds(&self) -> f64 {
        round_secs(self.execution_time)
    }
}

/// Seconds rounded to two decimals, the precision used in every report.
pub fn round_secs(d: Duration) -> f64 {
    (d.as_secs_f64() * 100.0).round() / 100.0
}
