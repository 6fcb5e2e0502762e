//! Result archival: the persisted document, its key, and a file-system sink.

use super::PersistenceSink;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use faq_harvest::model::round_secs;
use faq_harvest::ScrapeOutcome;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Key prefix every archived run lives under.
pub const ARCHIVE_PREFIX: &str = "faq-output";

/// Storage key for a run finished at `timestamp`:
/// `faq-output/faq_data_YYYYMMDD_HHMMSS.json`.
pub fn archive_key(timestamp: DateTime<Utc>) -> String {
    format!(
        "{ARCHIVE_PREFIX}/faq_data_{}.json",
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// Run metadata stored alongside the records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveMetadata {
    pub timestamp: String,
    pub total_count: usize,
    pub execution_time_seconds: f64,
    pub source_url: String,
    pub run_id: String,
    pub errors: Vec<String>,
    pub categories_processed: usize,
}

impl ArchiveMetadata {
    /// `elapsed` is the whole invocation's wall time, the same figure the
    /// response and the `ExecutionTime` metric report.
    pub fn new(
        outcome: &ScrapeOutcome,
        elapsed: Duration,
        source_url: &str,
        run_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp: timestamp.to_rfc3339(),
            total_count: outcome.total_count,
            execution_time_seconds: round_secs(elapsed),
            source_url: source_url.to_string(),
            run_id: run_id.to_string(),
            errors: outcome.errors.clone(),
            categories_processed: outcome.categories_processed(),
        }
    }

    /// Short string tags for object stores that support them.
    pub fn tags(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("total-faqs".to_string(), self.total_count.to_string()),
            (
                "execution-time".to_string(),
                self.execution_time_seconds.to_string(),
            ),
            ("run-id".to_string(), self.run_id.clone()),
        ])
    }
}

/// `{metadata, data: {faqs}}` document for one run.
pub fn build_archive_document(outcome: &ScrapeOutcome, meta: &ArchiveMetadata) -> Value {
    json!({
        "metadata": meta,
        "data": {
            "faqs": outcome.results,
        },
    })
}

/// Writes documents as pretty-printed JSON files under a root directory,
/// with the tags in a `.meta.json` sidecar.
pub struct FileArchive {
    root: PathBuf,
}

impl FileArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path a key is written to.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(".meta.json");
    path.with_file_name(name)
}

#[async_trait]
impl PersistenceSink for FileArchive {
    async fn store(&self, key: &str, document: &Value, tags: &BTreeMap<String, String>) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let body = serde_json::to_string_pretty(document)?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        let sidecar = sidecar_path(&path);
        tokio::fs::write(&sidecar, serde_json::to_string_pretty(tags)?)
            .await
            .with_context(|| format!("writing {}", sidecar.display()))?;

        info!("archived run to {}", path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file archive at {}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use chrono::TimeZone;
    use faq_harvest::FaqRecord;

    fn outcome() -> ScrapeOutcome {
        let mut outcome = ScrapeOutcome::default();
        outcome.insert_category("General".into(), vec![FaqRecord::new("Q", "A")]);
        outcome.insert_category("Evidence".into(), vec![]);
        outcome.push_error("Failed to process https://x/app/faq-evidence: boom");
        outcome.execution_time = Duration::from_millis(4_321);
        outcome
    }

    fn metadata(outcome: &ScrapeOutcome) -> ArchiveMetadata {
        ArchiveMetadata::new(
            outcome,
            Duration::from_millis(4_321),
            "https://mycash.utah.gov",
            "run-1",
            timestamp(),
        )
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    #[test]
    fn test_archive_key_format() {
        assert_eq!(archive_key(timestamp()), "faq-output/faq_data_20240309_070501.json");
    }

    #[test]
    fn test_document_shape() {
        let outcome = outcome();
        let meta = metadata(&outcome);
        let doc = build_archive_document(&outcome, &meta);

        assert_json_eq!(
            doc,
            json!({
                "metadata": {
                    "timestamp": "2024-03-09T07:05:01+00:00",
                    "total_count": 1,
                    "execution_time_seconds": 4.32,
                    "source_url": "https://mycash.utah.gov",
                    "run_id": "run-1",
                    "errors": ["Failed to process https://x/app/faq-evidence: boom"],
                    "categories_processed": 2
                },
                "data": {
                    "faqs": {
                        "General": [{"question": "Q", "answer": "A"}],
                        "Evidence": []
                    }
                }
            })
        );
    }

    #[test]
    fn test_execution_time_is_the_invocation_elapsed() {
        let mut outcome = outcome();
        outcome.execution_time = Duration::from_millis(900);
        let meta = ArchiveMetadata::new(
            &outcome,
            Duration::from_millis(7_456),
            "https://mycash.utah.gov",
            "run-1",
            timestamp(),
        );
        assert_eq!(meta.execution_time_seconds, 7.46);
        assert_eq!(meta.tags()["execution-time"], "7.46");
    }

    #[tokio::test]
    async fn test_file_archive_writes_document_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FileArchive::new(dir.path());
        let outcome = outcome();
        let meta = metadata(&outcome);
        let key = archive_key(timestamp());

        archive
            .store(&key, &build_archive_document(&outcome, &meta), &meta.tags())
            .await
            .unwrap();

        let written = std::fs::read_to_string(archive.path_for(&key)).unwrap();
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed["metadata"]["run_id"], "run-1");
        assert!(written.contains("\n  \"data\""));

        let sidecar = dir.path().join("faq-output/faq_data_20240309_070501.meta.json");
        let tags: Value = serde_json::from_str(&std::fs::read_to_string(sidecar).unwrap()).unwrap();
        assert_json_eq!(
            tags,
            json!({"execution-time": "4.32", "run-id": "run-1", "total-faqs": "1"})
        );
    }
}
