//! Side-effect sinks for a finished run: archival and metrics.
//!
//! Both are best-effort. The invocation handler logs their failures and
//! never lets them change the response.

pub mod archive;
pub mod metrics;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

pub use archive::{archive_key, build_archive_document, ArchiveMetadata, FileArchive};
pub use metrics::{run_metrics, JsonlMetrics, Metric, MetricUnit, TracingMetrics};

/// Durable storage for a JSON document under a key.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn store(&self, key: &str, document: &Value, tags: &BTreeMap<String, String>)
        -> Result<()>;

    fn describe(&self) -> String;
}

/// Receiver of named numeric measurements.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn publish(&self, metrics: &[Metric]) -> Result<()>;

    fn describe(&self) -> String;
}
