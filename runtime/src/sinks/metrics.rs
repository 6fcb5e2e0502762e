//! Per-run operational metrics and their sinks.

use super::MetricsSink;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Namespace every metric is published under.
pub const METRICS_NAMESPACE: &str = "FaqHarvest";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricUnit {
    Count,
    Seconds,
}

/// One named measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub namespace: String,
    pub name: String,
    pub value: f64,
    pub unit: MetricUnit,
    pub timestamp: DateTime<Utc>,
}

impl Metric {
    fn new(name: &str, value: f64, unit: MetricUnit, timestamp: DateTime<Utc>) -> Self {
        Self {
            namespace: METRICS_NAMESPACE.to_string(),
            name: name.to_string(),
            value,
            unit,
            timestamp,
        }
    }
}

/// The three measurements published per run: `FAQsScraped`,
/// `ExecutionTime` and `ErrorsCount`.
pub fn run_metrics(total: usize, seconds: f64, errors: usize) -> Vec<Metric> {
    let now = Utc::now();
    vec![
        Metric::new("FAQsScraped", total as f64, MetricUnit::Count, now),
        Metric::new("ExecutionTime", seconds, MetricUnit::Seconds, now),
        Metric::new("ErrorsCount", errors as f64, MetricUnit::Count, now),
    ]
}

/// Append-only JSONL metrics file, one metric per line.
pub struct JsonlMetrics {
    path: PathBuf,
    file: Mutex<std::fs::File>,
}

impl JsonlMetrics {
    /// Open or create the metrics file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open metrics file: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl MetricsSink for JsonlMetrics {
    async fn publish(&self, metrics: &[Metric]) -> Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("metrics file lock poisoned"))?;
        for metric in metrics {
            let json = serde_json::to_string(metric)?;
            writeln!(file, "{json}")?;
        }
        file.flush()?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("jsonl metrics at {}", self.path.display())
    }
}

/// Reports metrics as `info` events.
#[derive(Debug, Default)]
pub struct TracingMetrics;

#[async_trait]
impl MetricsSink for TracingMetrics {
    async fn publish(&self, metrics: &[Metric]) -> Result<()> {
        for metric in metrics {
            info!(
                namespace = %metric.namespace,
                metric = %metric.name,
                value = metric.value,
                unit = ?metric.unit,
                "metric"
            );
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "tracing".to_string()
    }
}
