//! Invocation envelope: event in, status-coded response out.
//!
//! Partial failures (some categories empty) are a 200 with the accumulated
//! errors. Only a run that cannot start at all, such as a browser that never
//! launches, is a 500.

use crate::config::ScrapeConfig;
use crate::renderer::{launch_with_retry, BrowserLauncher};
use crate::scrape::ScrapeRun;
use crate::sinks::{
    archive_key, build_archive_document, run_metrics, ArchiveMetadata, Metric, MetricsSink,
    PersistenceSink,
};
use anyhow::Result;
use chrono::Utc;
use faq_harvest::model::round_secs;
use faq_harvest::{CategoryResult, ScrapeOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// What to scrape. Missing or empty `urls` means discover them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationEvent {
    #[serde(default)]
    pub urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub data: CategoryResult,
    pub count: usize,
    pub execution_time: String,
    pub urls: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub error: String,
    pub execution_time: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum InvocationResponse {
    Success(SuccessResponse),
    Failure(FailureResponse),
}

impl InvocationResponse {
    pub fn success(outcome: ScrapeOutcome, urls: Vec<String>, elapsed: Duration) -> Self {
        Self::Success(SuccessResponse {
            status_code: 200,
            data: outcome.results,
            count: outcome.total_count,
            execution_time: format_seconds(elapsed),
            urls,
            errors: outcome.errors,
        })
    }

    pub fn failure(error: impl Into<String>, elapsed: Duration) -> Self {
        Self::Failure(FailureResponse {
            status_code: 500,
            error: error.into(),
            execution_time: format_seconds(elapsed),
        })
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Success(s) => s.status_code,
            Self::Failure(f) => f.status_code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// `"12.34 seconds"`.
pub fn format_seconds(elapsed: Duration) -> String {
    format!("{:.2} seconds", elapsed.as_secs_f64())
}

/// Collaborators for one invocation.
pub struct Dependencies {
    pub config: ScrapeConfig,
    pub launcher: Arc<dyn BrowserLauncher>,
    pub archive: Option<Arc<dyn PersistenceSink>>,
    pub metrics: Vec<Arc<dyn MetricsSink>>,
}

impl Dependencies {
    pub fn new(config: ScrapeConfig, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            config,
            launcher,
            archive: None,
            metrics: Vec::new(),
        }
    }

    pub fn with_archive(mut self, archive: Arc<dyn PersistenceSink>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn with_metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics.push(sink);
        self
    }
}

/// Run one scrape and map it to a response. Never fails; fatal errors
/// become a 500 after a best-effort `(0, elapsed, 1)` metrics publish.
pub async fn handle_invocation(event: InvocationEvent, deps: &Dependencies) -> InvocationResponse {
    let start = Instant::now();
    info!(
        urls = event.urls.as_ref().map_or(0, Vec::len),
        "starting FAQ scraping job"
    );

    match run_invocation(&event, deps, start).await {
        Ok(response) => response,
        Err(e) => {
            let elapsed = start.elapsed();
            error!("fatal error in FAQ scraping: {e:#}");
            publish_metrics(deps, &run_metrics(0, round_secs(elapsed), 1)).await;
            InvocationResponse::failure(format!("{e:#}"), elapsed)
        }
    }
}

async fn run_invocation(
    event: &InvocationEvent,
    deps: &Dependencies,
    start: Instant,
) -> Result<InvocationResponse> {
    let config = &deps.config;
    let launcher = &deps.launcher;
    let renderer = launch_with_retry(config.launch_retries, config.launch_backoff_ms, || {
        launcher.launch(config)
    })
    .await?;

    let run = ScrapeRun::new(renderer, config.clone());
    let run_id = run.run_id();
    let urls = run.resolve(event.urls.as_deref()).await;
    let outcome = run.execute(&urls).await;
    if let Err(e) = run.close().await {
        warn!("failed to close browser: {e:#}");
    }

    let elapsed = start.elapsed();
    archive(deps, &outcome, elapsed, &run_id.to_string()).await;
    publish_metrics(
        deps,
        &run_metrics(outcome.total_count, round_secs(elapsed), outcome.errors.len()),
    )
    .await;

    if !outcome.errors.is_empty() {
        warn!("completed with {} errors", outcome.errors.len());
    }
    info!(
        total = outcome.total_count,
        "FAQ scraping completed in {}",
        format_seconds(elapsed)
    );
    Ok(InvocationResponse::success(outcome, urls, elapsed))
}

async fn archive(deps: &Dependencies, outcome: &ScrapeOutcome, elapsed: Duration, run_id: &str) {
    let Some(sink) = &deps.archive else {
        return;
    };
    let timestamp = Utc::now();
    let meta = ArchiveMetadata::new(outcome, elapsed, &deps.config.base_url, run_id, timestamp);
    let document = build_archive_document(outcome, &meta);
    let key = archive_key(timestamp);
    if let Err(e) = sink.store(&key, &document, &meta.tags()).await {
        error!("failed to archive run to {} ({key}): {e:#}", sink.describe());
    }
}

async fn publish_metrics(deps: &Dependencies, metrics: &[Metric]) {
    for sink in &deps.metrics {
        match sink.publish(metrics).await {
            Ok(()) => info!("published metrics to {}", sink.describe()),
            Err(e) => error!("failed to publish metrics to {}: {e:#}", sink.describe()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_include;
    use serde_json::json;

    #[test]
    fn test_event_urls_are_optional() {
        let event: InvocationEvent = serde_json::from_str("{}").unwrap();
        assert_eq!(event.urls, None);
        let event: InvocationEvent = serde_json::from_str(r#"{"urls": []}"#).unwrap();
        assert_eq!(event.urls, Some(vec![]));
    }

    #[test]
    fn test_failure_envelope() {
        let response = InvocationResponse::failure("no browser", Duration::from_millis(1_234));
        assert_eq!(response.status_code(), 500);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"statusCode": 500, "error": "no browser", "execution_time": "1.23 seconds"})
        );
    }

    #[test]
    fn test_success_envelope() {
        let mut outcome = ScrapeOutcome::default();
        outcome.insert_category(
            "General".into(),
            vec![faq_harvest::FaqRecord::new("Q", "A")],
        );
        let response = InvocationResponse::success(
            outcome,
            vec!["https://mycash.utah.gov/app/faq-general".into()],
            Duration::from_secs(2),
        );
        assert!(response.is_success());
        assert_json_include!(
            actual: serde_json::to_value(&response).unwrap(),
            expected: json!({
                "statusCode": 200,
                "count": 1,
                "execution_time": "2.00 seconds",
                "data": {"General": [{"question": "Q", "answer": "A"}]},
                "urls": ["https://mycash.utah.gov/app/faq-general"]
            })
        );
    }
}
