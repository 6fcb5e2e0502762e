//! `faq-harvest scrape`: run one invocation and report the response.

use crate::cli::output::{self, Styled};
use crate::config::ScrapeConfig;
use crate::handler::{handle_invocation, Dependencies, InvocationEvent, InvocationResponse};
use crate::renderer::{BrowserLauncher, ChromiumLauncher, StaticRenderer};
use crate::sinks::{FileArchive, JsonlMetrics, TracingMetrics};
use anyhow::Result;
use clap::Args;
use faq_harvest::OrdinalMode;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Args)]
pub struct ScrapeArgs {
    /// Category page to scrape (repeatable). Without any, categories are
    /// discovered from the site's navigation menu.
    #[arg(long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Archive the run document under this directory.
    #[arg(long, value_name = "DIR", env = "FAQ_HARVEST_OUTPUT_DIR")]
    pub archive_dir: Option<PathBuf>,

    /// Append run metrics to this JSONL file.
    #[arg(long, value_name = "FILE")]
    pub metrics_file: Option<PathBuf>,

    /// Replay saved `{category-id}.html` pages instead of launching a browser.
    #[arg(long, value_name = "DIR")]
    pub snapshots: Option<PathBuf>,

    /// Pages rendered at the same time.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Ordered-list numbering: `cumulative` or `per-list`.
    #[arg(long)]
    pub ordinals: Option<OrdinalMode>,

    /// Site origin to scrape.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Pause after each navigation, in milliseconds.
    #[arg(long)]
    pub settle_ms: Option<u64>,
}

impl ScrapeArgs {
    /// Apply the flags on top of `config`.
    pub fn apply(&self, config: &mut ScrapeConfig) {
        if let Some(base) = &self.base_url {
            config.base_url = base.trim_end_matches('/').to_string();
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n.max(1);
        }
        if let Some(mode) = self.ordinals {
            config.ordinals = mode;
        }
        if let Some(ms) = self.settle_ms {
            config.settle_ms = ms;
        }
    }

    fn event(&self) -> InvocationEvent {
        InvocationEvent {
            urls: (!self.urls.is_empty()).then(|| self.urls.clone()),
        }
    }
}

/// Build the collaborators the flags ask for.
pub fn dependencies(args: &ScrapeArgs, mut config: ScrapeConfig) -> Result<Dependencies> {
    args.apply(&mut config);
    let launcher: Arc<dyn BrowserLauncher> = match &args.snapshots {
        Some(dir) => {
            config = config.without_delays();
            Arc::new(StaticRenderer::from_dir(dir, &config.base_url)?)
        }
        None => Arc::new(ChromiumLauncher),
    };

    let mut deps = Dependencies::new(config, launcher).with_metrics(Arc::new(TracingMetrics));
    if let Some(dir) = &args.archive_dir {
        deps = deps.with_archive(Arc::new(FileArchive::new(dir)));
    }
    if let Some(path) = &args.metrics_file {
        deps = deps.with_metrics(Arc::new(JsonlMetrics::open(path)?));
    }
    Ok(deps)
}

/// Run the scrape. Returns whether the invocation succeeded.
pub async fn run(args: ScrapeArgs, config: ScrapeConfig, json: bool) -> Result<bool> {
    let deps = dependencies(&args, config)?;
    let response = handle_invocation(args.event(), &deps).await;

    if json {
        output::print_json(&serde_json::to_value(&response)?);
    } else {
        print_summary(&Styled::new(), &response);
    }
    Ok(response.is_success())
}

fn print_summary(s: &Styled, response: &InvocationResponse) {
    output::print_header(s);
    match response {
        InvocationResponse::Success(ok) => {
            output::print_section(s, "Categories");
            for (name, records) in &ok.data {
                let sym = if records.is_empty() {
                    s.warn_sym()
                } else {
                    s.ok_sym()
                };
                output::print_check(sym, &format!("{name}:"), &format!("{} FAQs", records.len()));
            }
            for error in &ok.errors {
                output::print_detail(&s.yellow(error));
            }
            output::print_status(
                s,
                &s.green("OK"),
                &format!("{} FAQs in {}", ok.count, ok.execution_time),
            );
        }
        InvocationResponse::Failure(failed) => {
            output::print_check(s.fail_sym(), "Scrape:", &failed.error);
            output::print_status(s, &s.red("FAILED"), &failed.execution_time);
        }
    }
}
