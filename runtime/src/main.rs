//! `faq-harvest` command-line entry point.

use anyhow::Result;
use clap::{Parser, Subcommand};
use faq_harvest_runtime::cli::extract_cmd::ExtractArgs;
use faq_harvest_runtime::cli::scrape_cmd::ScrapeArgs;
use faq_harvest_runtime::cli::{categories_cmd, doctor, extract_cmd, scrape_cmd};
use faq_harvest_runtime::config::ScrapeConfig;
use faq_harvest_runtime::logging;

#[derive(Debug, Parser)]
#[command(name = "faq-harvest", version, about = "Scrape FAQ pages into question/answer records")]
struct Cli {
    /// Print machine-readable JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scrape every category and print the response envelope.
    Scrape(ScrapeArgs),
    /// Extract records from a saved category page.
    Extract(ExtractArgs),
    /// List the known categories.
    Categories,
    /// Check that a scrape can run on this machine.
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json, cli.verbose);

    let config = ScrapeConfig::from_env()?;
    let ok = match cli.command {
        Command::Scrape(args) => scrape_cmd::run(args, config, cli.json).await?,
        Command::Extract(args) => {
            extract_cmd::run(args)?;
            true
        }
        Command::Categories => {
            categories_cmd::run(&config, cli.json);
            true
        }
        Command::Doctor => doctor::run(&config, cli.json)?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
