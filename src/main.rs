//! Mediatrawl command-line entry point

use anyhow::Context;
use chrono::{Datelike, Utc};
use clap::Parser;
use mediatrawl::config::load_config_with_hash;
use mediatrawl::crawler::{generate_windows, Orchestrator, SearchQuery, Subject};
use mediatrawl::output::{print_report, GalleryWriter, MediaSink};
use mediatrawl::session::SessionRegistry;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Session id used for the single CLI-driven crawl
const CLI_SESSION: i64 = 0;

/// Mediatrawl: a date-partitioned forum media crawler
///
/// Crawls a forum's search interface for one or more subjects, collects
/// and deduplicates their media links, and writes an HTML gallery.
#[derive(Parser, Debug)]
#[command(name = "mediatrawl")]
#[command(version)]
#[command(about = "A date-partitioned forum media crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Subject to crawl; repeat for multiple subjects
    #[arg(short, long = "subject", value_name = "NAME", required = true)]
    subjects: Vec<String>,

    /// First year of the crawl range (inclusive)
    #[arg(long, default_value_t = 2019)]
    start_year: i32,

    /// Last year of the crawl range (inclusive; defaults to the current year)
    #[arg(long)]
    end_year: Option<i32>,

    /// Match subjects against post titles only
    #[arg(long)]
    title_only: bool,

    /// Print the generated search windows and exit without fetching
    #[arg(long)]
    windows: bool,

    /// Write the gallery to this path instead of the configured one
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    let end_year = cli.end_year.unwrap_or_else(|| Utc::now().year());
    let subjects: Vec<Subject> = cli
        .subjects
        .iter()
        .map(|name| {
            let name = name.trim();
            anyhow::ensure!(!name.is_empty(), "subject name must not be empty");
            Ok(Subject::new(name, cli.start_year, end_year, cli.title_only))
        })
        .collect::<anyhow::Result<_>>()?;

    if cli.windows {
        handle_windows(&config, &subjects)?;
        return Ok(());
    }

    handle_crawl(config, subjects, cli.output).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("mediatrawl=info,warn"),
            1 => EnvFilter::new("mediatrawl=debug,info"),
            2 => EnvFilter::new("mediatrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --windows: prints the window plan without fetching anything
fn handle_windows(config: &mediatrawl::Config, subjects: &[Subject]) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();

    println!("=== Search Window Plan ===\n");
    for subject in subjects {
        let query = SearchQuery::new(&config.site, subject)?;
        let windows = generate_windows(&query, subject, config.crawler.min_year, today);

        println!(
            "{} ({}-{}): {} windows",
            subject.name,
            subject.start_year,
            subject.end_year,
            windows.len()
        );
        for window in &windows {
            println!("  {} .. {}  {}", window.start, window.end, window.url);
        }
        println!();
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: mediatrawl::Config,
    subjects: Vec<Subject>,
    output_override: Option<PathBuf>,
) -> anyhow::Result<()> {
    let gallery_path =
        output_override.unwrap_or_else(|| PathBuf::from(&config.output.gallery_path));

    let registry = SessionRegistry::new();
    let orchestrator = Orchestrator::new(config, registry.clone())?;

    // Ctrl-C issues a cancellation; the crawl notices at the next phase
    // boundary and returns whatever it had aggregated so far
    {
        let registry = registry.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping crawl");
                registry.cancel(CLI_SESSION);
            }
        });
    }

    let names = subjects
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    tracing::info!("Starting crawl for '{}'", names);

    let outcome = orchestrator.run_crawl(CLI_SESSION, &subjects).await?;
    print_report(&outcome.report);

    if outcome.report.stopped {
        println!("\nStopped: crawl for '{}' was cancelled", names);
        return Ok(());
    }

    let total: usize = outcome.stores.values().map(|s| s.total()).sum();
    if total == 0 {
        println!("\nNo media found for '{}'", names);
        return Ok(());
    }

    let mut sink = GalleryWriter::new(&gallery_path);
    match sink.publish(&subjects, &outcome.stores) {
        Ok(location) => println!("\nGallery written to {} ({} items)", location, total),
        Err(e) => println!("\nPublishing failed for '{}': {}", names, e),
    }

    Ok(())
}
