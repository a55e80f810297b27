//! Trace-Watch main entry point
//!
//! This is the command-line interface for the Trace-Watch request-log monitor.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use trace_watch::config::{load_config, validate, Config};
use trace_watch::monitor::{IntervalTicker, Poller};
use trace_watch::output::JsonArtifactStore;
use trace_watch::sources::load_sources;
use tracing_subscriber::EnvFilter;

/// Trace-Watch: an incremental Trace.axd request-log monitor
///
/// Trace-Watch polls ASP.NET Trace.axd endpoints, fetches the details of every
/// newly logged request and stores each batch as a JSON file.
#[derive(Parser, Debug)]
#[command(name = "trace-watch")]
#[command(version)]
#[command(about = "Incremental Trace.axd request-log monitor", long_about = None)]
struct Cli {
    /// File with one Trace.axd URL (or host/path) per line
    #[arg(short, long, value_name = "FILE")]
    list: PathBuf,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Polling interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// HTTP timeout for requests in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Number of concurrent detail workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Comma-separated keywords to report (e.g. session,auth,token)
    #[arg(short, long, value_delimiter = ',')]
    keywords: Option<Vec<String>>,

    /// Comma-separated extra HTTP headers (Name:Value)
    #[arg(long, value_delimiter = ',')]
    headers: Vec<String>,

    /// Directory receiving batch and watermark files
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Continue from the persisted watermark instead of fetching everything
    #[arg(long)]
    resume: bool,

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

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?
        }
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid configuration")?;

    let sources = load_sources(&cli.list)
        .with_context(|| format!("failed to load source list {}", cli.list.display()))?;
    tracing::info!("Monitoring {} sources", sources.len());
    for source in &sources {
        tracing::debug!("  - {}", source);
    }

    let store = JsonArtifactStore::from_config(&config.output);
    let poller = Poller::from_config(&config, sources, store)?;
    let ticker = IntervalTicker::new(Duration::from_secs(config.monitor.interval_secs));

    tracing::info!(
        "Polling every {}s with {} workers",
        config.monitor.interval_secs,
        config.monitor.workers
    );

    tokio::select! {
        result = poller.run(ticker) => {
            result.context("monitor stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
        }
    }

    Ok(())
}

/// Applies command-line flags on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(interval) = cli.interval {
        config.monitor.interval_secs = interval;
    }
    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }
    if let Some(workers) = cli.workers {
        config.monitor.workers = workers;
    }
    if let Some(keywords) = &cli.keywords {
        config.monitor.keywords = keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
    }
    config.http.headers.extend(
        cli.headers
            .iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty()),
    );
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.clone();
    }
    config.monitor.resume |= cli.resume;
    config.monitor.verbose |= cli.verbose > 0;
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("trace_watch=info,warn"),
            1 => EnvFilter::new("trace_watch=debug,info"),
            2 => EnvFilter::new("trace_watch=trace,debug"),
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
