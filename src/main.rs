//! Swallow-Crawl main entry point
//!
//! This is the command-line interface for the Swallow-Crawl SEO crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use swallow_crawl::config::{load_config_with_hash, validate, Config};
use swallow_crawl::crawler::{CrawlControl, Crawler, TracingObserver};
use swallow_crawl::storage::{SqliteStorage, Storage};
use tracing_subscriber::EnvFilter;

/// Swallow-Crawl: a same-site SEO crawler
///
/// Crawls pages reachable from a seed URL on the same site, honouring
/// robots.txt, and records SEO signals for every page in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "swallow-crawl")]
#[command(version)]
#[command(about = "A same-site SEO crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Override the seed URL from the configuration
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Override the page cap from the configuration
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "history")]
    dry_run: bool,

    /// List previous scan sessions from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    history: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(seed) = cli.seed {
        config.crawler.seed_url = seed;
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    validate(&config).context("invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if cli.history {
        handle_history(&config)
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("swallow_crawl=info,warn"),
            1 => EnvFilter::new("swallow_crawl=debug,info"),
            2 => EnvFilter::new("swallow_crawl=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Swallow-Crawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Concurrent requests: {}", config.crawler.concurrent_requests);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Max redirects: {}", config.crawler.max_redirects);
    println!("  Save images: {}", config.crawler.save_images);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    if let Some(proxy) = &config.crawler.proxy_url {
        println!("  Proxy: {}", proxy);
    }

    println!("\nUser Agent: {}", config.user_agent.name);
    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --history mode: lists scan sessions stored in the database
fn handle_history(config: &Config) -> anyhow::Result<()> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open {}", config.output.database_path))?;

    let sessions = storage.list_sessions()?;
    if sessions.is_empty() {
        println!("No scan sessions in {}", config.output.database_path);
        return Ok(());
    }

    println!("{:>5}  {:<10} {:>6}  {:<26} URL", "ID", "STATUS", "PAGES", "STARTED");
    for session in sessions {
        println!(
            "{:>5}  {:<10} {:>6}  {:<26} {}",
            session.id,
            session.status.to_db_string(),
            session.total_pages_scanned,
            session.started_at,
            session.base_url
        );
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open {}", config.output.database_path))?;

    tracing::info!(
        "Crawling {} (max {} pages, depth {}, {} concurrent)",
        config.crawler.seed_url,
        config.crawler.max_pages,
        config.crawler.max_depth,
        config.crawler.concurrent_requests
    );

    let control = CrawlControl::new();
    let mut crawler = Crawler::new(config, storage)?
        .with_observer(Arc::new(TracingObserver))
        .with_control(control.clone());

    let interrupt = control.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping after in-flight pages");
            interrupt.cancel();
        }
    });

    let summary = crawler.run().await.context("crawl failed")?;

    let storage = crawler.storage();
    let session = storage.get_session(summary.session_id)?;
    let pages = storage.get_pages(summary.session_id)?;
    let failed = pages.iter().filter(|p| p.status_code == 0).count();
    let duplicates = storage.find_duplicate_content(summary.session_id)?;

    println!("\n=== Scan Session {} ===", session.id);
    println!("  Seed: {}", session.base_url);
    println!("  Status: {}", session.status.to_db_string());
    println!("  Started: {}", session.started_at);
    if let Some(finished) = &session.finished_at {
        println!("  Finished: {}", finished);
    }
    println!("  Pages scanned: {}", session.total_pages_scanned);
    println!("  Failed fetches: {}", failed);
    println!("  Duplicate content groups: {}", duplicates.len());

    Ok(())
}
