//! site-corpus main entry point
//!
//! This is the command-line interface for the site-corpus crawler.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use site_corpus::config::{load_config_with_hash, validate, Config};
use site_corpus::crawler::{CrawlEngine, HttpLoader};
use site_corpus::output::{write_json_file, CorpusBuilder};
use site_corpus::service::{run_job, CrawlService, SharedStore};
use site_corpus::state::JobRegistry;
use site_corpus::storage::open_storage;
use site_corpus::url::normalize_url;
use tracing_subscriber::EnvFilter;

/// site-corpus: a bounded website crawler
///
/// Crawls one site breadth-first from a seed URL and collects the title and
/// main text of every page it reaches within a page budget.
#[derive(Parser, Debug)]
#[command(name = "site-corpus")]
#[command(version)]
#[command(about = "Crawl a website into a text corpus", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the crawl worker and the HTTP API
    Serve,

    /// Crawl one site in-process and write its corpus
    Crawl {
        /// Seed URL
        url: String,

        /// Page budget (defaults to the configured default)
        #[arg(long)]
        max_pages: Option<usize>,

        /// Where to write the corpus JSON (defaults to <json-dir>/<job_id>.json)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Load, validate and print the effective configuration
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve => handle_serve(config).await,
        Command::Crawl {
            url,
            max_pages,
            output,
        } => handle_crawl(config, &url, max_pages, output).await,
        Command::CheckConfig => {
            handle_check_config(&config);
            Ok(())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_corpus=info,tower_http=info,warn"),
            1 => EnvFilter::new("site_corpus=debug,tower_http=debug,info"),
            2 => EnvFilter::new("site_corpus=trace,debug"),
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

fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

fn open_store(config: &Config) -> anyhow::Result<SharedStore> {
    let storage = open_storage(Path::new(&config.output.database_path)).with_context(|| {
        format!("Failed to open database {}", config.output.database_path)
    })?;
    Ok(Arc::new(Mutex::new(storage)))
}

/// Handles `serve`: runs the worker and the API until the process is stopped
async fn handle_serve(config: Config) -> anyhow::Result<()> {
    let store = open_store(&config)?;
    let loader = HttpLoader::from_config(&config.user_agent)?;
    let service = CrawlService::start(loader, store, &config);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, site_corpus::api::router(service)).await?;
    Ok(())
}

/// Handles `crawl`: one job, start to finish, in this process
async fn handle_crawl(
    config: Config,
    url: &str,
    max_pages: Option<usize>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let seed = normalize_url(url, None)?;
    let max_pages = max_pages.unwrap_or(config.crawler.default_max_pages);
    if max_pages == 0 {
        bail!("--max-pages must be at least 1");
    }

    let store = open_store(&config)?;
    let loader = HttpLoader::from_config(&config.user_agent)?;
    let engine = CrawlEngine::new(loader, &config.crawler);

    let registry = JobRegistry::new();
    let job = registry.create(seed.as_str(), max_pages);

    // Export to the explicit path below instead of the json directory
    let json_dir = match (&output, config.output.json_dir.as_str()) {
        (None, dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => None,
    };

    let result = run_job(&engine, &store, json_dir.as_deref(), &job).await;

    if let Some(path) = &output {
        let corpus = job.read(CorpusBuilder::build);
        write_json_file(path, &corpus)?;
        tracing::info!("Wrote {} pages to {}", corpus.len(), path.display());
    }

    println!("{}", serde_json::to_string_pretty(&job.snapshot())?);

    result?;
    Ok(())
}

/// Handles `check-config`: prints the effective configuration
fn handle_check_config(config: &Config) {
    println!("=== site-corpus configuration ===\n");

    println!("Crawler:");
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Default max pages: {}", config.crawler.default_max_pages);
    println!("  Max attempts: {}", config.crawler.max_attempts);
    println!("  Attempt timeout: {}s", config.crawler.attempt_timeout_secs);
    println!("  Retry backoff: {}ms", config.crawler.retry_backoff_ms);
    println!("  Link ceiling factor: {}", config.crawler.link_ceiling_factor);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    if config.output.json_dir.is_empty() {
        println!("  JSON export: disabled");
    } else {
        println!("  JSON export: {}", config.output.json_dir);
    }

    println!("\nServer:");
    println!("  Bind: {}", config.server.bind);

    println!("\n✓ Configuration is valid");
}
