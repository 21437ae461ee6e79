//! ghcensus - GitHub user census
//!
//! A CLI tool that collects public profiles and repositories of GitHub
//! users in a location into two CSV tables, and answers a fixed set of
//! analytical questions over them.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (API failure, rate limit exhausted, I/O, config)

mod analysis;
mod cli;
mod config;
mod github;
mod models;
mod report;
mod storage;

use analysis::QuestionSettings;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{AnalyzeArgs, Args, CollectArgs, Command, OutputFormat};
use config::{Config, CONFIG_FILE};
use github::{Collector, HttpTransport, RetryPolicy};
use models::{Report, ReportMetadata};
use std::time::Instant;
use storage::Tables;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    init_logging(&args);

    info!("ghcensus v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let result = match args.command {
        Command::Collect(ref collect) => run_collect(&args, collect).await,
        Command::Analyze(ref analyze) => run_analyze(&args, analyze),
        Command::InitConfig => Ok(()),
    };

    if let Err(e) = result {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle `init-config`: generate a default .ghcensus.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the location, thresholds and output paths.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` refines the filter when set.
fn init_logging(args: &Args) {
    let level = args.log_level();
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

/// Run the collector and write both tables.
async fn run_collect(args: &Args, collect: &CollectArgs) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(args)?;
    config.merge_with_collect(collect);

    if config.collect.location.trim().is_empty() {
        bail!("No location given. Use --location or set collect.location in {}", CONFIG_FILE);
    }
    if config.github.token.as_deref().map_or(true, str::is_empty) {
        warn!("No GitHub token configured; unauthenticated requests are heavily rate limited");
    }

    println!("🔎 Collecting GitHub users");
    println!("   Location: {}", config.collect.location);
    println!("   Followers: > {}", config.collect.min_followers);
    println!("   Max repositories per user: {}", config.collect.max_repos);
    println!("   API: {}", config.github.api_url);

    let transport = HttpTransport::new(&config.github).context("Failed to create GitHub client")?;
    let collector = Collector::new(
        transport,
        &config.github.api_url,
        RetryPolicy::from(&config.retry),
    )
    .with_per_page(config.github.per_page)
    .with_progress(!args.quiet);

    let collection = collector.collect(&config.collect).await.map_err(|e| {
        if e.is_rate_limited() {
            warn!("Raise retry.max_retries or supply a token to get a higher rate limit");
        }
        anyhow::Error::new(e).context("Collection aborted")
    })?;

    let tables = Tables {
        users: collection.users,
        repositories: collection.repositories,
    };
    tables.save(&config.collect.users_path, &config.collect.repositories_path)?;

    let duration = start_time.elapsed().as_secs_f64();
    println!("\n📊 Collection Summary:");
    println!(
        "   Users: {} -> {}",
        tables.users.len(),
        config.collect.users_path.display()
    );
    println!(
        "   Repositories: {} -> {}",
        tables.repositories.len(),
        config.collect.repositories_path.display()
    );
    println!("   Duration: {:.1}s", duration);
    println!("\n✅ Collection complete!");

    Ok(())
}

/// Load both tables, answer the question set and render the report.
fn run_analyze(args: &Args, analyze: &AnalyzeArgs) -> Result<()> {
    let mut config = load_config(args)?;
    config.merge_with_analyze(analyze);

    let users_path = config.collect.users_path.clone();
    let repositories_path = config.collect.repositories_path.clone();
    info!(
        "Loading tables {} and {}",
        users_path.display(),
        repositories_path.display()
    );
    let tables = Tables::load(&users_path, &repositories_path)?;

    let settings = QuestionSettings {
        location: config.analysis_location().to_string(),
        cohort_cutoff: config.analyze.cohort_cutoff,
        top_n: config.analyze.top_n,
    };
    let findings = analysis::answer_all(&tables, &settings);

    let report = Report {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            users_path,
            repositories_path,
            user_count: tables.users.len(),
            repository_count: tables.repositories.len(),
            location: settings.location.clone(),
            cohort_cutoff: settings.cohort_cutoff,
        },
        findings,
    };

    let output = match config.analyze.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    match config.analyze.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                println!("✅ Report saved to: {}", path.display());
            }
        }
        None => println!("{}", output),
    }

    Ok(())
}
