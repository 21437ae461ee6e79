//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ghcensus - GitHub user census for a location
///
/// Collect public profiles and repositories of GitHub users in a location
/// into two CSV tables, then answer a fixed set of questions over them.
///
/// Examples:
///   ghcensus collect --location Berlin --min-followers 200
///   ghcensus analyze --location Berlin --format json --output report.json
///   ghcensus init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .ghcensus.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Search users and fetch their repositories into CSV tables
    Collect(CollectArgs),
    /// Answer the question set over previously collected tables
    Analyze(AnalyzeArgs),
    /// Generate a default .ghcensus.toml configuration file
    InitConfig,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CollectArgs {
    /// Location to search users in (e.g. "Berlin")
    #[arg(short, long, value_name = "LOCATION")]
    pub location: Option<String>,

    /// Only users with more followers than this
    #[arg(long, value_name = "COUNT")]
    pub min_followers: Option<u32>,

    /// Maximum repositories kept per user
    #[arg(long, value_name = "COUNT")]
    pub max_repos: Option<usize>,

    /// GitHub personal access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, value_name = "URL", env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    /// Output path of the users table
    #[arg(long, value_name = "FILE")]
    pub users: Option<PathBuf>,

    /// Output path of the repositories table
    #[arg(long, value_name = "FILE")]
    pub repositories: Option<PathBuf>,

    /// Rate-limited retries allowed per request
    #[arg(long, value_name = "NUM")]
    pub max_retries: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Path of the users table
    #[arg(long, value_name = "FILE")]
    pub users: Option<PathBuf>,

    /// Path of the repositories table
    #[arg(long, value_name = "FILE")]
    pub repositories: Option<PathBuf>,

    /// Location filter for location-scoped questions
    #[arg(short, long, value_name = "LOCATION")]
    pub location: Option<String>,

    /// Users created after this date form the recent cohort
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub cohort_cutoff: Option<NaiveDate>,

    /// Length of ranked lists
    #[arg(long, value_name = "N")]
    pub top_n: Option<usize>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::Collect(args) => args.validate(),
            Command::Analyze(args) => args.validate(),
            Command::InitConfig => Ok(()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl CollectArgs {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref location) = self.location {
            if location.trim().is_empty() {
                return Err("Location must not be empty".to_string());
            }
        }

        if let Some(ref api_url) = self.api_url {
            if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }
}

impl AnalyzeArgs {
    fn validate(&self) -> Result<(), String> {
        if self.top_n == Some(0) {
            return Err("--top-n must be at least 1".to_string());
        }
        Ok(())
    }
}
