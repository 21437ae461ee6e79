//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ghcensus.toml` files.

use crate::cli::{AnalyzeArgs, CollectArgs, OutputFormat};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".ghcensus.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// GitHub API settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Rate-limit retry settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Collection settings.
    #[serde(default)]
    pub collect: CollectConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analyze: AnalyzeConfig,
}

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// REST API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Personal access token, sent as a bearer credential.
    /// Usually supplied through `GITHUB_TOKEN` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Page size for search and repository listings (max 100).
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            timeout_seconds: default_timeout(),
            per_page: default_per_page(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_per_page() -> usize {
    100
}

/// Rate-limit retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Consecutive rate-limited retries allowed for one request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff step when the server gives no reset time.
    #[serde(default = "default_base_backoff")]
    pub base_backoff_seconds: u64,

    /// Longest single wait.
    #[serde(default = "default_max_wait")]
    pub max_wait_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_backoff_seconds: default_base_backoff(),
            max_wait_seconds: default_max_wait(),
        }
    }
}

fn default_max_retries() -> u32 {
    10
}

fn default_base_backoff() -> u64 {
    2
}

fn default_max_wait() -> u64 {
    3600 // GitHub rate-limit windows last one hour
}

/// Collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Location qualifier for the user search.
    #[serde(default)]
    pub location: String,

    /// Users need strictly more followers than this.
    #[serde(default = "default_min_followers")]
    pub min_followers: u32,

    /// Repositories kept per user, most recently pushed first.
    #[serde(default = "default_max_repos")]
    pub max_repos: usize,

    /// Output path of the users table.
    #[serde(default = "default_users_path")]
    pub users_path: PathBuf,

    /// Output path of the repositories table.
    #[serde(default = "default_repositories_path")]
    pub repositories_path: PathBuf,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            location: String::new(),
            min_followers: default_min_followers(),
            max_repos: default_max_repos(),
            users_path: default_users_path(),
            repositories_path: default_repositories_path(),
        }
    }
}

fn default_min_followers() -> u32 {
    100
}

fn default_max_repos() -> usize {
    500
}

fn default_users_path() -> PathBuf {
    PathBuf::from("users.csv")
}

fn default_repositories_path() -> PathBuf {
    PathBuf::from("repositories.csv")
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeConfig {
    /// Location filter for location-scoped questions.
    /// Falls back to `collect.location` when empty.
    #[serde(default)]
    pub location: String,

    /// Users created after this date form the recent cohort.
    #[serde(default = "default_cohort_cutoff")]
    pub cohort_cutoff: NaiveDate,

    /// Length of ranked lists.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Report path; stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            location: String::new(),
            cohort_cutoff: default_cohort_cutoff(),
            top_n: default_top_n(),
            format: OutputFormat::default(),
            output: None,
        }
    }
}

fn default_cohort_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

fn default_top_n() -> usize {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge `collect` arguments. CLI values take precedence.
    pub fn merge_with_collect(&mut self, args: &CollectArgs) {
        if let Some(ref location) = args.location {
            self.collect.location = location.clone();
        }
        if let Some(min_followers) = args.min_followers {
            self.collect.min_followers = min_followers;
        }
        if let Some(max_repos) = args.max_repos {
            self.collect.max_repos = max_repos;
        }
        if let Some(ref path) = args.users {
            self.collect.users_path = path.clone();
        }
        if let Some(ref path) = args.repositories {
            self.collect.repositories_path = path.clone();
        }

        if let Some(ref token) = args.token {
            self.github.token = Some(token.clone());
        }
        if let Some(ref api_url) = args.api_url {
            self.github.api_url = api_url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.github.timeout_seconds = timeout;
        }

        if let Some(max_retries) = args.max_retries {
            self.retry.max_retries = max_retries;
        }
    }

    /// Merge `analyze` arguments. CLI values take precedence.
    pub fn merge_with_analyze(&mut self, args: &AnalyzeArgs) {
        if let Some(ref path) = args.users {
            self.collect.users_path = path.clone();
        }
        if let Some(ref path) = args.repositories {
            self.collect.repositories_path = path.clone();
        }
        if let Some(ref location) = args.location {
            self.analyze.location = location.clone();
        }
        if let Some(cutoff) = args.cohort_cutoff {
            self.analyze.cohort_cutoff = cutoff;
        }
        if let Some(top_n) = args.top_n {
            self.analyze.top_n = top_n;
        }
        if let Some(format) = args.format {
            self.analyze.format = format;
        }
        if let Some(ref output) = args.output {
            self.analyze.output = Some(output.clone());
        }
    }

    /// Location used by the analyzer's location-scoped questions.
    pub fn analysis_location(&self) -> &str {
        if self.analyze.location.is_empty() {
            &self.collect.location
        } else {
            &self.analyze.location
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_args() -> CollectArgs {
        CollectArgs {
            location: None,
            min_followers: None,
            max_repos: None,
            token: None,
            api_url: None,
            users: None,
            repositories: None,
            max_retries: None,
            timeout: None,
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.per_page, 100);
        assert_eq!(config.retry.max_retries, 10);
        assert_eq!(config.collect.min_followers, 100);
        assert_eq!(config.collect.users_path, PathBuf::from("users.csv"));
        assert_eq!(
            config.analyze.cohort_cutoff,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[github]
timeout_seconds = 10

[retry]
max_retries = 3

[collect]
location = "Berlin"
min_followers = 200
users_path = "data/users.csv"

[analyze]
cohort_cutoff = "2018-06-01"
format = "json"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.github.timeout_seconds, 10);
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.max_wait_seconds, 3600);
        assert_eq!(config.collect.location, "Berlin");
        assert_eq!(config.collect.min_followers, 200);
        assert_eq!(config.collect.users_path, PathBuf::from("data/users.csv"));
        assert_eq!(config.collect.max_repos, 500);
        assert_eq!(
            config.analyze.cohort_cutoff,
            NaiveDate::from_ymd_opt(2018, 6, 1).unwrap()
        );
        assert_eq!(config.analyze.format, OutputFormat::Json);
    }

    #[test]
    fn test_merge_with_collect_overrides_only_given_values() {
        let mut config = Config::default();
        config.collect.location = "Berlin".to_string();

        let mut args = collect_args();
        args.min_followers = Some(500);
        args.token = Some("ghp_token".to_string());
        config.merge_with_collect(&args);

        assert_eq!(config.collect.location, "Berlin");
        assert_eq!(config.collect.min_followers, 500);
        assert_eq!(config.github.token.as_deref(), Some("ghp_token"));
        assert_eq!(config.retry.max_retries, 10);
    }

    #[test]
    fn test_analysis_location_falls_back_to_collect() {
        let mut config = Config::default();
        config.collect.location = "Berlin".to_string();
        assert_eq!(config.analysis_location(), "Berlin");

        config.analyze.location = "Munich".to_string();
        assert_eq!(config.analysis_location(), "Munich");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[github]"));
        assert!(toml_str.contains("[retry]"));
        assert!(toml_str.contains("[collect]"));
        assert!(toml_str.contains("[analyze]"));
        assert!(!toml_str.contains("token"));
    }
}
