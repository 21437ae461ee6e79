//! Data models for the census.
//!
//! This module contains the two flat table rows written by the collector,
//! the raw GitHub API payloads they are normalized from, and the report
//! structures produced by the analyzer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One row of the users table.
///
/// Field order is the column order of `users.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// GitHub login (unique key).
    pub login: String,
    /// Display name, empty if unset.
    pub name: String,
    /// Normalized company: trimmed, leading `@` stripped, uppercased.
    pub company: String,
    /// Free-form location, empty if unset.
    pub location: String,
    /// Public email, empty if unset.
    pub email: String,
    /// Hireable flag. `None` means the profile does not say.
    pub hireable: Option<bool>,
    /// Profile bio, empty if unset.
    pub bio: String,
    pub public_repos: u32,
    pub followers: u32,
    pub following: u32,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// `followers / (1 + following)`.
    pub fn leader_strength(&self) -> f64 {
        f64::from(self.followers) / (1.0 + f64::from(self.following))
    }

    /// Unknown hireable status counts as not hireable.
    pub fn is_hireable(&self) -> bool {
        self.hireable == Some(true)
    }

    /// Number of whitespace-separated words in the bio.
    pub fn bio_word_count(&self) -> usize {
        self.bio.split_whitespace().count()
    }

    /// Last whitespace-separated token of the display name.
    pub fn surname(&self) -> Option<&str> {
        self.name.split_whitespace().last()
    }
}

/// One row of the repositories table.
///
/// Field order is the column order of `repositories.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Login of the owning user (foreign key into the users table).
    pub login: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub stargazers_count: u64,
    pub watchers_count: u64,
    /// Primary language, empty if GitHub could not detect one.
    pub language: String,
    pub has_projects: bool,
    pub has_wiki: bool,
    /// License key (e.g. `mit`), empty if the repository has no license.
    pub license_name: String,
}

impl RepositoryRecord {
    /// Build a row from an API payload, attributing it to `login`.
    pub fn from_api(login: &str, repo: ApiRepository) -> Self {
        Self {
            login: login.to_string(),
            full_name: repo.full_name,
            created_at: repo.created_at,
            stargazers_count: repo.stargazers_count,
            watchers_count: repo.watchers_count,
            language: repo.language.unwrap_or_default(),
            has_projects: repo.has_projects,
            has_wiki: repo.has_wiki,
            license_name: repo.license.map(|l| l.key).unwrap_or_default(),
        }
    }
}

/// Normalize a raw company string.
///
/// Trims surrounding whitespace, strips a single leading `@` and
/// uppercases the remainder.
pub fn normalize_company(raw: Option<&str>) -> String {
    let trimmed = raw.unwrap_or_default().trim();
    let stripped = trimmed.strip_prefix('@').unwrap_or(trimmed);
    stripped.to_uppercase()
}

/// Page returned by `GET /search/users`.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<SearchHit>,
}

/// Partial user summary from a search page.
#[derive(Debug, Deserialize)]
pub struct SearchHit {
    pub login: String,
    /// API URL of the full profile.
    pub url: String,
}

/// Full profile from `GET /users/{login}`.
#[derive(Debug, Deserialize)]
pub struct ApiUser {
    pub login: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub hireable: Option<bool>,
    pub bio: Option<String>,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
    pub created_at: DateTime<Utc>,
}

impl From<ApiUser> for UserRecord {
    fn from(user: ApiUser) -> Self {
        Self {
            company: normalize_company(user.company.as_deref()),
            login: user.login,
            name: user.name.unwrap_or_default(),
            location: user.location.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
            hireable: user.hireable,
            bio: user.bio.unwrap_or_default(),
            public_repos: user.public_repos,
            followers: user.followers,
            following: user.following,
            created_at: user.created_at,
        }
    }
}

/// Repository entry from `GET /users/{login}/repos`.
#[derive(Debug, Deserialize)]
pub struct ApiRepository {
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    pub language: Option<String>,
    #[serde(default)]
    pub has_projects: bool,
    #[serde(default)]
    pub has_wiki: bool,
    pub license: Option<ApiLicense>,
}

#[derive(Debug, Deserialize)]
pub struct ApiLicense {
    pub key: String,
}

/// A single answered question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Stable machine-readable identifier.
    pub key: String,
    /// Human-readable question.
    pub question: String,
    /// Rendered answer: 3-decimal number, comma-joined list, or `n/a`.
    pub answer: String,
}

/// Metadata about the analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub users_path: PathBuf,
    pub repositories_path: PathBuf,
    pub user_count: usize,
    pub repository_count: usize,
    /// Location filter applied to location-scoped questions.
    pub location: String,
    pub cohort_cutoff: chrono::NaiveDate,
}

/// The complete analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub findings: Vec<Finding>,
}
