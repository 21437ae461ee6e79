//! User and repository collection.
//!
//! The collector searches users by location and follower threshold, fetches
//! every hit's full profile, then pages through each user's repositories.
//! Requests run one at a time; a rate-limited request sleeps and is retried
//! in place.

use crate::config::CollectConfig;
use crate::github::rate_limit::{assess, Assessment, RetryPolicy};
use crate::github::transport::Transport;
use crate::github::GithubError;
use crate::models::{ApiRepository, ApiUser, RepositoryRecord, SearchPage, UserRecord};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use tracing::{debug, debug_span, info, info_span, warn, Instrument, Span};

/// GitHub never serves more than this many search results for one query.
pub const SEARCH_RESULT_CAP: usize = 1000;

/// Largest page size the API accepts.
pub const MAX_PER_PAGE: usize = 100;

/// Both tables produced by one run.
#[derive(Debug, Default)]
pub struct Collection {
    pub users: Vec<UserRecord>,
    pub repositories: Vec<RepositoryRecord>,
}

/// Paginating GitHub collector.
pub struct Collector<T> {
    transport: T,
    api_url: String,
    per_page: usize,
    policy: RetryPolicy,
    clock: fn() -> i64,
    progress: ProgressBar,
    span: Span,
}

impl<T: Transport> Collector<T> {
    /// Create a collector for `api_url`.
    ///
    /// All log output of this collector is recorded inside its own span.
    pub fn new(transport: T, api_url: &str, policy: RetryPolicy) -> Self {
        let api_url = api_url.trim_end_matches('/').to_string();
        let span = info_span!("collector", api = %api_url);

        Self {
            transport,
            api_url,
            per_page: MAX_PER_PAGE,
            policy,
            clock: || Utc::now().timestamp(),
            progress: ProgressBar::hidden(),
            span,
        }
    }

    /// Page size for search and repository listings, at most 100.
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    /// Show a spinner while collecting.
    pub fn with_progress(mut self, show: bool) -> Self {
        if show {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            self.progress = pb;
        }
        self
    }

    /// Replace the epoch-seconds clock used to interpret reset headers.
    #[cfg(test)]
    fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Run a full collection: search, then repositories for every user.
    pub async fn collect(&self, settings: &CollectConfig) -> Result<Collection, GithubError> {
        let span = info_span!(
            parent: &self.span,
            "collect",
            location = %settings.location,
            min_followers = settings.min_followers
        );

        async {
            let users = self
                .search_users(&settings.location, settings.min_followers)
                .await?;
            info!("Found {} users", users.len());

            let mut repositories = Vec::new();
            self.progress.set_position(0);
            for user in &users {
                self.progress
                    .set_message(format!("repositories of {}", user.login));
                let repos = self
                    .get_user_repositories(&user.login, settings.max_repos)
                    .await?;
                debug!("{}: {} repositories", user.login, repos.len());
                repositories.extend(repos);
                self.progress.inc(1);
            }
            self.progress.finish_and_clear();

            info!(
                "Collected {} users and {} repositories",
                users.len(),
                repositories.len()
            );

            Ok::<_, GithubError>(Collection {
                users,
                repositories,
            })
        }
        .instrument(span)
        .await
    }

    /// Search users located in `location` with more than `min_followers`
    /// followers, and fetch the full profile of each.
    pub async fn search_users(
        &self,
        location: &str,
        min_followers: u32,
    ) -> Result<Vec<UserRecord>, GithubError> {
        let url = format!("{}/search/users", self.api_url);
        let query = search_query(location, min_followers);
        let span = info_span!(
            parent: &self.span,
            "search_users",
            location = %location,
            min_followers
        );

        async {
            info!("Searching users: {}", query);
            let mut users = Vec::new();
            let mut seen = 0usize;

            for page in 1usize.. {
                let params = [
                    ("q", query.clone()),
                    ("per_page", self.per_page.to_string()),
                    ("page", page.to_string()),
                ];
                let hits: SearchPage = self.get_json(&url, &params, "search page").await?;
                let count = hits.items.len();
                debug!("Search page {} returned {} users", page, count);

                if count == 0 {
                    break;
                }

                for hit in hits.items {
                    self.progress.set_message(format!("profile of {}", hit.login));
                    let profile: ApiUser = self.get_json(&hit.url, &[], "user profile").await?;
                    users.push(UserRecord::from(profile));
                    self.progress.inc(1);
                }

                seen += count;
                if count < self.per_page {
                    break;
                }
                if seen >= SEARCH_RESULT_CAP {
                    warn!(
                        "Search result cap of {} reached; narrow the query to see more users",
                        SEARCH_RESULT_CAP
                    );
                    break;
                }
            }

            Ok::<_, GithubError>(users)
        }
        .instrument(span)
        .await
    }

    /// Fetch up to `max_count` repositories of `login`, most recently pushed
    /// first.
    pub async fn get_user_repositories(
        &self,
        login: &str,
        max_count: usize,
    ) -> Result<Vec<RepositoryRecord>, GithubError> {
        let url = format!("{}/users/{}/repos", self.api_url, login);
        let span = debug_span!(parent: &self.span, "repositories", login = %login, max_count);

        async {
            let mut repositories = Vec::new();

            for page in 1usize.. {
                let params = [
                    ("sort", "pushed".to_string()),
                    ("direction", "desc".to_string()),
                    ("per_page", self.per_page.to_string()),
                    ("page", page.to_string()),
                ];
                let batch: Vec<ApiRepository> =
                    self.get_json(&url, &params, "repository page").await?;
                let count = batch.len();

                repositories.extend(
                    batch
                        .into_iter()
                        .map(|repo| RepositoryRecord::from_api(login, repo)),
                );

                if count < self.per_page || repositories.len() >= max_count {
                    break;
                }
            }

            repositories.truncate(max_count);
            Ok::<_, GithubError>(repositories)
        }
        .instrument(span)
        .await
    }

    /// GET and decode, sleeping through rate limits up to the retry ceiling.
    async fn get_json<D: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        context: &str,
    ) -> Result<D, GithubError> {
        let mut retries = 0u32;

        loop {
            let response = self.transport.get(url, query).await?;
            let now = (self.clock)();

            match assess(
                response.status,
                &response.headers,
                now,
                retries + 1,
                &self.policy,
            ) {
                Assessment::Proceed => {
                    return serde_json::from_str(&response.body).map_err(|source| {
                        GithubError::Decode {
                            context: context.to_string(),
                            source,
                        }
                    });
                }
                Assessment::Retry(wait) => {
                    if retries >= self.policy.max_retries {
                        return Err(GithubError::RateLimitExhausted { attempts: retries });
                    }
                    retries += 1;
                    warn!(
                        "Rate limited (HTTP {}), waiting {}s before retry {}/{}",
                        response.status.as_u16(),
                        wait.as_secs(),
                        retries,
                        self.policy.max_retries
                    );
                    self.progress
                        .set_message(format!("rate limited, waiting {}s", wait.as_secs()));
                    tokio::time::sleep(wait).await;
                }
                Assessment::Fail => {
                    return Err(GithubError::Status {
                        status: response.status.as_u16(),
                        body: response.body,
                    });
                }
            }
        }
    }
}

/// Search qualifier string for a location and a follower threshold.
pub fn search_query(location: &str, min_followers: u32) -> String {
    format!("location:\"{}\" followers:>{}", location.trim(), min_followers)
}
