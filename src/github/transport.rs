//! HTTP transport for the GitHub REST API.
//!
//! The collector talks to GitHub through the [`Transport`] trait so that
//! pagination and rate-limit handling can be exercised against scripted
//! responses.

use crate::config::GithubConfig;
use crate::github::GithubError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Raw response: status, headers and body text.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Issues GET requests.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Send `GET url?query` and return the response, whatever its status.
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<ApiResponse, GithubError>;
}

/// [`Transport`] backed by a `reqwest` client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with GitHub headers, optional bearer auth and a
    /// per-request timeout.
    pub fn new(config: &GithubConfig) -> Result<Self, GithubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("ghcensus/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));

        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(GithubError::Client)?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<ApiResponse, GithubError> {
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| GithubError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|source| GithubError::Transport {
                url: url.to_string(),
                source,
            })?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_builds_with_token() {
        let config = GithubConfig {
            token: Some("ghp_example".to_string()),
            ..GithubConfig::default()
        };
        assert!(HttpTransport::new(&config).is_ok());
    }

    #[test]
    fn test_http_transport_rejects_bad_token() {
        let config = GithubConfig {
            token: Some("line\nbreak".to_string()),
            ..GithubConfig::default()
        };
        assert!(matches!(
            HttpTransport::new(&config),
            Err(GithubError::InvalidHeader(_))
        ));
    }
}
