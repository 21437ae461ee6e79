//! GitHub REST API collection.
//!
//! This module provides the paginating collector, the rate-limit policy it
//! applies to every request, and the HTTP transport underneath.

pub mod collector;
pub mod error;
pub mod rate_limit;
pub mod transport;

pub use collector::Collector;
pub use error::GithubError;
pub use rate_limit::RetryPolicy;
pub use transport::HttpTransport;
