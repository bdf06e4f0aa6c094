//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{DEFAULT_USER_AGENT, TCP_CONNECT_TIMEOUT_SECS};

/// Initializes the HTTP client shared by search, crawl and verification.
///
/// Creates a `reqwest::Client` configured with:
/// - Default User-Agent (verification overrides it per request)
/// - Global timeout of `timeout_secs`
/// - TCP connect timeout of `TCP_CONNECT_TIMEOUT_SECS` so dead hosts fail fast
/// - Redirect following (reqwest default, up to 10 hops)
///
/// # Arguments
///
/// * `timeout_secs` - Per-request timeout in seconds
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(timeout_secs: u64) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS))
        .user_agent(DEFAULT_USER_AGENT)
        .build()?;
    Ok(Arc::new(client))
}
