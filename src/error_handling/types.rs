//! Error type definitions.
//!
//! This module defines the typed errors returned at component seams and the
//! degradation kinds counted during a scan.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::{AsRefStr, EnumIter as EnumIterMacro};
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error initializing the DNS resolver.
    #[error("DNS resolver initialization error: {0}")]
    DnsResolverError(String),

    /// Error launching the headless browser.
    #[error("Browser launch error: {0}")]
    BrowserLaunchError(String),

    /// A scan setting is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors returned by a search provider call.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The provider answered with an error message in its payload.
    #[error("search provider error: {0}")]
    Provider(String),

    /// The provider answered with a non-success HTTP status.
    #[error("search provider returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// The request never completed (timeout, connect, TLS).
    #[error("search request failed: {0}")]
    Transport(#[from] ReqwestError),

    /// The payload could not be decoded.
    #[error("search response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SearchError {
    /// Whether this error means the API key itself is unusable (quota exhausted,
    /// forbidden, invalid), so a fallback key is worth one attempt.
    pub fn is_key_error(&self) -> bool {
        match self {
            SearchError::Provider(message) => super::is_key_error_message(message),
            SearchError::Http { status, body } => {
                matches!(status, 401 | 403 | 429) || super::is_key_error_message(body)
            }
            SearchError::Transport(_) | SearchError::Parse(_) => false,
        }
    }
}

/// Kinds of degradation that can happen during a scan.
///
/// None of these abort a scan; each is logged and counted so the caller can
/// see how much of the result was produced on a degraded path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorType {
    // Search
    SearchQueryFailed,
    SearchKeySwapped,
    // Subdomains
    SubdomainDnsError,
    CertificateTransparencyError,
    SubdomainContentScanError,
    // Crawl
    CrawlFetchFailed,
    SitemapFetchFailed,
    // Verification
    VerificationFetchFailed,
    BrowserRenderFailed,
    BrowserUnavailable,
    // Intelligence
    WhoisLookupFailed,
    BlacklistLookupFailed,
    // Classification
    ClassifierFallback,
    // Budget
    WallClockBudgetExceeded,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}
