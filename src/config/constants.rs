//! Configuration constants.
//!
//! This module defines the operational constants used throughout the scanner
//! (timeouts, size limits, batch sizes) and the default values of every heuristic
//! tuning knob. The heuristics are carried into [`crate::config::Tuning`] so a
//! caller can override them per scan without touching these defaults.

use std::time::Duration;

// Network operation timeouts
/// DNS query timeout in seconds
/// Most DNS queries complete in <1s, 3s provides a buffer while failing fast on
/// unresponsive servers during wordlist brute-forcing
pub const DNS_TIMEOUT_SECS: u64 = 3;
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;
/// Default per-request HTTP timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
/// Timeout for the Certificate Transparency lookup (crt.sh is slow for large domains)
pub const CT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent string for HTTP requests.
///
/// Used by the crawler, the search client and as the first of the rotating
/// verification user agents.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

// Response and body size limits
/// Maximum response body size in bytes (2MB)
/// Larger bodies are truncated before keyword matching to prevent memory exhaustion
pub const MAX_RESPONSE_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Maximum error message length in characters (2000 chars)
/// Error messages copied into scan results are truncated to this length
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 2000;

/// Length of the text window kept around a keyword hit when building snippets
pub const SNIPPET_CONTEXT_CHARS: usize = 80;

// Crawling
/// Number of in-flight fetches per batch in the fast crawler
pub const FAST_CRAWL_BATCH_SIZE: usize = 8;
/// Default page budget for crawling
pub const DEFAULT_MAX_CRAWL_PAGES: usize = 50;
/// Maximum number of nested sitemap indexes followed
pub const MAX_SITEMAP_INDEX_FANOUT: usize = 5;
/// Maximum number of URLs ingested from sitemaps
pub const MAX_SITEMAP_URLS: usize = 500;

// Search
/// Default maximum number of search results kept per scan
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 100;
/// Default TTL of cached search/intelligence responses, in days
pub const DEFAULT_API_CACHE_TTL_DAYS: u64 = 1;
pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
/// Default capacity of each in-memory response cache
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

// Subdomains
/// Concurrent DNS lookups during wordlist brute-forcing
pub const SUBDOMAIN_DNS_CONCURRENCY: usize = 20;
/// Default number of subdomains whose homepage is scanned for content
pub const DEFAULT_MAX_SUBDOMAINS_TO_SCAN: usize = 10;

// Headless browser
/// Navigation timeout for the headless browser
pub const BROWSER_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
/// Fixed settle delay after DOM ready so late scripts can inject content
pub const BROWSER_SETTLE_DELAY: Duration = Duration::from_millis(2000);
/// Idle timeout before the browser process is considered dead
pub const BROWSER_IDLE_TIMEOUT: Duration = Duration::from_secs(120);
/// Largest intercepted response body kept for keyword analysis
pub const MAX_INTERCEPTED_BODY_SIZE: usize = 512 * 1024;

// Progress
/// Progress entries expire if unread for this long
pub const PROGRESS_TTL: Duration = Duration::from_secs(60 * 60);
/// Maximum number of scans tracked by the progress store
pub const PROGRESS_STORE_CAPACITY: u64 = 1_000;

// Heuristic defaults (copied into `Tuning`)
/// Confidence for 1-2 keyword matches
pub const CONFIDENCE_LOW: f64 = 0.3;
/// Confidence for exactly 3, 4 and 5 keyword matches
pub const CONFIDENCE_MEDIUM_STEPS: [f64; 3] = [0.4, 0.5, 0.6];
/// Confidence for 6 or more keyword matches
pub const CONFIDENCE_HIGH: f64 = 0.9;
/// Discount applied to keyword matches found inside concealed elements
pub const HIDDEN_CONTENT_DISCOUNT: f64 = 0.8;
/// Flat bonus added to overall confidence when an injection pattern matches
pub const INJECTION_BONUS: f64 = 0.2;
/// Weight of the visible-text pass
pub const WEIGHT_VISIBLE_TEXT: f64 = 0.40;
/// Weight of the hidden-content pass
pub const WEIGHT_HIDDEN_CONTENT: f64 = 0.25;
/// Weight of the HTML-comment pass
pub const WEIGHT_HTML_COMMENTS: f64 = 0.15;
/// Weight of the meta-tag pass
pub const WEIGHT_META_TAGS: f64 = 0.10;
/// Weight of the hidden-attribute pass
pub const WEIGHT_HIDDEN_ATTRIBUTES: f64 = 0.10;
/// Shannon entropy (bits/char) above which an inline script is considered high-entropy
pub const ENTROPY_THRESHOLD: f64 = 3.5;
/// Whitespace ratio below which an inline script is considered minified
pub const MIN_WHITESPACE_RATIO: f64 = 0.05;
/// Scripts shorter than this are too small for entropy/minification signals
pub const MIN_SCRIPT_LENGTH_FOR_ENTROPY: usize = 200;
/// Risk points per live-malicious page
pub const RISK_WEIGHT_LIVE_MALICIOUS: u32 = 40;
/// Risk points per cache-only page
pub const RISK_WEIGHT_CACHE_ONLY: u32 = 15;
/// More cache-only pages than this escalates the conclusion to "PERLU PERHATIAN"
pub const CACHE_ONLY_ATTENTION_THRESHOLD: usize = 3;
