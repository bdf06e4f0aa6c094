//! Configuration types.
//!
//! This module defines the immutable per-scan configuration ([`ScanConfig`]), the
//! heuristic tuning knobs ([`Tuning`]), provider endpoints and the logging enums used
//! by the CLI.

use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::constants::*;
use crate::error_handling::InitializationError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Depth of a scan.
///
/// `Quick` queries Google only and skips crawling. `Comprehensive` adds the
/// optional search engines and the sitemap/crawl/graph/unindexed stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    /// Google search plus verification
    #[default]
    Quick,
    /// Every enabled source, crawl and graph analysis
    Comprehensive,
}

/// Heuristic thresholds and weights.
///
/// These are tuning constants with no derivation behind them; they are kept
/// together so a caller can override any of them for a single scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Confidence for 1-2 keyword matches
    pub confidence_low: f64,
    /// Confidence for 3, 4 and 5 keyword matches
    pub confidence_medium_steps: [f64; 3],
    /// Confidence for 6+ keyword matches
    pub confidence_high: f64,
    /// Multiplier for matches found inside concealed elements
    pub hidden_content_discount: f64,
    /// Flat bonus when an injection pattern is found
    pub injection_bonus: f64,
    /// Weight of the visible-text pass
    pub weight_visible_text: f64,
    /// Weight of the hidden-content pass
    pub weight_hidden_content: f64,
    /// Weight of the HTML-comment pass
    pub weight_html_comments: f64,
    /// Weight of the meta-tag pass
    pub weight_meta_tags: f64,
    /// Weight of the hidden-attribute pass
    pub weight_hidden_attributes: f64,
    /// Entropy above which an inline script is high-entropy
    pub entropy_threshold: f64,
    /// Whitespace ratio below which an inline script is minified
    pub min_whitespace_ratio: f64,
    /// Risk points per live-malicious page
    pub risk_weight_live_malicious: u32,
    /// Risk points per cache-only page
    pub risk_weight_cache_only: u32,
    /// Cache-only count above which the conclusion needs attention
    pub cache_only_attention_threshold: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            confidence_low: CONFIDENCE_LOW,
            confidence_medium_steps: CONFIDENCE_MEDIUM_STEPS,
            confidence_high: CONFIDENCE_HIGH,
            hidden_content_discount: HIDDEN_CONTENT_DISCOUNT,
            injection_bonus: INJECTION_BONUS,
            weight_visible_text: WEIGHT_VISIBLE_TEXT,
            weight_hidden_content: WEIGHT_HIDDEN_CONTENT,
            weight_html_comments: WEIGHT_HTML_COMMENTS,
            weight_meta_tags: WEIGHT_META_TAGS,
            weight_hidden_attributes: WEIGHT_HIDDEN_ATTRIBUTES,
            entropy_threshold: ENTROPY_THRESHOLD,
            min_whitespace_ratio: MIN_WHITESPACE_RATIO,
            risk_weight_live_malicious: RISK_WEIGHT_LIVE_MALICIOUS,
            risk_weight_cache_only: RISK_WEIGHT_CACHE_ONLY,
            cache_only_attention_threshold: CACHE_ONLY_ATTENTION_THRESHOLD,
        }
    }
}

impl Tuning {
    /// Maps a keyword match count to a confidence score.
    ///
    /// The function is a non-decreasing step function of `matches`:
    /// 0 → 0.0, 1-2 → low, 3/4/5 → medium steps, 6+ → high.
    pub fn confidence_for_matches(&self, matches: usize) -> f64 {
        match matches {
            0 => 0.0,
            1 | 2 => self.confidence_low,
            3..=5 => self.confidence_medium_steps[matches - 3],
            _ => self.confidence_high,
        }
    }
}

/// Base URLs of the external services the scanner talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// SerpAPI search endpoint
    pub serpapi_url: String,
    /// Certificate Transparency (crt.sh) base URL
    pub crtsh_url: String,
    /// RDAP bootstrap base URL
    pub rdap_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            serpapi_url: "https://serpapi.com/search.json".to_string(),
            crtsh_url: "https://crt.sh".to_string(),
            rdap_url: "https://rdap.org".to_string(),
        }
    }
}

/// Immutable per-scan configuration.
///
/// Every `enable_*` toggle gates exactly one optional sub-stage. Callers build this
/// from whatever source they like (JSON file, environment, database) and pass it
/// to [`crate::Scanner::perform_scan`].
///
/// # Examples
///
/// ```no_run
/// use seo_poison_scanner::ScanConfig;
///
/// let config = ScanConfig {
///     enable_bing_search: true,
///     max_crawl_pages: 100,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Consult the response cache before calling search/intelligence providers
    pub enable_api_cache: bool,
    /// TTL of cached provider responses, in days; at least 1
    pub api_cache_ttl_days: u64,
    /// Single boolean query per cluster set instead of one query per cluster
    pub use_comprehensive_query: bool,
    /// Maximum number of search results kept
    pub max_search_results: usize,
    /// Query Bing (comprehensive scans)
    pub enable_bing_search: bool,
    /// Query DuckDuckGo (comprehensive scans)
    pub enable_duckduckgo_search: bool,
    /// Brute-force common subdomain prefixes via DNS
    pub enable_subdomain_dns_lookup: bool,
    /// Discover subdomains through search results
    pub enable_subdomain_search: bool,
    /// Fetch active subdomain homepages and look for keywords
    pub enable_subdomain_content_scan: bool,
    /// Cap on subdomains whose content is scanned
    pub max_subdomains_to_scan: usize,
    /// Fast crawl of the domain for keyword hits
    pub enable_deep_crawling: bool,
    /// Ingest sitemap.xml
    pub enable_sitemap_analysis: bool,
    /// Probe suspicious paths
    pub enable_path_discovery: bool,
    /// Build the link graph and look for orphans/isolated clusters
    pub enable_graph_analysis: bool,
    /// Page budget for crawling
    pub max_crawl_pages: usize,
    /// Verify candidates against the live site
    pub enable_realtime_verification: bool,
    /// Quick HTTP check first, headless browser only when ambiguous
    pub use_tiered_verification: bool,
    /// Run the illegal-content detector on fetched pages
    pub enable_illegal_content_detection: bool,
    /// Score concealed elements in the illegal-content detector
    pub enable_hidden_content_detection: bool,
    /// Score script/style injection patterns in the illegal-content detector
    pub enable_injection_detection: bool,
    /// Look for pages reachable on the site but not indexed by search
    pub enable_unindexed_discovery: bool,
    /// Search for external pages referencing the domain with gambling terms
    pub enable_backlink_analysis: bool,
    /// Per-request HTTP timeout in seconds
    pub http_timeout_secs: u64,
    /// Advisory wall-clock budget for the whole scan
    pub wall_clock_budget_secs: Option<u64>,
    /// Scheme used to reach the scanned site (`https` unless testing)
    pub site_scheme: String,
    /// Heuristic thresholds and weights
    pub tuning: Tuning,
    /// External service base URLs
    pub endpoints: Endpoints,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            enable_api_cache: true,
            api_cache_ttl_days: DEFAULT_API_CACHE_TTL_DAYS,
            use_comprehensive_query: true,
            max_search_results: DEFAULT_MAX_SEARCH_RESULTS,
            enable_bing_search: false,
            enable_duckduckgo_search: false,
            enable_subdomain_dns_lookup: true,
            enable_subdomain_search: false,
            enable_subdomain_content_scan: false,
            max_subdomains_to_scan: DEFAULT_MAX_SUBDOMAINS_TO_SCAN,
            enable_deep_crawling: true,
            enable_sitemap_analysis: true,
            enable_path_discovery: false,
            enable_graph_analysis: true,
            max_crawl_pages: DEFAULT_MAX_CRAWL_PAGES,
            enable_realtime_verification: true,
            use_tiered_verification: true,
            enable_illegal_content_detection: true,
            enable_hidden_content_detection: true,
            enable_injection_detection: true,
            enable_unindexed_discovery: false,
            enable_backlink_analysis: false,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            wall_clock_budget_secs: None,
            site_scheme: "https".to_string(),
            tuning: Tuning::default(),
            endpoints: Endpoints::default(),
        }
    }
}

impl ScanConfig {
    /// Rejects settings no scan can run with.
    pub fn validate(&self) -> Result<(), InitializationError> {
        if self.api_cache_ttl_days == 0 {
            return Err(InitializationError::InvalidConfig(
                "api_cache_ttl_days must be at least 1; set enable_api_cache to false to skip the cache"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// TTL applied to cached provider responses.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.api_cache_ttl_days.saturating_mul(SECONDS_PER_DAY))
    }

    /// Wall-clock budget as a `Duration`, if one is set.
    pub fn wall_clock_budget(&self) -> Option<Duration> {
        self.wall_clock_budget_secs.map(Duration::from_secs)
    }

    /// Base URL of the scanned site (or one of its hosts).
    pub fn site_url(&self, host: &str) -> String {
        format!("{}://{}", self.site_scheme, host)
    }
}
