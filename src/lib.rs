//! seo_poison_scanner library: detection of SEO poisoning on a domain
//!
//! This library scans a domain for gambling, pornography and defacement spam
//! injected into its pages. A scan gathers domain intelligence, enumerates
//! subdomains, collects candidate pages from search engines and crawling,
//! classifies them, verifies each one against the live site (plain HTTP first,
//! headless browser when the answer is ambiguous) and computes a risk verdict.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use seo_poison_scanner::dns::HostResolver;
//! use seo_poison_scanner::initialization::{init_client, init_resolver};
//! use seo_poison_scanner::{ApiKeys, ScanConfig, ScanRequest, ScanType, Scanner};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScanConfig::default();
//! let client = init_client(config.http_timeout_secs)?;
//! let resolver: Arc<dyn HostResolver> = init_resolver()?;
//! let scanner = Scanner::new(client, resolver);
//!
//! let request = ScanRequest::new(
//!     "example.go.id",
//!     ApiKeys::new("serpapi-key", None),
//!     ScanType::Quick,
//! );
//! let result = scanner.perform_scan(&request, &config).await;
//! println!("{:?} (risk {})", result.final_conclusion.status, result.final_conclusion.risk_score);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Deep verification additionally needs
//! a Chrome/Chromium binary. A scanner without a browser launcher verifies on
//! plain HTTP only; a launcher that cannot start a browser disables
//! verification for that scan.

pub mod cache;
pub mod classify;
pub mod config;
pub mod crawl;
pub mod detection;
pub mod dns;
pub mod domain;
pub mod error_handling;
pub mod graph;
pub mod initialization;
pub mod intel;
pub mod keywords;
pub mod progress;
pub mod scan;
pub mod search;
pub mod status_server;
pub mod subdomain;
pub mod urls;
pub mod user_agent;
pub mod utils;
pub mod verify;

// Re-export public API
pub use cache::ScanCaches;
pub use config::{LogFormat, LogLevel, ScanConfig, ScanType, Tuning};
pub use keywords::KeywordSet;
pub use progress::{ProgressSink, ProgressStore, ProgressUpdate};
pub use scan::{FinalConclusion, RiskStatus, ScanRequest, ScanResult, Scanner};
pub use search::{ApiKeys, SearchResult};
