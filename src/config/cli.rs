//! Command-line options.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use super::types::{LogFormat, LogLevel, ScanConfig, ScanType};
use crate::search::ApiKeys;

/// Command-line options.
///
/// Scan behavior comes from an optional JSON [`ScanConfig`] file; the flags
/// below override individual fields of it.
///
/// # Examples
///
/// ```bash
/// # Quick scan, key from the environment
/// SERPAPI_KEY=... seo_poison_scanner example.go.id
///
/// # Comprehensive scan with a config file and a 5 minute budget
/// seo_poison_scanner example.go.id --scan-type comprehensive \
///     --config scan.json --budget-seconds 300 --output result.json
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "seo_poison_scanner",
    about = "Scans a domain for injected gambling, pornography and defacement content."
)]
pub struct Opt {
    /// Domain or URL to scan
    pub domain: String,

    /// SerpAPI key
    #[arg(long, env = "SERPAPI_KEY", hide_env_values = true, default_value = "")]
    pub api_key: String,

    /// SerpAPI key tried when the primary is rejected
    #[arg(long, env = "SERPAPI_FALLBACK_KEY", hide_env_values = true)]
    pub fallback_key: Option<String>,

    /// Scan type: quick|comprehensive
    #[arg(long, value_enum, default_value_t = ScanType::Quick)]
    pub scan_type: ScanType,

    /// JSON file with scan settings (missing fields use defaults)
    #[arg(long, value_parser)]
    pub config: Option<PathBuf>,

    /// Write the JSON result here instead of stdout
    #[arg(long, value_parser)]
    pub output: Option<PathBuf>,

    /// Wall-clock budget for the whole scan, in seconds
    #[arg(long)]
    pub budget_seconds: Option<u64>,

    /// Page budget for crawling
    #[arg(long)]
    pub max_crawl_pages: Option<usize>,

    /// Serve scan progress on this port (GET /scans/{scan_id})
    #[arg(long)]
    pub status_port: Option<u16>,

    /// Progress key for this scan (generated when omitted)
    #[arg(long)]
    pub scan_id: Option<String>,

    /// Chrome/Chromium binary used for deep verification
    #[arg(long, value_parser)]
    pub chrome_path: Option<PathBuf>,

    /// Never start a browser; verification stays on plain HTTP
    #[arg(long)]
    pub no_browser: bool,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Opt {
    /// Loads the config file (if any) and applies flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn scan_config(&self) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                serde_json::from_str::<ScanConfig>(&raw)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            None => ScanConfig::default(),
        };
        if let Some(budget) = self.budget_seconds {
            config.wall_clock_budget_secs = Some(budget);
        }
        if let Some(pages) = self.max_crawl_pages {
            config.max_crawl_pages = pages;
        }
        config.validate()?;
        Ok(config)
    }

    /// Search keys from flags or environment.
    pub fn api_keys(&self) -> ApiKeys {
        ApiKeys::new(self.api_key.clone(), self.fallback_key.clone())
    }
}
