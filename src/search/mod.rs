//! Multi-engine search aggregation.
//!
//! This module provides:
//! - Query construction for the malicious keyword clusters
//! - A SerpAPI client for Google, Bing and DuckDuckGo
//! - [`SearchAggregator`], which adds response caching, per-query API-key
//!   fallback, skip-on-failure and global deduplication on top

mod queries;
mod serpapi;
mod types;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

pub use queries::{backlink_query, build_queries, subdomain_query, QueryCluster, QUERY_CLUSTERS};
pub use serpapi::SerpApiClient;
pub use types::{ResultSource, SearchResult};

use crate::cache::{cache_key, ResponseCache};
use crate::config::{ScanConfig, ScanType};
use crate::error_handling::{ErrorType, ScanStats};
use crate::keywords::KeywordSet;
use crate::urls::{deduplicate_results, validate_web_url};

/// Search provider credentials. Opaque to the scanner.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Key used first for every query
    pub primary: String,
    /// Key tried once when the primary is rejected
    pub fallback: Option<String>,
}

impl ApiKeys {
    /// Creates a key pair; empty strings count as absent.
    pub fn new(primary: impl Into<String>, fallback: Option<String>) -> Self {
        let primary = primary.into().trim().to_string();
        let fallback = fallback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        // A lone fallback key becomes the primary
        match (primary.is_empty(), fallback) {
            (true, Some(f)) => Self {
                primary: f,
                fallback: None,
            },
            (_, fallback) => Self { primary, fallback },
        }
    }

    /// Whether any key is available.
    pub fn is_configured(&self) -> bool {
        !self.primary.is_empty()
    }
}

/// Engines queried for a scan type.
///
/// Quick scans use Google only. Comprehensive scans add Bing and DuckDuckGo
/// when their toggles are on.
pub fn engines_for(scan_type: ScanType, config: &ScanConfig) -> Vec<ResultSource> {
    let mut engines = vec![ResultSource::Google];
    if scan_type == ScanType::Comprehensive {
        if config.enable_bing_search {
            engines.push(ResultSource::Bing);
        }
        if config.enable_duckduckgo_search {
            engines.push(ResultSource::DuckDuckGo);
        }
    }
    engines
}

/// Aggregates search results across engines and queries.
pub struct SearchAggregator {
    client: SerpApiClient,
    cache: Option<Arc<dyn ResponseCache<Vec<SearchResult>>>>,
    cache_ttl: Duration,
    keywords: Arc<KeywordSet>,
    stats: Arc<ScanStats>,
    max_results: usize,
}

impl SearchAggregator {
    /// Creates an aggregator. `cache` is consulted only when the config enables it.
    pub fn new(
        client: SerpApiClient,
        cache: Arc<dyn ResponseCache<Vec<SearchResult>>>,
        config: &ScanConfig,
        keywords: Arc<KeywordSet>,
        stats: Arc<ScanStats>,
    ) -> Self {
        Self {
            client,
            cache: config.enable_api_cache.then_some(cache),
            cache_ttl: config.cache_ttl(),
            keywords,
            stats,
            max_results: config.max_search_results,
        }
    }

    /// Searches every engine with every keyword query for `domain`.
    ///
    /// Failed queries are logged and skipped. Results are deduplicated by
    /// canonical URL across engines and queries, then truncated to
    /// `max_search_results`.
    pub async fn search(
        &self,
        domain: &str,
        keys: &ApiKeys,
        engines: &[ResultSource],
        comprehensive_query: bool,
    ) -> Vec<SearchResult> {
        if !keys.is_configured() {
            warn!("No search API key configured, skipping search for {}", domain);
            return Vec::new();
        }

        let queries = build_queries(domain, comprehensive_query);
        let mut collected = Vec::new();
        for engine in engines {
            for query in &queries {
                if let Some(results) = self.run_query(*engine, query, keys).await {
                    collected.extend(results);
                }
            }
        }

        let mut unique = self.finish(collected);
        unique.truncate(self.max_results);
        info!(
            "Search for {} returned {} unique results across {} engine(s)",
            domain,
            unique.len(),
            engines.len()
        );
        unique
    }

    /// Runs one query against one engine, with cache and key fallback.
    ///
    /// Starts on the primary key. If the provider rejects the key and a fallback
    /// exists, the same query is retried exactly once with the fallback; the
    /// next query starts on the primary again. Returns `None` if the query failed.
    pub async fn run_query(
        &self,
        engine: ResultSource,
        query: &str,
        keys: &ApiKeys,
    ) -> Option<Vec<SearchResult>> {
        let key = cache_key(engine.as_ref(), query);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&key) {
                debug!("Cache hit for {} query: {}", engine.as_ref(), query);
                return Some(cached);
            }
        }

        let outcome = match self
            .client
            .search(engine, query, &keys.primary, self.max_results)
            .await
        {
            Ok(results) => Ok(results),
            Err(e) if e.is_key_error() => match &keys.fallback {
                Some(fallback) => {
                    warn!(
                        "Primary search key rejected ({}), retrying {} query once with fallback key",
                        e,
                        engine.as_ref()
                    );
                    self.stats.increment(ErrorType::SearchKeySwapped);
                    self.client
                        .search(engine, query, fallback, self.max_results)
                        .await
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(results) => {
                if let Some(cache) = &self.cache {
                    cache.set(&key, results.clone(), self.cache_ttl);
                }
                Some(results)
            }
            Err(e) => {
                warn!("Skipping {} query '{}': {}", engine.as_ref(), query, e);
                self.stats.increment(ErrorType::SearchQueryFailed);
                None
            }
        }
    }

    /// Finds external pages that mention the domain next to gambling terms.
    pub async fn backlinks(&self, domain: &str, keys: &ApiKeys) -> Vec<SearchResult> {
        if !keys.is_configured() {
            return Vec::new();
        }
        let results = self
            .run_query(ResultSource::Google, &backlink_query(domain), keys)
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|mut r| {
                r.source = ResultSource::Backlink;
                r
            })
            .collect();
        self.finish(results)
    }

    /// Drops invalid URLs and deduplicates.
    fn finish(&self, results: Vec<SearchResult>) -> Vec<SearchResult> {
        let valid = results
            .into_iter()
            .filter(|r| validate_web_url(&r.url).is_some())
            .collect();
        deduplicate_results(valid, &self.keywords)
    }
}
