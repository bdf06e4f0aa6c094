//! Domain intelligence.
//!
//! Registration data comes from RDAP and reputation from domain block lists.
//! Each lookup is cached under its own key, and a failed lookup leaves its
//! field empty.

mod blacklist;
mod rdap;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub use blacklist::{check_blacklists, BlacklistCheck, BlacklistReport, DOMAIN_BLOCKLISTS};
pub use rdap::{lookup_rdap, parse_rdap, WhoisInfo};

use crate::cache::{cache_key, ResponseCache, ScanCaches};
use crate::config::ScanConfig;
use crate::dns::HostResolver;
use crate::domain::registrable_domain;
use crate::error_handling::{ErrorType, ScanStats};

/// Intelligence gathered about the scanned domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainInfo {
    pub domain: String,
    /// Registrable domain, `None` for IP targets
    pub registrable_domain: Option<String>,
    pub whois: Option<WhoisInfo>,
    pub blacklist: Option<BlacklistReport>,
}

/// Gathers [`DomainInfo`] through RDAP and DNSBL lookups.
pub struct DomainIntel {
    client: Arc<reqwest::Client>,
    resolver: Arc<dyn HostResolver>,
    whois_cache: Option<Arc<dyn ResponseCache<WhoisInfo>>>,
    blacklist_cache: Option<Arc<dyn ResponseCache<BlacklistReport>>>,
    rdap_url: String,
    ttl: Duration,
    stats: Arc<ScanStats>,
}

impl DomainIntel {
    /// Creates a gatherer; caches are used only when `enable_api_cache` is set.
    pub fn new(
        client: Arc<reqwest::Client>,
        resolver: Arc<dyn HostResolver>,
        caches: &ScanCaches,
        config: &ScanConfig,
        stats: Arc<ScanStats>,
    ) -> Self {
        let use_cache = config.enable_api_cache;
        Self {
            client,
            resolver,
            whois_cache: use_cache.then(|| caches.whois.clone()),
            blacklist_cache: use_cache.then(|| caches.blacklist.clone()),
            rdap_url: config.endpoints.rdap_url.clone(),
            ttl: config.cache_ttl(),
            stats,
        }
    }

    /// Runs both lookups for `domain`.
    pub async fn gather(&self, domain: &str) -> DomainInfo {
        let Some(registrable) = registrable_domain(domain) else {
            debug!("Skipping domain intelligence for non-domain target {}", domain);
            return DomainInfo {
                domain: domain.to_string(),
                ..Default::default()
            };
        };
        let (whois, blacklist) = tokio::join!(self.whois(&registrable), self.blacklist(&registrable));
        DomainInfo {
            domain: domain.to_string(),
            registrable_domain: Some(registrable),
            whois,
            blacklist,
        }
    }

    /// RDAP lookup, through the cache.
    pub async fn whois(&self, domain: &str) -> Option<WhoisInfo> {
        let key = cache_key("whois", domain);
        if let Some(cached) = self.whois_cache.as_ref().and_then(|c| c.get(&key)) {
            debug!("WHOIS cache hit for {}", domain);
            return Some(cached);
        }
        match lookup_rdap(&self.client, &self.rdap_url, domain).await {
            Ok(info) => {
                if let Some(cache) = &self.whois_cache {
                    cache.set(&key, info.clone(), self.ttl);
                }
                Some(info)
            }
            Err(e) => {
                warn!("WHOIS lookup failed for {}: {:#}", domain, e);
                self.stats.increment(ErrorType::WhoisLookupFailed);
                None
            }
        }
    }

    /// DNSBL lookup, through the cache. Reports with failed lists are not cached.
    pub async fn blacklist(&self, domain: &str) -> Option<BlacklistReport> {
        let key = cache_key("blacklist", domain);
        if let Some(cached) = self.blacklist_cache.as_ref().and_then(|c| c.get(&key)) {
            debug!("Blacklist cache hit for {}", domain);
            return Some(cached);
        }
        let report = check_blacklists(self.resolver.as_ref(), domain).await;
        if report.has_errors() {
            warn!("Some blacklist lookups failed for {}", domain);
            self.stats.increment(ErrorType::BlacklistLookupFailed);
        } else if let Some(cache) = &self.blacklist_cache {
            cache.set(&key, report.clone(), self.ttl);
        }
        Some(report)
    }
}
