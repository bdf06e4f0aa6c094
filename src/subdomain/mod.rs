//! Subdomain enumeration.
//!
//! Three techniques feed one name set:
//! - DNS brute-force over [`SUBDOMAIN_WORDLIST`] (optional)
//! - `site:` search-engine discovery (optional)
//! - Certificate Transparency via crt.sh (always on)
//!
//! Every discovered name is then resolved; names that do not resolve stay in
//! the report as inactive.

mod ct;
mod wordlist;

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

pub use ct::{lookup_ct_subdomains, parse_ct_names};
pub use wordlist::SUBDOMAIN_WORDLIST;

use crate::config::SUBDOMAIN_DNS_CONCURRENCY;
use crate::dns::{HostResolver, Resolution};
use crate::domain::{hostname_of, is_subdomain_of};
use crate::error_handling::{ErrorType, ScanStats};
use crate::search::{subdomain_query, ApiKeys, ResultSource, SearchAggregator, SearchResult};

/// Resolution status of a subdomain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubdomainStatus {
    Active,
    Inactive,
    Unknown,
}

/// Technique that discovered a subdomain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    Dns,
    Search,
    CertificateTransparency,
}

/// One discovered subdomain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubdomainRecord {
    pub subdomain: String,
    pub ip: Option<String>,
    pub status: SubdomainStatus,
    /// Technique that found it first
    pub discovery_method: DiscoveryMethod,
}

/// Enumeration output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubdomainReport {
    pub total_subdomains: usize,
    /// Sorted by name
    pub subdomains: Vec<SubdomainRecord>,
    /// Techniques that contributed at least one name
    pub techniques_used: Vec<DiscoveryMethod>,
    /// Subdomain homepages with keyword hits (content scan)
    #[serde(default)]
    pub content_hits: Vec<SearchResult>,
}

impl SubdomainReport {
    /// Active subdomain names, in order.
    pub fn active(&self) -> impl Iterator<Item = &str> {
        self.subdomains
            .iter()
            .filter(|r| r.status == SubdomainStatus::Active)
            .map(|r| r.subdomain.as_str())
    }
}

/// Accumulates records keyed by name.
///
/// A name seen again keeps its first discovery method but gains an IP if the
/// later technique knows one.
#[derive(Debug, Default)]
pub struct SubdomainSet {
    records: BTreeMap<String, SubdomainRecord>,
    techniques: Vec<DiscoveryMethod>,
}

impl SubdomainSet {
    /// Merges one discovered name.
    pub fn add(&mut self, name: &str, method: DiscoveryMethod, ip: Option<String>) {
        let name = name.trim().trim_end_matches('.').to_lowercase();
        if name.is_empty() {
            return;
        }
        if !self.techniques.contains(&method) {
            self.techniques.push(method);
        }
        match self.records.get_mut(&name) {
            Some(existing) => {
                if existing.ip.is_none() && ip.is_some() {
                    existing.ip = ip;
                    existing.status = SubdomainStatus::Active;
                }
            }
            None => {
                let status = if ip.is_some() {
                    SubdomainStatus::Active
                } else {
                    SubdomainStatus::Unknown
                };
                self.records.insert(
                    name.clone(),
                    SubdomainRecord {
                        subdomain: name,
                        ip,
                        status,
                        discovery_method: method,
                    },
                );
            }
        }
    }

    /// Names with no address yet.
    pub fn unresolved(&self) -> Vec<String> {
        self.records
            .values()
            .filter(|r| r.ip.is_none())
            .map(|r| r.subdomain.clone())
            .collect()
    }

    /// Applies a resolution outcome to a name.
    pub fn apply_resolution(&mut self, name: &str, resolution: &Resolution) {
        if let Some(record) = self.records.get_mut(name) {
            match resolution {
                Resolution::Resolved(ip) => {
                    record.ip = Some(ip.to_string());
                    record.status = SubdomainStatus::Active;
                }
                Resolution::NotFound => record.status = SubdomainStatus::Inactive,
                Resolution::Failed(_) => record.status = SubdomainStatus::Unknown,
            }
        }
    }

    /// Finishes into a report.
    pub fn into_report(self) -> SubdomainReport {
        let mut techniques = self.techniques;
        techniques.sort();
        let subdomains: Vec<SubdomainRecord> = self.records.into_values().collect();
        SubdomainReport {
            total_subdomains: subdomains.len(),
            subdomains,
            techniques_used: techniques,
            content_hits: Vec::new(),
        }
    }
}

/// Extracts subdomains of `domain` from search result URLs.
pub fn subdomains_from_results(results: &[SearchResult], domain: &str) -> Vec<String> {
    results
        .iter()
        .filter_map(|r| hostname_of(&r.url))
        .filter(|h| is_subdomain_of(h, domain))
        .collect()
}

/// Enumerates subdomains of one domain.
pub struct SubdomainEnumerator {
    resolver: Arc<dyn HostResolver>,
    client: Arc<reqwest::Client>,
    crtsh_url: String,
    stats: Arc<ScanStats>,
}

impl SubdomainEnumerator {
    /// Creates an enumerator.
    pub fn new(
        resolver: Arc<dyn HostResolver>,
        client: Arc<reqwest::Client>,
        crtsh_url: &str,
        stats: Arc<ScanStats>,
    ) -> Self {
        Self {
            resolver,
            client,
            crtsh_url: crtsh_url.to_string(),
            stats,
        }
    }

    /// Runs the enabled techniques and the resolution post-pass.
    ///
    /// `search` is `Some` when search-based discovery is enabled.
    pub async fn enumerate(
        &self,
        domain: &str,
        use_dns: bool,
        search: Option<(&SearchAggregator, &ApiKeys)>,
    ) -> SubdomainReport {
        let mut set = SubdomainSet::default();

        if use_dns {
            for (name, ip) in self.dns_bruteforce(domain).await {
                set.add(&name, DiscoveryMethod::Dns, Some(ip));
            }
        }

        if let Some((aggregator, keys)) = search {
            if keys.is_configured() {
                let results = aggregator
                    .run_query(ResultSource::Google, &subdomain_query(domain), keys)
                    .await
                    .unwrap_or_default();
                for name in subdomains_from_results(&results, domain) {
                    set.add(&name, DiscoveryMethod::Search, None);
                }
            }
        }

        match lookup_ct_subdomains(&self.client, &self.crtsh_url, domain).await {
            Ok(names) => {
                debug!("crt.sh listed {} name(s) for {}", names.len(), domain);
                for name in names {
                    set.add(&name, DiscoveryMethod::CertificateTransparency, None);
                }
            }
            Err(e) => {
                warn!("Certificate Transparency lookup for {} failed: {:#}", domain, e);
                self.stats.increment(ErrorType::CertificateTransparencyError);
            }
        }

        let pending = set.unresolved();
        let resolutions: Vec<(String, Resolution)> = stream::iter(pending)
            .map(|name| async move {
                let resolution = self.resolver.resolve(&name).await;
                (name, resolution)
            })
            .buffer_unordered(SUBDOMAIN_DNS_CONCURRENCY)
            .collect()
            .await;
        for (name, resolution) in &resolutions {
            if let Resolution::Failed(e) = resolution {
                debug!("Resolving {} failed: {}", name, e);
                self.stats.increment(ErrorType::SubdomainDnsError);
            }
            set.apply_resolution(name, resolution);
        }

        let report = set.into_report();
        info!(
            "Found {} subdomain(s) of {} ({} active)",
            report.total_subdomains,
            domain,
            report.active().count()
        );
        report
    }

    /// Resolves every wordlist prefix; only resolving names are returned.
    async fn dns_bruteforce(&self, domain: &str) -> Vec<(String, String)> {
        stream::iter(SUBDOMAIN_WORDLIST.iter())
            .map(|prefix| async move {
                let name = format!("{}.{}", prefix, domain);
                let resolution = self.resolver.resolve(&name).await;
                resolution.ip().map(|ip| (name, ip.to_string()))
            })
            .buffer_unordered(SUBDOMAIN_DNS_CONCURRENCY)
            .filter_map(|found| async move { found })
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_subdomain_set_merges_by_name() {
        let mut set = SubdomainSet::default();
        set.add("Mail.example.go.id", DiscoveryMethod::CertificateTransparency, None);
        set.add("mail.example.go.id.", DiscoveryMethod::Dns, Some("10.0.0.1".into()));
        set.add("blog.example.go.id", DiscoveryMethod::Search, None);
        let report = set.into_report();
        assert_eq!(report.total_subdomains, 2);
        let mail = report
            .subdomains
            .iter()
            .find(|r| r.subdomain == "mail.example.go.id")
            .unwrap();
        // Updated, not replaced
        assert_eq!(mail.discovery_method, DiscoveryMethod::CertificateTransparency);
        assert_eq!(mail.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(mail.status, SubdomainStatus::Active);
        assert_eq!(
            report.techniques_used,
            vec![
                DiscoveryMethod::Dns,
                DiscoveryMethod::Search,
                DiscoveryMethod::CertificateTransparency
            ]
        );
    }

    #[test]
    fn test_apply_resolution_marks_status() {
        let mut set = SubdomainSet::default();
        set.add("a.example.go.id", DiscoveryMethod::CertificateTransparency, None);
        set.add("b.example.go.id", DiscoveryMethod::CertificateTransparency, None);
        set.add("c.example.go.id", DiscoveryMethod::CertificateTransparency, None);
        set.apply_resolution(
            "a.example.go.id",
            &Resolution::Resolved(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))),
        );
        set.apply_resolution("b.example.go.id", &Resolution::NotFound);
        set.apply_resolution("c.example.go.id", &Resolution::Failed("timeout".into()));
        let report = set.into_report();
        let statuses: Vec<SubdomainStatus> = report.subdomains.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                SubdomainStatus::Active,
                SubdomainStatus::Inactive,
                SubdomainStatus::Unknown
            ]
        );
        // Inactive names stay listed
        assert_eq!(report.total_subdomains, 3);
    }

    #[test]
    fn test_subdomains_from_results() {
        let results = vec![
            SearchResult::new("https://blog.example.go.id/x", "", "", ResultSource::Google),
            SearchResult::new("https://example.go.id/y", "", "", ResultSource::Google),
            SearchResult::new("https://evil.example/z", "", "", ResultSource::Google),
            SearchResult::new("http://dev.example.go.id:8080/", "", "", ResultSource::Google),
        ];
        assert_eq!(
            subdomains_from_results(&results, "example.go.id"),
            vec!["blog.example.go.id".to_string(), "dev.example.go.id".to_string()]
        );
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SubdomainStatus::Inactive).unwrap(),
            "\"inactive\""
        );
        assert_eq!(
            serde_json::to_string(&DiscoveryMethod::CertificateTransparency).unwrap(),
            "\"certificate_transparency\""
        );
    }
}
