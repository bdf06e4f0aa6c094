//! Hostname resolution.
//!
//! Lookups go through the [`HostResolver`] trait so subdomain enumeration and
//! blacklist checks can run against a fixed table in tests.

use std::collections::HashMap;
use std::net::IpAddr;

use futures::future::BoxFuture;
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;

/// Outcome of a forward lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The name has at least one A/AAAA record
    Resolved(IpAddr),
    /// Authoritative "no such name" or "no records"
    NotFound,
    /// Timeout, SERVFAIL, transport error
    Failed(String),
}

impl Resolution {
    /// The resolved address, if any.
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            Resolution::Resolved(ip) => Some(*ip),
            _ => None,
        }
    }
}

/// Forward DNS lookups.
pub trait HostResolver: Send + Sync {
    /// Resolves `host` to its first address.
    fn resolve<'a>(&'a self, host: &'a str) -> BoxFuture<'a, Resolution>;
}

impl HostResolver for TokioAsyncResolver {
    fn resolve<'a>(&'a self, host: &'a str) -> BoxFuture<'a, Resolution> {
        Box::pin(async move {
            // Trailing dot keeps the resolver from appending search domains
            let fqdn = if host.ends_with('.') {
                host.to_string()
            } else {
                format!("{}.", host)
            };
            match self.lookup_ip(fqdn.as_str()).await {
                Ok(response) => match response.iter().next() {
                    Some(ip) => Resolution::Resolved(ip),
                    None => Resolution::NotFound,
                },
                Err(e) => match e.kind() {
                    ResolveErrorKind::NoRecordsFound { .. } => Resolution::NotFound,
                    _ => Resolution::Failed(e.to_string()),
                },
            }
        })
    }
}

/// Fixed lookup table, for tests and offline runs.
///
/// Names not in the table resolve to [`Resolution::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    records: HashMap<String, Resolution>,
}

impl StaticResolver {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an A record.
    pub fn with_record(mut self, host: &str, ip: IpAddr) -> Self {
        self.records
            .insert(host.to_lowercase(), Resolution::Resolved(ip));
        self
    }

    /// Makes a name fail with a transport error.
    pub fn with_failure(mut self, host: &str, message: &str) -> Self {
        self.records
            .insert(host.to_lowercase(), Resolution::Failed(message.to_string()));
        self
    }
}

impl HostResolver for StaticResolver {
    fn resolve<'a>(&'a self, host: &'a str) -> BoxFuture<'a, Resolution> {
        let key = host.trim_end_matches('.').to_lowercase();
        let outcome = self
            .records
            .get(&key)
            .cloned()
            .unwrap_or(Resolution::NotFound);
        Box::pin(async move { outcome })
    }
}
