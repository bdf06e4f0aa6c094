//! Response caching.
//!
//! Search, domain-intelligence and deep-analysis results are cached behind the
//! [`ResponseCache`] interface so their lifetime is explicit and injectable.
//! [`MemoryCache`] is the bounded, TTL-evicting in-process implementation.
//!
//! A stale or missing entry only costs an extra network call; nothing depends on
//! cache consistency for correctness.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::sync::Cache;
use sha2::{Digest, Sha256};

use crate::config::DEFAULT_CACHE_CAPACITY;
use crate::detection::IllegalContentReport;
use crate::intel::{BlacklistReport, WhoisInfo};
use crate::search::SearchResult;

/// Upper bound on any entry's lifetime, whatever TTL the caller asks for.
const MAX_ENTRY_LIFETIME: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Key/value cache with per-entry TTL.
///
/// `get` and `set` are atomic per key and safe to call from concurrent scans.
pub trait ResponseCache<V>: Send + Sync {
    /// Returns the value if present and not expired.
    fn get(&self, key: &str) -> Option<V>;
    /// Stores a value that expires after `ttl`.
    fn set(&self, key: &str, value: V, ttl: Duration);
}

#[derive(Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Bounded in-memory cache (moka, size-based eviction) with per-entry TTL.
pub struct MemoryCache<V> {
    inner: Cache<String, Entry<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone + Send + Sync + 'static> MemoryCache<V> {
    /// Creates a cache holding at most `max_capacity` entries.
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(MAX_ENTRY_LIFETIME)
            .build();
        Self {
            inner,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

impl<V: Clone + Send + Sync + 'static> ResponseCache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        match self.inner.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value)
            }
            Some(_) => {
                self.inner.invalidate(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn set(&self, key: &str, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl.min(MAX_ENTRY_LIFETIME);
        self.inner
            .insert(key.to_string(), Entry { value, expires_at });
    }
}

/// Builds a cache key: hex SHA-256 of `"{namespace}:{normalized query}"`.
///
/// The query is lowercased and whitespace-collapsed so trivially different
/// spellings of the same query share an entry.
pub fn cache_key(namespace: &str, query: &str) -> String {
    let normalized = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

/// SHA-256 of raw bytes, hex-encoded.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// The process-wide caches shared by every scan.
#[derive(Clone)]
pub struct ScanCaches {
    /// Search responses keyed by engine + query
    pub search: Arc<dyn ResponseCache<Vec<SearchResult>>>,
    /// RDAP lookups keyed by domain
    pub whois: Arc<dyn ResponseCache<WhoisInfo>>,
    /// DNSBL lookups keyed by domain
    pub blacklist: Arc<dyn ResponseCache<BlacklistReport>>,
    /// Detector reports keyed by HTML hash
    pub analysis: Arc<dyn ResponseCache<IllegalContentReport>>,
}

impl ScanCaches {
    /// In-memory caches of `capacity` entries each.
    pub fn in_memory(capacity: u64) -> Self {
        Self {
            search: Arc::new(MemoryCache::new(capacity)),
            whois: Arc::new(MemoryCache::new(capacity)),
            blacklist: Arc::new(MemoryCache::new(capacity)),
            analysis: Arc::new(MemoryCache::new(capacity)),
        }
    }
}

impl Default for ScanCaches {
    fn default() -> Self {
        Self::in_memory(DEFAULT_CACHE_CAPACITY)
    }
}
