//! URL canonicalization and deduplication.
//!
//! Two different normalizations live here:
//! - [`canonicalize_url`] identifies the same *search result* across engines and
//!   queries (tracking parameters stripped, query sorted), except that any query
//!   carrying a malicious keyword is kept verbatim because it is evidence.
//! - [`normalize_node_url`] identifies the same *page* in the link graph
//!   (fragment and trailing slash removed, nothing else touched).

use std::collections::HashSet;

use log::warn;

use crate::keywords::KeywordSet;
use crate::search::SearchResult;

/// Maximum URL length accepted from untrusted sources.
pub const MAX_URL_LENGTH: usize = 2048;

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || key == "gclid" || key == "fbclid"
}

fn parse_web_url(url: &str) -> Option<url::Url> {
    let parsed = url::Url::parse(url).ok()?;
    matches!(parsed.scheme(), "http" | "https").then_some(parsed)
}

/// Canonicalizes a search-result URL.
///
/// Lowercases scheme and host (the `url` crate does this on parse), drops the
/// fragment, and removes trailing slashes from non-root paths. If any decoded
/// query key or value contains a malicious keyword the query string is kept
/// verbatim. Otherwise `utm_*`, `gclid` and `fbclid` are dropped and the
/// remaining pairs are sorted.
///
/// Unparseable or non-web URLs are returned trimmed, unchanged. The function is
/// idempotent.
pub fn canonicalize_url(url: &str, keywords: &KeywordSet) -> String {
    let trimmed = url.trim();
    let Some(mut parsed) = parse_web_url(trimmed) else {
        return trimmed.to_string();
    };

    parsed.set_fragment(None);

    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(if path.is_empty() { "/" } else { &path });

    if let Some(query) = parsed.query().map(str::to_string) {
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let has_evidence = pairs.iter().any(|(k, v)| {
            keywords.contains_any_in_url_text(k) || keywords.contains_any_in_url_text(v)
        });

        if !has_evidence {
            let mut kept: Vec<(String, String)> = pairs
                .into_iter()
                .filter(|(k, _)| !is_tracking_param(k))
                .collect();
            kept.sort();
            if kept.is_empty() {
                parsed.set_query(None);
            } else {
                let serialized = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(kept.iter())
                    .finish();
                parsed.set_query(Some(&serialized));
            }
        }
    }

    parsed.to_string()
}

/// Normalizes a URL into a link-graph node identity.
///
/// Strips the fragment and trailing slashes; the homepage becomes
/// `scheme://host` without a slash. Must be applied to every node and edge
/// endpoint or orphan detection breaks.
pub fn normalize_node_url(url: &str) -> String {
    let trimmed = url.trim();
    let Some(mut parsed) = parse_web_url(trimmed) else {
        return trimmed.trim_end_matches('/').to_string();
    };
    parsed.set_fragment(None);
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);

    let serialized = parsed.to_string();
    if parsed.query().is_none() {
        serialized.trim_end_matches('/').to_string()
    } else {
        serialized
    }
}

/// Validates a URL found in untrusted input (search results, sitemaps, links).
///
/// Returns `None` (with a warning for over-long input) unless the URL is
/// `http`/`https`, has a host, and fits [`MAX_URL_LENGTH`].
pub fn validate_web_url(url: &str) -> Option<url::Url> {
    if url.len() > MAX_URL_LENGTH {
        warn!(
            "Skipping URL exceeding maximum length ({} > {}): {}...",
            url.len(),
            MAX_URL_LENGTH,
            url.chars().take(50).collect::<String>()
        );
        return None;
    }
    let parsed = parse_web_url(url.trim())?;
    parsed.host_str()?;
    Some(parsed)
}

/// Deduplicates results by canonical URL.
///
/// Keeps exactly one entry per canonical URL, the first one seen (with its title,
/// snippet and source), and rewrites its `url` to the canonical form.
pub fn deduplicate_results(results: Vec<SearchResult>, keywords: &KeywordSet) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(results.len());
    for mut result in results {
        let canonical = canonicalize_url(&result.url, keywords);
        if seen.insert(canonical.clone()) {
            result.url = canonical;
            unique.push(result);
        }
    }
    unique
}
