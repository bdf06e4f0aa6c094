//! Tiered content verification.
//!
//! Compares what a search engine cached for a page against what the live site
//! serves. The quick tier fetches the page over plain HTTP as three different
//! user agents; the deep tier renders it in a headless browser and also
//! analyzes JavaScript behavior. The deep tier runs only when the quick tier is
//! ambiguous:
//! - the cache snippet has keywords but no live variant does (possible cloaking)
//! - successful variants serve different text (user-agent cloaking)
//!
//! Failures never propagate: a page that cannot be fetched or rendered degrades
//! to `cache_only` or `clean` with the error recorded on the result.

mod browser;
mod js_analysis;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub use browser::{
    BrowserLauncher, BrowserSession, ChromeLauncher, ChromeSession, RenderedPage, ScopedSession,
};
pub use js_analysis::{
    analyze_js, analyze_script, shannon_entropy, whitespace_ratio, JsAnalysis, KeywordResponse,
    NetworkRequest, ScriptFinding, SAFE_CDN_DOMAINS,
};

use crate::cache::{content_hash, ResponseCache};
use crate::config::Tuning;
use crate::crawl::PageFetcher;
use crate::detection::{extract_visible_text, IllegalContentDetector, IllegalContentReport};
use crate::domain::hostname_of;
use crate::error_handling::{ErrorType, ScanStats};
use crate::keywords::KeywordSet;
use crate::user_agent::UserAgentKind;
use crate::utils::{collapse_whitespace, sanitize_and_truncate_error_message};

/// Outcome of verifying one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// The live page serves malicious keywords
    LiveMalicious,
    /// Only the search-engine cache has them (cloaking or already cleaned)
    CacheOnly,
    Clean,
}

/// Live evidence dominates: `live` ⇒ LiveMalicious, else `cache` ⇒ CacheOnly.
pub fn determine_status(live_has_keywords: bool, cache_has_keywords: bool) -> VerificationStatus {
    if live_has_keywords {
        VerificationStatus::LiveMalicious
    } else if cache_has_keywords {
        VerificationStatus::CacheOnly
    } else {
        VerificationStatus::Clean
    }
}

/// Tier that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    Quick,
    Deep,
}

/// Verification of one URL within one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub url: String,
    pub is_accessible: bool,
    pub live_has_keywords: bool,
    pub cache_has_keywords: bool,
    pub verification_status: VerificationStatus,
    pub keywords_found_live: Vec<String>,
    pub keywords_found_cache: Vec<String>,
    pub js_analysis: Option<JsAnalysis>,
    pub illegal_content: Option<IllegalContentReport>,
    pub error: Option<String>,
    pub method: VerificationMethod,
}

impl VerificationResult {
    fn degraded(url: &str, cache_keywords: Vec<String>, method: VerificationMethod, error: String) -> Self {
        let cache_has_keywords = !cache_keywords.is_empty();
        Self {
            url: url.to_string(),
            is_accessible: false,
            live_has_keywords: false,
            cache_has_keywords,
            verification_status: determine_status(false, cache_has_keywords),
            keywords_found_live: Vec::new(),
            keywords_found_cache: cache_keywords,
            js_analysis: None,
            illegal_content: None,
            error: Some(sanitize_and_truncate_error_message(&error)),
            method,
        }
    }
}

/// One user-agent variant of the quick check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantFetch {
    pub agent: UserAgentKind,
    pub status: Option<u16>,
    /// SHA-256 of the whitespace-normalized visible text
    pub text_hash: Option<String>,
    pub keywords: Vec<String>,
    pub error: Option<String>,
}

/// Outcome of the quick tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickCheck {
    pub result: VerificationResult,
    pub need_escalation: bool,
    /// Successful variants served different text
    pub divergent: bool,
    pub variants: Vec<VariantFetch>,
}

impl QuickCheck {
    pub fn status(&self) -> VerificationStatus {
        self.result.verification_status
    }
}

/// Verifies candidate pages against the live site.
pub struct ContentVerifier {
    fetcher: PageFetcher,
    keywords: Arc<KeywordSet>,
    tuning: Tuning,
    stats: Arc<ScanStats>,
    detector: Option<Arc<IllegalContentDetector>>,
    analysis_cache: Option<Arc<dyn ResponseCache<IllegalContentReport>>>,
    analysis_ttl: Duration,
}

impl ContentVerifier {
    /// Creates a verifier without illegal-content detection.
    pub fn new(fetcher: PageFetcher, keywords: Arc<KeywordSet>, tuning: Tuning, stats: Arc<ScanStats>) -> Self {
        Self {
            fetcher,
            keywords,
            tuning,
            stats,
            detector: None,
            analysis_cache: None,
            analysis_ttl: Duration::ZERO,
        }
    }

    /// Runs `detector` on every fetched or rendered page. Reports are cached
    /// by content hash when `cache` is given.
    pub fn with_detector(
        mut self,
        detector: Arc<IllegalContentDetector>,
        cache: Option<Arc<dyn ResponseCache<IllegalContentReport>>>,
        ttl: Duration,
    ) -> Self {
        self.detector = Some(detector);
        self.analysis_cache = cache;
        self.analysis_ttl = ttl;
        self
    }

    fn illegal_content(&self, html: &str, url: &str) -> Option<IllegalContentReport> {
        let detector = self.detector.as_ref()?;
        let key = content_hash(html.as_bytes());
        if let Some(cached) = self.analysis_cache.as_ref().and_then(|c| c.get(&key)) {
            return Some(IllegalContentReport {
                url: url.to_string(),
                ..cached
            });
        }
        let report = detector.detect_illegal_content(html, url);
        if let Some(cache) = &self.analysis_cache {
            cache.set(&key, report.clone(), self.analysis_ttl);
        }
        Some(report)
    }

    /// Quick tier: plain HTTP as every [`UserAgentKind`].
    pub async fn quick_verify(&self, url: &str, cache_snippet: &str) -> QuickCheck {
        let keywords_found_cache = self.keywords.find_in(cache_snippet);
        let cache_has_keywords = !keywords_found_cache.is_empty();

        let agents: Vec<(UserAgentKind, String)> = UserAgentKind::ALL
            .iter()
            .map(|kind| (*kind, kind.header_value()))
            .collect();
        let fetches = join_all(agents.iter().map(|(_, ua)| self.fetcher.fetch_as(url, ua))).await;

        let mut variants = Vec::with_capacity(fetches.len());
        let mut live_keywords: BTreeSet<String> = BTreeSet::new();
        let mut first_body: Option<String> = None;
        for ((agent, _), fetch) in agents.into_iter().zip(fetches) {
            match fetch {
                Ok(page) => {
                    let found = self.keywords.find_in(&page.body);
                    live_keywords.extend(found.iter().cloned());
                    let text = collapse_whitespace(&extract_visible_text(&page.body));
                    variants.push(VariantFetch {
                        agent,
                        status: Some(page.status),
                        text_hash: Some(content_hash(text.as_bytes())),
                        keywords: found,
                        error: None,
                    });
                    first_body.get_or_insert(page.body);
                }
                Err(e) => variants.push(VariantFetch {
                    agent,
                    status: None,
                    text_hash: None,
                    keywords: Vec::new(),
                    error: Some(sanitize_and_truncate_error_message(&format!("{:#}", e))),
                }),
            }
        }

        let hashes: BTreeSet<&str> = variants.iter().filter_map(|v| v.text_hash.as_deref()).collect();
        let successes = variants.iter().filter(|v| v.text_hash.is_some()).count();
        let divergent = successes >= 2 && hashes.len() > 1;

        let result = match first_body {
            Some(body) => {
                let live_has_keywords = !live_keywords.is_empty();
                VerificationResult {
                    url: url.to_string(),
                    is_accessible: true,
                    live_has_keywords,
                    cache_has_keywords,
                    verification_status: determine_status(live_has_keywords, cache_has_keywords),
                    keywords_found_live: live_keywords.into_iter().collect(),
                    keywords_found_cache,
                    js_analysis: None,
                    illegal_content: self.illegal_content(&body, url),
                    error: None,
                    method: VerificationMethod::Quick,
                }
            }
            None => {
                self.stats.increment(ErrorType::VerificationFetchFailed);
                let error = variants
                    .iter()
                    .find_map(|v| v.error.clone())
                    .unwrap_or_else(|| "page could not be fetched".to_string());
                debug!("Quick check of {} failed for every user agent: {}", url, error);
                VerificationResult::degraded(url, keywords_found_cache, VerificationMethod::Quick, error)
            }
        };

        let need_escalation = (!result.live_has_keywords && result.cache_has_keywords) || divergent;
        QuickCheck {
            result,
            need_escalation,
            divergent,
            variants,
        }
    }

    /// Deep tier: full render plus JavaScript behavior analysis.
    pub async fn deep_verify(
        &self,
        url: &str,
        cache_snippet: &str,
        session: &mut dyn BrowserSession,
    ) -> VerificationResult {
        let keywords_found_cache = self.keywords.find_in(cache_snippet);
        let page = match session.render(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Rendering {} failed: {:#}", url, e);
                self.stats.increment(ErrorType::BrowserRenderFailed);
                return VerificationResult::degraded(
                    url,
                    keywords_found_cache,
                    VerificationMethod::Deep,
                    format!("{:#}", e),
                );
            }
        };

        let keywords_found_live = self.keywords.find_in(&page.html);
        let live_has_keywords = !keywords_found_live.is_empty();
        let cache_has_keywords = !keywords_found_cache.is_empty();
        let target_host = hostname_of(url).unwrap_or_default();
        let js = analyze_js(&page.html, &target_host, &page.requests, &self.keywords, &self.tuning);

        VerificationResult {
            url: url.to_string(),
            is_accessible: true,
            live_has_keywords,
            cache_has_keywords,
            verification_status: determine_status(live_has_keywords, cache_has_keywords),
            keywords_found_live,
            keywords_found_cache,
            js_analysis: Some(js),
            illegal_content: self.illegal_content(&page.html, url),
            error: None,
            method: VerificationMethod::Deep,
        }
    }

    /// Runs the tier state machine for one URL.
    ///
    /// With `tiered`, the quick check runs first and the browser only when it
    /// asks for escalation. Without it, the browser is used directly when a
    /// session exists. A failed render keeps the quick result.
    pub async fn verify(
        &self,
        url: &str,
        cache_snippet: &str,
        session: Option<&mut dyn BrowserSession>,
        tiered: bool,
    ) -> VerificationResult {
        if !tiered {
            if let Some(session) = session {
                return self.deep_verify(url, cache_snippet, session).await;
            }
            return self.quick_verify(url, cache_snippet).await.result;
        }

        let quick = self.quick_verify(url, cache_snippet).await;
        if !quick.need_escalation {
            return quick.result;
        }
        let Some(session) = session else {
            debug!("{} needs escalation but no browser is available", url);
            return quick.result;
        };
        debug!(
            "Escalating {} to the browser (divergent: {}, cache-only: {})",
            url,
            quick.divergent,
            !quick.result.live_has_keywords && quick.result.cache_has_keywords
        );
        let mut deep = self.deep_verify(url, cache_snippet, session).await;
        if deep.error.is_some() && quick.result.is_accessible {
            return VerificationResult {
                error: deep.error,
                ..quick.result
            };
        }
        if quick.result.live_has_keywords && !deep.live_has_keywords {
            // Served to some user agents only; the browser saw the clean variant
            deep.live_has_keywords = true;
            deep.keywords_found_live = quick.result.keywords_found_live;
            deep.verification_status = determine_status(true, deep.cache_has_keywords);
        }
        deep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordering() {
        assert_eq!(determine_status(true, true), VerificationStatus::LiveMalicious);
        assert_eq!(determine_status(true, false), VerificationStatus::LiveMalicious);
        assert_eq!(determine_status(false, true), VerificationStatus::CacheOnly);
        assert_eq!(determine_status(false, false), VerificationStatus::Clean);
    }

    #[test]
    fn test_degraded_result() {
        let r = VerificationResult::degraded(
            "https://example.go.id/a",
            vec!["slot gacor".into()],
            VerificationMethod::Quick,
            "connection\nrefused".into(),
        );
        assert_eq!(r.verification_status, VerificationStatus::CacheOnly);
        assert!(!r.is_accessible);
        assert!(r.error.is_some());

        let clean = VerificationResult::degraded("u", Vec::new(), VerificationMethod::Deep, "x".into());
        assert_eq!(clean.verification_status, VerificationStatus::Clean);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&VerificationStatus::LiveMalicious).unwrap(),
            "\"live_malicious\""
        );
        assert_eq!(
            serde_json::to_string(&VerificationStatus::CacheOnly).unwrap(),
            "\"cache_only\""
        );
    }
}
