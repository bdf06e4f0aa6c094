//! JavaScript behavior analysis of a rendered page.
//!
//! Inline scripts are scored for obfuscation (entropy, dangerous calls,
//! minification) and the network requests made during rendering are checked
//! for third-party destinations and keyword-bearing responses.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::config::{Tuning, MIN_SCRIPT_LENGTH_FOR_ENTROPY};
use crate::detection::dangerous_script_patterns;
use crate::domain::{hostname_of, is_subdomain_of, same_site};
use crate::keywords::KeywordSet;
use crate::utils::{parse_selector, select_all};

/// CDNs whose requests are not treated as external.
pub const SAFE_CDN_DOMAINS: &[&str] = &[
    "cloudflare.com",
    "jsdelivr.net",
    "unpkg.com",
    "googleapis.com",
    "gstatic.com",
    "jquery.com",
    "bootstrapcdn.com",
    "fontawesome.com",
    "cloudfront.net",
    "akamaihd.net",
];

static INLINE_SCRIPT: LazyLock<Option<scraper::Selector>> =
    LazyLock::new(|| parse_selector("script:not([src])", "inline scripts"));

static TRACKING_URL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)(beacon|track|pixel|collect|analytics|counter|/stats?[/?]|/log[/?]|/hit[/?]|[?&](uid|cid|sid|ref)=)")
        .map_err(|e| log::error!("Invalid tracking URL pattern: {}", e))
        .ok()
});

/// A network request observed while rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkRequest {
    pub url: String,
    pub status: Option<u16>,
    pub mime_type: Option<String>,
    /// Response body, when it was textual and small enough to keep
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Scores for one inline script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptFinding {
    /// Position among the page's inline scripts
    pub index: usize,
    pub length: usize,
    pub entropy: f64,
    pub whitespace_ratio: f64,
    pub high_entropy: bool,
    pub minified: bool,
    pub dangerous_patterns: Vec<String>,
    pub obfuscated: bool,
}

/// A response body that contained malicious keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordResponse {
    pub url: String,
    pub keywords: Vec<String>,
}

/// Outcome of JavaScript behavior analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsAnalysis {
    pub scripts_analyzed: usize,
    /// Scripts with at least one signal
    pub suspicious_scripts: Vec<ScriptFinding>,
    pub obfuscated_scripts: usize,
    pub total_requests: usize,
    /// Requests outside the target and the safe CDNs
    pub external_requests: Vec<String>,
    /// External requests that look like tracking beacons
    pub tracking_requests: Vec<String>,
    pub keyword_responses: Vec<KeywordResponse>,
}

impl JsAnalysis {
    /// Whether anything was flagged.
    pub fn is_suspicious(&self) -> bool {
        self.obfuscated_scripts > 0 || !self.tracking_requests.is_empty() || !self.keyword_responses.is_empty()
    }
}

/// Shannon entropy in bits per character.
pub fn shannon_entropy(text: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for c in text.chars() {
        *counts.entry(c).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Fraction of characters that are whitespace.
pub fn whitespace_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    text.chars().filter(|c| c.is_whitespace()).count() as f64 / total as f64
}

/// Scores one inline script. Entropy and minification only count for scripts
/// of at least [`MIN_SCRIPT_LENGTH_FOR_ENTROPY`] characters.
pub fn analyze_script(index: usize, script: &str, tuning: &Tuning) -> ScriptFinding {
    let length = script.chars().count();
    let entropy = shannon_entropy(script);
    let ratio = whitespace_ratio(script);
    let long_enough = length >= MIN_SCRIPT_LENGTH_FOR_ENTROPY;
    let high_entropy = long_enough && entropy > tuning.entropy_threshold;
    let minified = long_enough && ratio < tuning.min_whitespace_ratio;
    let dangerous_patterns = dangerous_script_patterns(script);
    let obfuscated = !dangerous_patterns.is_empty() || (high_entropy && minified);
    ScriptFinding {
        index,
        length,
        entropy,
        whitespace_ratio: ratio,
        high_entropy,
        minified,
        dangerous_patterns,
        obfuscated,
    }
}

fn is_safe_cdn(host: &str) -> bool {
    SAFE_CDN_DOMAINS
        .iter()
        .any(|cdn| host == *cdn || is_subdomain_of(host, cdn))
}

fn inline_scripts(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    select_all(&document, &INLINE_SCRIPT)
        .into_iter()
        .map(|el| el.text().collect::<String>())
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Analyzes a rendered page's inline scripts and network activity.
pub fn analyze_js(
    html: &str,
    target_host: &str,
    requests: &[NetworkRequest],
    keywords: &KeywordSet,
    tuning: &Tuning,
) -> JsAnalysis {
    let scripts = inline_scripts(html);
    let findings: Vec<ScriptFinding> = scripts
        .iter()
        .enumerate()
        .map(|(i, s)| analyze_script(i, s, tuning))
        .collect();
    let obfuscated_scripts = findings.iter().filter(|f| f.obfuscated).count();
    let suspicious_scripts: Vec<ScriptFinding> = findings
        .into_iter()
        .filter(|f| f.obfuscated || f.high_entropy || f.minified)
        .collect();

    let mut external_requests = Vec::new();
    let mut tracking_requests = Vec::new();
    let mut keyword_responses = Vec::new();
    for request in requests {
        if let Some(host) = hostname_of(&request.url) {
            if !same_site(&host, target_host) && !is_safe_cdn(&host) {
                external_requests.push(request.url.clone());
                if TRACKING_URL.as_ref().is_some_and(|re| re.is_match(&request.url)) {
                    tracking_requests.push(request.url.clone());
                }
            }
        }
        if let Some(body) = &request.body {
            let found = keywords.find_in(body);
            if !found.is_empty() {
                keyword_responses.push(KeywordResponse {
                    url: request.url.clone(),
                    keywords: found,
                });
            }
        }
    }

    JsAnalysis {
        scripts_analyzed: scripts.len(),
        suspicious_scripts,
        obfuscated_scripts,
        total_requests: requests.len(),
        external_requests,
        tracking_requests,
        keyword_responses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> NetworkRequest {
        NetworkRequest {
            url: url.to_string(),
            status: Some(200),
            ..Default::default()
        }
    }

    #[test]
    fn test_shannon_entropy() {
        assert_eq!(shannon_entropy(""), 0.0);
        assert_eq!(shannon_entropy("aaaa"), 0.0);
        assert!((shannon_entropy("abab") - 1.0).abs() < 1e-9);
        assert!((shannon_entropy("abcd") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_whitespace_ratio() {
        assert_eq!(whitespace_ratio(""), 0.0);
        assert!((whitespace_ratio("a b ") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_short_scripts_skip_entropy_signals() {
        let finding = analyze_script(0, "x=1;y=2;", &Tuning::default());
        assert!(!finding.high_entropy);
        assert!(!finding.minified);
        assert!(!finding.obfuscated);
    }

    #[test]
    fn test_packed_script_is_obfuscated() {
        let packed: String = (0..400)
            .map(|i| char::from(b'!' + ((i * 37 + i / 7) % 90) as u8))
            .collect();
        let finding = analyze_script(0, &packed, &Tuning::default());
        assert!(finding.high_entropy);
        assert!(finding.minified);
        assert!(finding.obfuscated);
    }

    #[test]
    fn test_dangerous_call_is_obfuscated_even_when_short() {
        let finding = analyze_script(3, "eval(atob('c2xvdA=='))", &Tuning::default());
        assert!(finding.obfuscated);
        assert_eq!(finding.index, 3);
        assert!(finding.dangerous_patterns.contains(&"eval".to_string()));
    }

    #[test]
    fn test_requests_are_classified() {
        let keywords = KeywordSet::hardcoded();
        let mut spam = request("https://cdn.evil-slot.example/payload.js");
        spam.body = Some("document.write('SLOT GACOR maxwin')".to_string());
        let requests = vec![
            request("https://example.go.id/style.css"),
            request("https://static.example.go.id/app.js"),
            request("https://cdn.jsdelivr.net/npm/jquery.js"),
            request("https://stats.tracker.example/collect?uid=1"),
            spam,
        ];
        let analysis = analyze_js("<p>x</p>", "example.go.id", &requests, &keywords, &Tuning::default());
        assert_eq!(analysis.total_requests, 5);
        assert_eq!(
            analysis.external_requests,
            vec![
                "https://stats.tracker.example/collect?uid=1".to_string(),
                "https://cdn.evil-slot.example/payload.js".to_string()
            ]
        );
        assert_eq!(
            analysis.tracking_requests,
            vec!["https://stats.tracker.example/collect?uid=1".to_string()]
        );
        assert_eq!(analysis.keyword_responses.len(), 1);
        assert!(analysis.is_suspicious());
    }

    #[test]
    fn test_ipv6_request_hosts_keep_their_address() {
        let requests = vec![
            request("http://[::1]:8080/app.js"),
            request("http://[2001:db8::7]/collect"),
        ];
        let analysis = analyze_js("<p>x</p>", "[::1]", &requests, &KeywordSet::hardcoded(), &Tuning::default());
        assert_eq!(analysis.external_requests, vec!["http://[2001:db8::7]/collect".to_string()]);
    }

    #[test]
    fn test_clean_page() {
        let html = "<html><head><script src=\"/app.js\"></script><script>var x = 1;</script></head></html>";
        let analysis = analyze_js(html, "example.go.id", &[], &KeywordSet::hardcoded(), &Tuning::default());
        assert_eq!(analysis.scripts_analyzed, 1);
        assert!(analysis.suspicious_scripts.is_empty());
        assert!(!analysis.is_suspicious());
    }
}
