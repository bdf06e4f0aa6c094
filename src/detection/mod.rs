//! Heuristic illegal-content detection.
//!
//! [`IllegalContentDetector`] scores raw HTML in five passes (visible text,
//! concealed elements, HTML comments, meta tags, hidden attributes) plus an
//! injection-pattern scan. It performs no I/O.

mod document;
mod injection;
mod structure;
mod taxonomy;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use document::{comment_text, extract_visible_text, hiding_style, HiddenBlock, PageDocument};
pub use injection::{dangerous_script_patterns, find_injections, InjectionFinding};
pub use structure::{analyze_structure, PageStructure};
pub use taxonomy::{total_matches, Taxonomy, TaxonomyCategory};

use crate::config::{ScanConfig, Tuning};
use crate::keywords::KeywordSet;
use crate::utils::truncate_chars;

const SAMPLE_CHARS: usize = 200;

/// Keyword matches and confidence of one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassResult {
    /// category code → distinct matched keywords
    pub matches: BTreeMap<String, Vec<String>>,
    /// 0.0-1.0, before weighting
    pub confidence: f64,
}

/// Summary of concealed content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HiddenContentSummary {
    /// Number of outermost concealed elements with text
    pub element_count: usize,
    /// Distinct concealment techniques seen
    pub techniques: Vec<String>,
    /// Categories matched inside concealed elements
    pub categories: Vec<String>,
    /// Leading text of the concealed content
    pub sample: String,
}

/// One element that contributed to the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousElement {
    /// `hidden_element`, `html_comment`, `meta_tag`, `hidden_attribute`, `injection`
    pub kind: String,
    /// Category or pattern name
    pub label: String,
    /// Text excerpt
    pub excerpt: String,
}

/// Per-pass breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionDetails {
    pub visible_text: PassResult,
    pub hidden_content: PassResult,
    pub html_comments: PassResult,
    pub meta_tags: PassResult,
    pub hidden_attributes: PassResult,
    pub injections: Vec<InjectionFinding>,
    pub structure: PageStructure,
}

/// Detector verdict for one page fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IllegalContentReport {
    /// Page URL the HTML came from
    pub url: String,
    /// Category codes matched by any pass
    pub illegal_categories: Vec<String>,
    /// Weighted confidence, 0.0-1.0
    pub confidence_score: f64,
    pub suspicious_elements: Vec<SuspiciousElement>,
    pub hidden_content: HiddenContentSummary,
    pub injection_detected: bool,
    pub details: DetectionDetails,
}

impl IllegalContentReport {
    /// Whether any category matched.
    pub fn is_flagged(&self) -> bool {
        !self.illegal_categories.is_empty()
    }
}

/// Heuristic detector.
#[derive(Clone)]
pub struct IllegalContentDetector {
    taxonomy: Arc<Taxonomy>,
    keywords: Arc<KeywordSet>,
    tuning: Tuning,
    hidden_detection: bool,
    injection_detection: bool,
}

impl IllegalContentDetector {
    /// Creates a detector with every pass enabled.
    pub fn new(taxonomy: Arc<Taxonomy>, keywords: Arc<KeywordSet>, tuning: Tuning) -> Self {
        Self {
            taxonomy,
            keywords,
            tuning,
            hidden_detection: true,
            injection_detection: true,
        }
    }

    /// Creates a detector whose optional passes follow the scan config.
    pub fn from_config(taxonomy: Arc<Taxonomy>, keywords: Arc<KeywordSet>, config: &ScanConfig) -> Self {
        Self {
            hidden_detection: config.enable_hidden_content_detection,
            injection_detection: config.enable_injection_detection,
            ..Self::new(taxonomy, keywords, config.tuning.clone())
        }
    }

    /// The taxonomy in use.
    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    fn pass(&self, text: &str, discount: f64) -> PassResult {
        let matches = self.taxonomy.match_text(text);
        let confidence = self.tuning.confidence_for_matches(total_matches(&matches)) * discount;
        PassResult {
            matches,
            confidence,
        }
    }

    /// Scores raw HTML.
    pub fn detect_illegal_content(&self, html: &str, url: &str) -> IllegalContentReport {
        let document = PageDocument::parse(html);
        let mut suspicious_elements = Vec::new();

        let visible_text = self.pass(&document.visible_text(), 1.0);

        let (hidden_content_pass, hidden_summary) = if self.hidden_detection {
            let blocks = document.hidden_blocks();
            let joined = blocks
                .iter()
                .map(|b| b.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let pass = self.pass(&joined, self.tuning.hidden_content_discount);
            for block in &blocks {
                let matched = self.taxonomy.match_text(&block.text);
                if !matched.is_empty() || self.keywords.contains_any(&block.text) {
                    suspicious_elements.push(SuspiciousElement {
                        kind: "hidden_element".to_string(),
                        label: block.technique.clone(),
                        excerpt: truncate_chars(&block.text, SAMPLE_CHARS),
                    });
                }
            }
            let techniques: BTreeSet<String> = blocks.iter().map(|b| b.technique.clone()).collect();
            let summary = HiddenContentSummary {
                element_count: blocks.len(),
                techniques: techniques.into_iter().collect(),
                categories: pass.matches.keys().cloned().collect(),
                sample: truncate_chars(&joined, SAMPLE_CHARS),
            };
            (pass, summary)
        } else {
            (PassResult::default(), HiddenContentSummary::default())
        };

        let comments = comment_text(html);
        let html_comments = self.pass(&comments, 1.0);
        if !html_comments.matches.is_empty() {
            suspicious_elements.push(SuspiciousElement {
                kind: "html_comment".to_string(),
                label: html_comments.matches.keys().cloned().collect::<Vec<_>>().join(","),
                excerpt: truncate_chars(&comments, SAMPLE_CHARS),
            });
        }

        let meta = document.meta_text();
        let meta_tags = self.pass(&meta, 1.0);
        if !meta_tags.matches.is_empty() {
            suspicious_elements.push(SuspiciousElement {
                kind: "meta_tag".to_string(),
                label: meta_tags.matches.keys().cloned().collect::<Vec<_>>().join(","),
                excerpt: truncate_chars(&meta, SAMPLE_CHARS),
            });
        }

        let attributes = document.attribute_text();
        let hidden_attributes = self.pass(&attributes, 1.0);
        if !hidden_attributes.matches.is_empty() {
            suspicious_elements.push(SuspiciousElement {
                kind: "hidden_attribute".to_string(),
                label: hidden_attributes.matches.keys().cloned().collect::<Vec<_>>().join(","),
                excerpt: truncate_chars(&attributes, SAMPLE_CHARS),
            });
        }

        let injections = if self.injection_detection {
            find_injections(&document, html)
        } else {
            Vec::new()
        };
        for finding in &injections {
            suspicious_elements.push(SuspiciousElement {
                kind: "injection".to_string(),
                label: finding.pattern.clone(),
                excerpt: finding.excerpt.clone(),
            });
        }
        let injection_detected = !injections.is_empty();

        let t = &self.tuning;
        let mut confidence = t.weight_visible_text * visible_text.confidence
            + t.weight_hidden_content * hidden_content_pass.confidence
            + t.weight_html_comments * html_comments.confidence
            + t.weight_meta_tags * meta_tags.confidence
            + t.weight_hidden_attributes * hidden_attributes.confidence;
        if injection_detected {
            confidence += t.injection_bonus;
        }
        let confidence_score = confidence.clamp(0.0, 1.0);

        let illegal_categories: BTreeSet<String> = [
            &visible_text,
            &hidden_content_pass,
            &html_comments,
            &meta_tags,
            &hidden_attributes,
        ]
        .iter()
        .flat_map(|p| p.matches.keys().cloned())
        .collect();

        let structure = analyze_structure(&document, url, &self.taxonomy, &self.keywords);

        IllegalContentReport {
            url: url.to_string(),
            illegal_categories: illegal_categories.into_iter().collect(),
            confidence_score,
            suspicious_elements,
            hidden_content: hidden_summary,
            injection_detected,
            details: DetectionDetails {
                visible_text,
                hidden_content: hidden_content_pass,
                html_comments,
                meta_tags,
                hidden_attributes,
                injections,
                structure,
            },
        }
    }

    /// Link/form/external-reference analysis of raw HTML.
    pub fn analyze_page_structure(&self, html: &str, url: &str) -> PageStructure {
        let document = PageDocument::parse(html);
        analyze_structure(&document, url, &self.taxonomy, &self.keywords)
    }
}
