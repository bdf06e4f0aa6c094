//! Scan request and result types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conclusion::FinalConclusion;
use crate::config::ScanType;
use crate::graph::GraphAnalysisResult;
use crate::intel::DomainInfo;
use crate::search::{ApiKeys, SearchResult};
use crate::subdomain::SubdomainReport;
use crate::verify::VerificationResult;

/// One scan invocation.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Domain or URL as entered by the user
    pub domain: String,
    pub keys: ApiKeys,
    pub scan_type: ScanType,
    /// Progress key; generated when absent
    pub scan_id: Option<String>,
}

impl ScanRequest {
    pub fn new(domain: impl Into<String>, keys: ApiKeys, scan_type: ScanType) -> Self {
        Self {
            domain: domain.into(),
            keys,
            scan_type,
            scan_id: None,
        }
    }

    pub fn with_scan_id(mut self, scan_id: impl Into<String>) -> Self {
        self.scan_id = Some(scan_id.into());
        self
    }
}

/// A classified candidate page and its verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanItem {
    #[serde(flatten)]
    pub result: SearchResult,
    /// Category code assigned by the classifier
    pub category: String,
    /// `None` when the item was never verified
    pub verification: Option<VerificationResult>,
}

/// Items of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    /// Display name
    pub name: String,
    pub items: Vec<ScanItem>,
}

/// Everything one scan produced. Serialized once, read-only afterwards.
///
/// Every field is always present; a stage that was disabled or failed leaves
/// its field empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub scan_id: String,
    /// Normalized scan target
    pub domain: String,
    pub scan_type: ScanType,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Category code to items
    pub categories: BTreeMap<String, CategoryResult>,
    pub domain_info: DomainInfo,
    pub backlinks: Vec<SearchResult>,
    /// Pages visited while crawling
    pub total_pages: usize,
    /// Whether candidates were checked against the live site
    pub verified_scan: bool,
    pub graph_analysis: GraphAnalysisResult,
    pub subdomain_results: SubdomainReport,
    pub unindexed_pages: Vec<SearchResult>,
    pub final_conclusion: FinalConclusion,
    /// The wall-clock budget ran out before every stage finished
    pub timed_out: bool,
    pub verified_items: usize,
    /// Non-zero degradation counters
    pub error_counts: BTreeMap<String, usize>,
    pub warnings: Vec<String>,
}

impl ScanResult {
    /// An empty result for `domain`.
    pub fn empty(scan_id: &str, domain: &str, scan_type: ScanType, started_at: DateTime<Utc>) -> Self {
        Self {
            scan_id: scan_id.to_string(),
            domain: domain.to_string(),
            scan_type,
            started_at,
            finished_at: started_at,
            categories: BTreeMap::new(),
            domain_info: DomainInfo {
                domain: domain.to_string(),
                ..Default::default()
            },
            backlinks: Vec::new(),
            total_pages: 0,
            verified_scan: false,
            graph_analysis: GraphAnalysisResult::default(),
            subdomain_results: SubdomainReport::default(),
            unindexed_pages: Vec::new(),
            final_conclusion: FinalConclusion::default(),
            timed_out: false,
            verified_items: 0,
            error_counts: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Every item across categories.
    pub fn items(&self) -> impl Iterator<Item = &ScanItem> {
        self.categories.values().flat_map(|c| c.items.iter())
    }
}
