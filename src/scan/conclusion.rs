//! Final risk conclusion.

use serde::{Deserialize, Serialize};

use crate::config::Tuning;
use crate::verify::VerificationStatus;

/// Overall verdict for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskStatus {
    #[serde(rename = "AMAN")]
    Aman,
    #[serde(rename = "PERLU PERHATIAN")]
    PerluPerhatian,
    #[serde(rename = "TIDAK AMAN")]
    TidakAman,
}

/// Verification outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConclusionStats {
    pub total: usize,
    pub live_malicious: usize,
    pub cache_only: usize,
    pub clean: usize,
}

impl ConclusionStats {
    /// Counts statuses; an item that was never verified (`None`) counts as
    /// cache-only since its only evidence is the search snippet.
    pub fn tally<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = Option<VerificationStatus>>,
    {
        let mut stats = Self::default();
        for status in statuses {
            stats.total += 1;
            match status {
                Some(VerificationStatus::LiveMalicious) => stats.live_malicious += 1,
                Some(VerificationStatus::Clean) => stats.clean += 1,
                Some(VerificationStatus::CacheOnly) | None => stats.cache_only += 1,
            }
        }
        stats
    }
}

/// Risk verdict computed from verification counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalConclusion {
    pub status: RiskStatus,
    /// 0..=100
    pub risk_score: u32,
    pub stats: ConclusionStats,
}

impl Default for FinalConclusion {
    fn default() -> Self {
        Self::compute(ConclusionStats::default(), &Tuning::default())
    }
}

impl FinalConclusion {
    /// `risk_score = min(100, w_live·live_malicious + w_cache·cache_only)`.
    ///
    /// Any live-malicious page makes the domain TIDAK AMAN; otherwise more than
    /// `cache_only_attention_threshold` cache-only pages make it PERLU PERHATIAN.
    pub fn compute(stats: ConclusionStats, tuning: &Tuning) -> Self {
        let points = |count: usize, weight: u32| {
            u64::try_from(count)
                .unwrap_or(u64::MAX)
                .saturating_mul(u64::from(weight))
        };
        let raw = points(stats.live_malicious, tuning.risk_weight_live_malicious)
            .saturating_add(points(stats.cache_only, tuning.risk_weight_cache_only));
        let risk_score = raw.min(100) as u32;

        let status = if stats.live_malicious > 0 {
            RiskStatus::TidakAman
        } else if stats.cache_only > tuning.cache_only_attention_threshold {
            RiskStatus::PerluPerhatian
        } else {
            RiskStatus::Aman
        };

        Self {
            status,
            risk_score,
            stats,
        }
    }
}
