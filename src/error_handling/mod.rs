//! Error handling and degradation statistics.
//!
//! This module provides:
//! - Typed errors for initialization and search providers
//! - Degradation kinds ([`ErrorType`]) and their counters ([`ScanStats`])
//! - Provider error categorization (key errors vs. empty results)
//!
//! Nothing in the scanning pipeline propagates a per-URL failure upward: errors
//! are logged, counted here, and the affected item degrades to a conservative
//! result.

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{describe_reqwest_error, is_empty_results_message, is_key_error_message};
pub use stats::ScanStats;
pub use types::{ErrorType, InitializationError, SearchError};

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_scan_stats_initialization() {
        let stats = ScanStats::new();
        for error_type in ErrorType::iter() {
            assert_eq!(stats.get(error_type), 0);
        }
        assert_eq!(stats.total(), 0);
        assert!(stats.snapshot().is_empty());
    }

    #[test]
    fn test_scan_stats_increment_and_snapshot() {
        let stats = ScanStats::new();
        stats.increment(ErrorType::SearchQueryFailed);
        stats.increment(ErrorType::SearchQueryFailed);
        stats.increment(ErrorType::BrowserRenderFailed);

        assert_eq!(stats.get(ErrorType::SearchQueryFailed), 2);
        assert_eq!(stats.total(), 3);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.get("search_query_failed"), Some(&2));
        assert_eq!(snapshot.get("browser_render_failed"), Some(&1));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_key_error_messages() {
        assert!(is_key_error_message("Your account has run out of searches."));
        assert!(is_key_error_message("Invalid API key. Your API key should be here"));
        assert!(is_key_error_message("403 Forbidden"));
        assert!(is_key_error_message("Monthly QUOTA exceeded"));
        assert!(!is_key_error_message("Internal server error"));
        assert!(!is_key_error_message("timeout"));
    }

    #[test]
    fn test_empty_results_message() {
        assert!(is_empty_results_message(
            "Google hasn't returned any results for this query."
        ));
        assert!(!is_empty_results_message("Invalid API key"));
    }

    #[test]
    fn test_search_error_is_key_error() {
        assert!(SearchError::Provider("Invalid API key".into()).is_key_error());
        assert!(SearchError::Http {
            status: 429,
            body: String::new()
        }
        .is_key_error());
        assert!(SearchError::Http {
            status: 403,
            body: String::new()
        }
        .is_key_error());
        assert!(!SearchError::Http {
            status: 500,
            body: "oops".into()
        }
        .is_key_error());
        assert!(!SearchError::Provider("backend hiccup".into()).is_key_error());
    }

    #[test]
    fn test_error_type_display_is_snake_case() {
        assert_eq!(
            ErrorType::WallClockBudgetExceeded.to_string(),
            "wall_clock_budget_exceeded"
        );
    }
}
