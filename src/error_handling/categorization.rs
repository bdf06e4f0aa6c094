//! Error categorization.
//!
//! Provider errors arrive as free-form text (SerpAPI puts the reason in an
//! `error` field), so key problems are recognized by substring.

/// Substrings that identify an unusable API key (case-insensitive).
const KEY_ERROR_MARKERS: &[&str] = &[
    "quota",
    "forbidden",
    "invalid api key",
    "invalid key",
    "run out of searches",
    "rate limit",
    "limit exceeded",
    "unauthorized",
];

/// Returns true if a provider error message indicates a quota/forbidden/invalid-key
/// condition, i.e. one where swapping to the fallback key may help.
///
/// # Arguments
///
/// * `message` - The provider error message or response body
pub fn is_key_error_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    KEY_ERROR_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Returns true if a provider error message merely says the query had no hits.
///
/// SerpAPI reports empty result pages through its `error` field; this is a
/// successful, empty search rather than a failure.
pub fn is_empty_results_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("hasn't returned any results") || lower.contains("no results")
}

/// Short human-readable label for a `reqwest::Error`, used in logs and results.
pub fn describe_reqwest_error(error: &reqwest::Error) -> String {
    if let Some(status) = error.status() {
        return format!("HTTP {}", status.as_u16());
    }
    if error.is_timeout() {
        "timeout".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else if error.is_redirect() {
        "redirect loop".to_string()
    } else if error.is_decode() || error.is_body() {
        "body decode failed".to_string()
    } else {
        "request failed".to_string()
    }
}
