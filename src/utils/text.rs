//! Plain-text helpers shared by crawling, verification and detection.

use crate::config::SNIPPET_CONTEXT_CHARS;

/// Collapses every run of whitespace into one space and trims.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the text around the first case-insensitive occurrence of `needle`,
/// with [`SNIPPET_CONTEXT_CHARS`] characters of context on each side.
///
/// Falls back to the start of the text when `needle` is absent.
pub fn snippet_around(text: &str, needle: &str) -> String {
    let text = collapse_whitespace(text);
    let chars: Vec<char> = text.chars().collect();
    let lower: Vec<char> = text.to_lowercase().chars().collect();
    let needle: Vec<char> = needle.to_lowercase().chars().collect();

    // Lowercasing can change char counts for a few scripts; fall back to the head then
    let position = if lower.len() == chars.len() && !needle.is_empty() {
        lower.windows(needle.len()).position(|w| w == needle.as_slice())
    } else {
        None
    };

    let (start, end) = match position {
        Some(p) => (
            p.saturating_sub(SNIPPET_CONTEXT_CHARS),
            (p + needle.len() + SNIPPET_CONTEXT_CHARS).min(chars.len()),
        ),
        None => (0, (2 * SNIPPET_CONTEXT_CHARS).min(chars.len())),
    };
    chars[start..end].iter().collect::<String>().trim().to_string()
}
