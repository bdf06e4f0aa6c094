//! Sanitizing text copied into scan results.
//!
//! Error messages and page excerpts come from untrusted servers; control
//! characters are removed and the length is bounded before they are stored.

use crate::config::MAX_ERROR_MESSAGE_LENGTH;

/// Removes control characters except newline, tab and carriage return.
///
/// Non-ASCII text is kept as-is.
pub fn sanitize_error_message(message: &str) -> String {
    message
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
        .collect()
}

/// Truncates to at most `max_chars` characters, on a character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Sanitizes an error message and bounds it to [`MAX_ERROR_MESSAGE_LENGTH`].
///
/// A truncated message ends with a marker carrying the original length.
pub fn sanitize_and_truncate_error_message(message: &str) -> String {
    let sanitized = sanitize_error_message(message);
    let length = sanitized.chars().count();
    if length <= MAX_ERROR_MESSAGE_LENGTH {
        return sanitized;
    }
    format!(
        "{}... (truncated, original length: {} chars)",
        truncate_chars(&sanitized, MAX_ERROR_MESSAGE_LENGTH.saturating_sub(50)),
        length
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_removes_control_chars() {
        assert_eq!(
            sanitize_error_message("Error\x00message\x01with\x1bcontrol"),
            "Errormessagewithcontrol"
        );
    }

    #[test]
    fn test_sanitize_keeps_whitespace_and_unicode() {
        assert_eq!(
            sanitize_error_message("baris\tsatu\ndua 测试 🚀"),
            "baris\tsatu\ndua 测试 🚀"
        );
        assert_eq!(sanitize_error_message(""), "");
    }

    #[test]
    fn test_truncate_chars_is_boundary_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("🚀🚀🚀", 1), "🚀");
    }

    #[test]
    fn test_sanitize_and_truncate_long_message() {
        let long = "é".repeat(MAX_ERROR_MESSAGE_LENGTH + 100);
        let out = sanitize_and_truncate_error_message(&long);
        assert!(out.contains("truncated, original length"));
        assert!(out.chars().count() < MAX_ERROR_MESSAGE_LENGTH);
    }

    #[test]
    fn test_sanitize_and_truncate_short_message_untouched() {
        assert_eq!(sanitize_and_truncate_error_message("timeout"), "timeout");
    }
}
