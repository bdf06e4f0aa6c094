//! Utility functions.
//!
//! This module provides:
//! - String sanitization and truncation for result fields
//! - CSS selector parsing utilities
//! - Whitespace and snippet helpers

pub mod sanitize;
mod selector;
mod text;

pub use sanitize::{sanitize_and_truncate_error_message, truncate_chars};
pub use selector::{parse_selector, select_all};
pub use text::{collapse_whitespace, snippet_around};
