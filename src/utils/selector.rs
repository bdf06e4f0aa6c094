//! CSS selector parsing utilities.

use scraper::{ElementRef, Html, Selector};

/// Parses a CSS selector, logging instead of panicking on failure.
///
/// Selectors are compile-time constants, so a failure is a programming error;
/// the caller gets `None` and treats it as "matches nothing".
///
/// # Arguments
///
/// * `selector_str` - The CSS selector string to parse
/// * `context` - Context description for error logging (e.g., "link extraction")
pub fn parse_selector(selector_str: &str, context: &str) -> Option<Selector> {
    match Selector::parse(selector_str) {
        Ok(selector) => Some(selector),
        Err(e) => {
            log::error!(
                "Failed to parse CSS selector '{}' in {}: {}",
                selector_str,
                context,
                e
            );
            None
        }
    }
}

/// Selects from a document with an optional selector.
pub fn select_all<'a>(document: &'a Html, selector: &'a Option<Selector>) -> Vec<ElementRef<'a>> {
    match selector {
        Some(selector) => document.select(selector).collect(),
        None => Vec::new(),
    }
}
