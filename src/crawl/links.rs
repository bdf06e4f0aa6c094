//! Link extraction and per-page keyword scanning.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use scraper::Selector;

use crate::detection::PageDocument;
use crate::keywords::KeywordSet;
use crate::urls::{normalize_node_url, validate_web_url};
use crate::utils::{parse_selector, select_all};

static LINK_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| parse_selector("a[href]", "link extraction"));

/// What a crawler keeps from one page.
#[derive(Debug, Clone, Default)]
pub struct PageScan {
    /// Absolute http(s) links, node-normalized and deduplicated
    pub links: Vec<String>,
    /// `<title>` text
    pub title: Option<String>,
    /// Visible text
    pub text: String,
    /// Keywords found in visible text or title
    pub keyword_hits: Vec<String>,
}

/// Parses a page once and extracts links, title, visible text and keyword hits.
///
/// Relative links are resolved against `base_url`; non-web schemes
/// (`mailto:`, `javascript:`, `tel:`) are dropped.
pub fn scan_page(html: &str, base_url: &str, keywords: &KeywordSet) -> PageScan {
    let document = PageDocument::parse(html);
    let text = document.visible_text();
    let keyword_hits = keywords.find_in(&text);

    let mut links = BTreeSet::new();
    if let Ok(base) = url::Url::parse(base_url) {
        for anchor in select_all(document.html(), &LINK_SELECTOR) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            if href.is_empty() || href.starts_with('#') {
                continue;
            }
            if let Ok(resolved) = base.join(href) {
                if validate_web_url(resolved.as_str()).is_some() {
                    links.insert(normalize_node_url(resolved.as_str()));
                }
            }
        }
    }

    PageScan {
        links: links.into_iter().collect(),
        title: document.title(),
        text,
        keyword_hits,
    }
}
