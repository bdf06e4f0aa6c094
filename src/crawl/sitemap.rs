//! Sitemap parsing.
//!
//! `<loc>` values are pulled out with a regex rather than a full XML parser;
//! sitemaps in the wild are frequently malformed.

use std::sync::LazyLock;

use regex::Regex;

static LOC: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)<loc>\s*(?:<!\[CDATA\[)?\s*(.*?)\s*(?:\]\]>)?\s*</loc>").ok());
static SITEMAP_INDEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)<sitemapindex[\s>]").ok());

/// Entries of one sitemap document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitemapDocument {
    /// Page URLs (`<urlset>`)
    pub urls: Vec<String>,
    /// Nested sitemap URLs (`<sitemapindex>`)
    pub sitemaps: Vec<String>,
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

/// Parses a sitemap or sitemap index.
pub fn parse_sitemap(xml: &str) -> SitemapDocument {
    let Some(loc) = LOC.as_ref() else {
        return SitemapDocument::default();
    };
    let locations: Vec<String> = loc
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|l| !l.is_empty())
        .collect();

    let is_index = SITEMAP_INDEX.as_ref().is_some_and(|re| re.is_match(xml));
    if is_index {
        SitemapDocument {
            urls: Vec::new(),
            sitemaps: locations,
        }
    } else {
        SitemapDocument {
            urls: locations,
            sitemaps: Vec::new(),
        }
    }
}

/// `Sitemap:` lines of a robots.txt.
pub fn sitemaps_from_robots(robots: &str) -> Vec<String> {
    robots
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case("sitemap")
                .then(|| value.trim().to_string())
        })
        .filter(|v| !v.is_empty())
        .collect()
}
