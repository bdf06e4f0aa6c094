//! Unindexed page discovery.

use std::collections::HashSet;

use crate::keywords::KeywordSet;
use crate::search::{ResultSource, SearchResult};
use crate::urls::normalize_node_url;

/// Pages found on the site that search engines have not indexed.
///
/// Sources, in order: crawl hits, sitemap URLs whose path or query carries
/// keywords, suspicious-path probe hits. Anything already present in `indexed`
/// is dropped, as are repeats.
pub fn unindexed_pages(
    indexed: &[SearchResult],
    crawl_hits: &[SearchResult],
    sitemap_urls: &[String],
    path_hits: &[SearchResult],
    keywords: &KeywordSet,
) -> Vec<SearchResult> {
    let mut seen: HashSet<String> = indexed.iter().map(|r| normalize_node_url(&r.url)).collect();

    let sitemap_hits = sitemap_urls
        .iter()
        .filter(|url| keywords.contains_any_in_url_text(url))
        .map(|url| SearchResult::new(url, "", "", ResultSource::Sitemap));

    crawl_hits
        .iter()
        .cloned()
        .chain(sitemap_hits)
        .chain(path_hits.iter().cloned())
        .filter(|r| seen.insert(normalize_node_url(&r.url)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str, source: ResultSource) -> SearchResult {
        SearchResult::new(url, "t", "slot gacor", source)
    }

    #[test]
    fn test_indexed_pages_are_excluded() {
        let keywords = KeywordSet::hardcoded();
        let indexed = vec![result("https://example.go.id/slot-gacor/", ResultSource::Google)];
        let crawl = vec![
            result("https://example.go.id/slot-gacor", ResultSource::Crawl),
            result("https://example.go.id/berita/maxwin", ResultSource::Crawl),
        ];
        let pages = unindexed_pages(&indexed, &crawl, &[], &[], &keywords);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].url, "https://example.go.id/berita/maxwin");
    }

    #[test]
    fn test_sitemap_urls_need_keywords_in_url() {
        let keywords = KeywordSet::hardcoded();
        let sitemap = vec![
            "https://example.go.id/profil".to_string(),
            "https://example.go.id/slot-gacor-hari-ini".to_string(),
        ];
        let pages = unindexed_pages(&[], &[], &sitemap, &[], &keywords);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].source, ResultSource::Sitemap);
        assert_eq!(pages[0].url, "https://example.go.id/slot-gacor-hari-ini");
    }

    #[test]
    fn test_sources_are_merged_without_repeats() {
        let keywords = KeywordSet::hardcoded();
        let crawl = vec![result("https://example.go.id/slot", ResultSource::Crawl)];
        let probes = vec![
            result("https://example.go.id/slot", ResultSource::PathProbe),
            result("https://example.go.id/togel", ResultSource::PathProbe),
        ];
        let pages = unindexed_pages(&[], &crawl, &[], &probes, &keywords);
        let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.go.id/slot", "https://example.go.id/togel"]);
        assert_eq!(pages[0].source, ResultSource::Crawl);
    }
}
