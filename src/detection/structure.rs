//! Link and form structure analysis.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use super::document::PageDocument;
use super::taxonomy::Taxonomy;
use crate::domain::same_site;
use crate::keywords::KeywordSet;
use crate::utils::{collapse_whitespace, parse_selector, select_all};

static LINK_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| parse_selector("a[href]", "structure link scan"));
static FORM_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| parse_selector("form", "structure form scan"));
static PASSWORD_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| parse_selector("input[type=password]", "structure form scan"));
static RESOURCE_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| parse_selector("script[src], iframe[src], img[src]", "structure resource scan"));

/// Structural red flags of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageStructure {
    /// Links whose text/URL carries malicious keywords, or that are hidden
    pub suspicious_links: Vec<String>,
    /// Forms posting credentials off-site or over plain HTTP
    pub suspicious_forms: Vec<String>,
    /// Distinct external hosts referenced by links and resources
    pub external_domains: Vec<String>,
    /// 0.0-1.0
    pub risk_score: f64,
}

/// Analyzes links, forms and external references of a page.
pub fn analyze_structure(
    document: &PageDocument,
    page_url: &str,
    taxonomy: &Taxonomy,
    keywords: &KeywordSet,
) -> PageStructure {
    let Ok(base) = url::Url::parse(page_url) else {
        return PageStructure::default();
    };
    let page_host = base.host_str().unwrap_or_default().to_string();
    let html = document.html();

    let mut suspicious_links = BTreeSet::new();
    let mut external_domains = BTreeSet::new();
    let hidden = document.hidden_elements();

    for link in select_all(html, &LINK_SELECTOR) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Ok(target) = base.join(href) else {
            continue;
        };
        if !matches!(target.scheme(), "http" | "https") {
            continue;
        }
        let host = target.host_str().unwrap_or_default().to_string();
        let external = !same_site(&host, &page_host);
        if external {
            external_domains.insert(host);
        }

        let text = collapse_whitespace(&link.text().collect::<String>());
        let flagged_text = keywords.contains_any(&text) || !taxonomy.match_text(&text).is_empty();
        let flagged_url = keywords.contains_any_in_url_text(target.as_str());
        if flagged_text || flagged_url || (external && hidden.contains(&link.id())) {
            suspicious_links.insert(target.to_string());
        }
    }

    for resource in select_all(html, &RESOURCE_SELECTOR) {
        if let Some(src) = resource.value().attr("src") {
            if let Some(host) = base.join(src).ok().and_then(|u| u.host_str().map(str::to_string)) {
                if !same_site(&host, &page_host) {
                    external_domains.insert(host);
                }
            }
        }
    }

    let mut suspicious_forms = Vec::new();
    for form in select_all(html, &FORM_SELECTOR) {
        let action = form.value().attr("action").unwrap_or_default();
        let Ok(target) = base.join(action) else {
            continue;
        };
        let has_password = PASSWORD_SELECTOR
            .as_ref()
            .is_some_and(|s| form.select(s).next().is_some());
        let off_site = target
            .host_str()
            .is_some_and(|h| !same_site(h, &page_host));
        let plaintext = target.scheme() == "http" && base.scheme() == "https";
        if off_site || (has_password && plaintext) {
            suspicious_forms.push(target.to_string());
        }
    }

    let risk_score = (0.15 * suspicious_links.len() as f64
        + 0.25 * suspicious_forms.len() as f64
        + 0.02 * external_domains.len() as f64)
        .min(1.0);

    PageStructure {
        suspicious_links: suspicious_links.into_iter().collect(),
        suspicious_forms,
        external_domains: external_domains.into_iter().collect(),
        risk_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_flags_keyword_links_and_external_forms() {
        let html = r#"<html><body>
            <a href="/profil">Profil</a>
            <a href="https://slot-site.example/daftar">Slot Gacor Maxwin</a>
            <a href="https://news.example.com/">Berita</a>
            <div style="display:none"><a href="https://hidden.example/">x</a></div>
            <script src="https://cdn.example.net/app.js"></script>
            <form action="https://collector.example/steal"><input type="password"></form>
            <form action="/cari"><input name="q"></form>
        </body></html>"#;
        let doc = PageDocument::parse(html);
        let structure = analyze_structure(
            &doc,
            "https://example.go.id/",
            &Taxonomy::default(),
            &KeywordSet::hardcoded(),
        );
        assert!(structure
            .suspicious_links
            .contains(&"https://slot-site.example/daftar".to_string()));
        assert!(structure
            .suspicious_links
            .contains(&"https://hidden.example/".to_string()));
        assert!(!structure
            .suspicious_links
            .iter()
            .any(|l| l.contains("news.example.com")));
        assert_eq!(
            structure.suspicious_forms,
            vec!["https://collector.example/steal".to_string()]
        );
        assert!(structure.external_domains.contains(&"cdn.example.net".to_string()));
        assert!(!structure.external_domains.contains(&"example.go.id".to_string()));
        assert!(structure.risk_score > 0.0 && structure.risk_score <= 1.0);
    }

    #[test]
    fn test_structure_invalid_url() {
        let doc = PageDocument::parse("<a href='x'>x</a>");
        let s = analyze_structure(&doc, "not a url", &Taxonomy::default(), &KeywordSet::hardcoded());
        assert_eq!(s, PageStructure::default());
    }
}
