//! Integration tests for crawling and link-graph analysis against a mock site.
//!
//! The site has a normal navigation tree, a page listed only in the sitemap
//! (orphan) and a pair of spam pages that link only to each other (isolated
//! cluster).

mod helpers;

use std::sync::Arc;

use seo_poison_scanner::crawl::{Crawler, PageFetcher};
use seo_poison_scanner::error_handling::{ErrorType, ScanStats};
use seo_poison_scanner::search::ResultSource;
use seo_poison_scanner::KeywordSet;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{client, CLEAN_PAGE};

async fn page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

fn links(hrefs: &[&str], text: &str) -> String {
    let anchors: String = hrefs.iter().map(|h| format!("<a href=\"{}\">link</a>", h)).collect();
    format!("<html><head><title>Page</title></head><body><p>{}</p>{}</body></html>", text, anchors)
}

async fn mock_site() -> MockServer {
    let server = MockServer::start().await;
    let uri = server.uri();
    page(&server, "/", links(&["/profil", "/berita#top"], "Beranda")).await;
    page(&server, "/profil", links(&["/"], "Profil dinas")).await;
    page(&server, "/berita", links(&[], "Berita terbaru")).await;
    page(&server, "/orphan", links(&["/"], "Halaman lama")).await;
    page(&server, "/spam-1", links(&["/spam-2"], "Daftar slot gacor maxwin")).await;
    page(&server, "/spam-2", links(&["/spam-1"], "Bocoran togel online")).await;
    page(&server, "/robots.txt", format!("User-agent: *\nSitemap: {}/sitemap.xml\n", uri)).await;
    page(
        &server,
        "/sitemap.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{uri}/</loc></url>
  <url><loc>{uri}/orphan</loc></url>
  <url><loc>{uri}/spam-1</loc></url>
  <url><loc>https://elsewhere.example/page</loc></url>
</urlset>"#
        ),
    )
    .await;
    server
}

fn crawler(stats: Arc<ScanStats>) -> Crawler {
    Crawler::new(PageFetcher::new(client()), Arc::new(KeywordSet::hardcoded()), stats)
}

#[tokio::test]
async fn test_sitemap_discovery() {
    let server = mock_site().await;
    let crawler = crawler(Arc::new(ScanStats::new()));
    let urls = crawler.discover_sitemap_urls(&server.uri()).await;
    let uri = server.uri();
    assert_eq!(
        urls,
        vec![format!("{}/", uri), format!("{}/orphan", uri), format!("{}/spam-1", uri)],
        "off-site sitemap entries are dropped"
    );
}

#[tokio::test]
async fn test_graph_finds_orphans_and_isolated_clusters() {
    let server = mock_site().await;
    let uri = server.uri();
    let crawler = crawler(Arc::new(ScanStats::new()));
    let seeds = crawler.discover_sitemap_urls(&uri).await;

    let analysis = crawler.crawl_and_analyze(&uri, &seeds, 50).await;

    assert_eq!(analysis.orphan_pages, vec![format!("{}/orphan", uri)]);
    assert_eq!(
        analysis.isolated_clusters,
        vec![vec![format!("{}/spam-1", uri), format!("{}/spam-2", uri)]]
    );
    // home, profil, berita, orphan, spam-1, spam-2
    assert_eq!(analysis.total_nodes, 6);
}

#[tokio::test]
async fn test_page_budget_is_respected() {
    let server = mock_site().await;
    let uri = server.uri();
    let crawler = crawler(Arc::new(ScanStats::new()));
    let analysis = crawler.crawl_and_analyze(&uri, &[], 1).await;
    // Only the homepage was fetched; its links are nodes but were not crawled
    assert_eq!(analysis.total_edges, 2);
    assert!(analysis.isolated_clusters.is_empty());
}

#[tokio::test]
async fn test_fast_crawl_harvests_keyword_hits() {
    let server = mock_site().await;
    let uri = server.uri();
    let crawler = crawler(Arc::new(ScanStats::new()));
    let seeds = vec![format!("{}/spam-1", uri)];

    let crawl = crawler.crawl_fast(&uri, &seeds, 20).await;

    let mut hits: Vec<&str> = crawl.hits.iter().map(|h| h.url.as_str()).collect();
    hits.sort();
    assert_eq!(hits, vec![format!("{}/spam-1", uri), format!("{}/spam-2", uri)]);
    assert!(crawl.hits.iter().all(|h| h.source == ResultSource::Crawl));
    assert!(crawl.hits.iter().all(|h| !h.snippet.is_empty()));
    assert_eq!(crawl.visited.len(), 5);
}

#[tokio::test]
async fn test_failed_pages_are_skipped_and_counted() {
    let server = MockServer::start().await;
    page(&server, "/", links(&["/missing", "/ok"], "Beranda")).await;
    page(&server, "/ok", CLEAN_PAGE.to_string()).await;
    let stats = Arc::new(ScanStats::new());
    let crawler = crawler(stats.clone());

    let crawl = crawler.crawl_fast(&server.uri(), &[], 10).await;

    assert_eq!(crawl.visited.len(), 2);
    assert_eq!(stats.get(ErrorType::CrawlFetchFailed), 1);
}

#[tokio::test]
async fn test_path_probing() {
    let server = MockServer::start().await;
    page(&server, "/slot-gacor", helpers::SPAM_PAGE.to_string()).await;
    page(&server, "/judi", CLEAN_PAGE.to_string()).await;
    let crawler = crawler(Arc::new(ScanStats::new()));

    let hits = crawler.probe_paths(&server.uri()).await;

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].url, format!("{}/slot-gacor", server.uri()));
    assert_eq!(hits[0].source, ResultSource::PathProbe);
}
