//! Integration tests for search aggregation against a mocked SerpAPI.
//!
//! These tests verify:
//! - Fallback key is tried exactly once when the primary is rejected
//! - The next query starts on the primary again
//! - Cached responses skip the network
//! - Failed queries are skipped without aborting the batch

mod helpers;

use std::sync::Arc;

use seo_poison_scanner::cache::{MemoryCache, ResponseCache};
use seo_poison_scanner::error_handling::{ErrorType, ScanStats};
use seo_poison_scanner::search::{ApiKeys, ResultSource, SearchAggregator, SearchResult, SerpApiClient};
use seo_poison_scanner::{KeywordSet, ScanConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{client, serpapi_body, test_config};

fn aggregator(config: &ScanConfig, stats: Arc<ScanStats>) -> SearchAggregator {
    let cache: Arc<dyn ResponseCache<Vec<SearchResult>>> = Arc::new(MemoryCache::new(100));
    SearchAggregator::new(
        SerpApiClient::new(client(), &config.endpoints.serpapi_url),
        cache,
        config,
        Arc::new(KeywordSet::hardcoded()),
        stats,
    )
}

#[tokio::test]
async fn test_fallback_key_used_once_per_rejected_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("api_key", "primary"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(serde_json::json!({"error": "Your account has run out of searches."})),
        )
        .expect(2)
        .mount(&server)
        .await;
    let page = format!("{}/berita/slot", server.uri());
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("api_key", "backup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serpapi_body(&[(
            page.clone(),
            "Slot Gacor",
            "situs slot gacor maxwin",
        )])))
        .expect(2)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let stats = Arc::new(ScanStats::new());
    let search = aggregator(&config, stats.clone());
    let keys = ApiKeys::new("primary", Some("backup".to_string()));

    // Comprehensive mode issues two queries; each starts on the primary key
    let results = search
        .search("example.go.id", &keys, &[ResultSource::Google], true)
        .await;

    assert_eq!(results.len(), 1, "the same page from both queries is deduplicated");
    assert_eq!(results[0].url, page);
    assert_eq!(stats.get(ErrorType::SearchKeySwapped), 2);
    assert_eq!(stats.get(ErrorType::SearchQueryFailed), 0);
}

#[tokio::test]
async fn test_rejected_key_without_fallback_skips_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "Invalid API key."})))
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let stats = Arc::new(ScanStats::new());
    let search = aggregator(&config, stats.clone());

    let results = search
        .search("example.go.id", &ApiKeys::new("bad", None), &[ResultSource::Google], true)
        .await;

    assert!(results.is_empty());
    assert_eq!(stats.get(ErrorType::SearchQueryFailed), 2);
    assert_eq!(stats.get(ErrorType::SearchKeySwapped), 0);
}

#[tokio::test]
async fn test_cache_hit_skips_network() {
    let server = MockServer::start().await;
    let page = format!("{}/slot-gacor", server.uri());
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serpapi_body(&[(
            page,
            "Slot",
            "slot gacor",
        )])))
        // One call per query on the first search, none on the second
        .expect(2)
        .mount(&server)
        .await;

    let config = ScanConfig {
        enable_api_cache: true,
        ..test_config(&server.uri())
    };
    let search = aggregator(&config, Arc::new(ScanStats::new()));
    let keys = ApiKeys::new("primary", None);

    let first = search
        .search("example.go.id", &keys, &[ResultSource::Google], true)
        .await;
    let second = search
        .search("example.go.id", &keys, &[ResultSource::Google], true)
        .await;
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
}

#[tokio::test]
async fn test_empty_results_message_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"error": "Google hasn't returned any results for this query."})),
        )
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let stats = Arc::new(ScanStats::new());
    let search = aggregator(&config, stats.clone());
    let results = search
        .search("example.go.id", &ApiKeys::new("k", None), &[ResultSource::Google], false)
        .await;
    assert!(results.is_empty());
    assert_eq!(stats.total(), 0);
}

#[tokio::test]
async fn test_no_key_skips_search() {
    let config = test_config("http://127.0.0.1:9");
    let search = aggregator(&config, Arc::new(ScanStats::new()));
    let results = search
        .search("example.go.id", &ApiKeys::new("", None), &[ResultSource::Google], true)
        .await;
    assert!(results.is_empty());
}
