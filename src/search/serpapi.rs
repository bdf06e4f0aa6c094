//! SerpAPI provider.
//!
//! Google, Bing and DuckDuckGo are all reached through SerpAPI's unified
//! endpoint (`engine=` parameter); each answers with `organic_results`.

use std::sync::Arc;

use log::debug;
use serde::Deserialize;

use super::types::{ResultSource, SearchResult};
use crate::error_handling::{is_empty_results_message, SearchError};

/// Longest error body kept in a [`SearchError::Http`].
const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

/// Thin SerpAPI client.
#[derive(Clone)]
pub struct SerpApiClient {
    client: Arc<reqwest::Client>,
    base_url: String,
}

impl SerpApiClient {
    /// Creates a client for the given endpoint (normally `https://serpapi.com/search.json`).
    pub fn new(client: Arc<reqwest::Client>, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Runs one query against one engine.
    ///
    /// A payload `error` that merely reports "no results" is an empty success.
    ///
    /// # Errors
    ///
    /// Returns a [`SearchError`]; callers use [`SearchError::is_key_error`] to
    /// decide whether the fallback key is worth trying.
    pub async fn search(
        &self,
        engine: ResultSource,
        query: &str,
        api_key: &str,
        num: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let engine_name = engine
            .serpapi_engine()
            .ok_or_else(|| SearchError::Provider(format!("{} is not a search engine", engine.as_ref())))?;

        let mut params: Vec<(&str, String)> = vec![
            ("engine", engine_name.to_string()),
            ("q", query.to_string()),
            ("api_key", api_key.to_string()),
        ];
        match engine {
            ResultSource::Google => params.push(("num", num.min(100).to_string())),
            ResultSource::Bing => params.push(("count", num.min(50).to_string())),
            _ => {}
        }

        debug!("SerpAPI {} query: {}", engine_name, query);
        let response = self.client.get(&self.base_url).query(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // SerpAPI puts the reason in a JSON `error` field even on 4xx
            let message = serde_json::from_str::<SerpApiResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY).collect());
            return Err(SearchError::Http {
                status: status.as_u16(),
                body: message,
            });
        }

        let parsed: SerpApiResponse = serde_json::from_str(&body)?;
        if let Some(error) = parsed.error {
            if is_empty_results_message(&error) {
                return Ok(Vec::new());
            }
            return Err(SearchError::Provider(error));
        }

        Ok(parsed
            .organic_results
            .into_iter()
            .filter_map(|r| {
                let link = r.link?;
                Some(SearchResult::new(
                    &link,
                    r.title.as_deref().unwrap_or_default(),
                    r.snippet.as_deref().unwrap_or_default(),
                    engine,
                ))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str) -> SerpApiClient {
        SerpApiClient::new(Arc::new(reqwest::Client::new()), base)
    }

    #[tokio::test]
    async fn test_organic_results_without_link_are_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("engine", "bing"))
            .and(query_param("count", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "organic_results": [
                    {"link": " https://example.go.id/slot ", "title": "Slot", "snippet": "slot gacor"},
                    {"title": "no link"}
                ]
            })))
            .mount(&server)
            .await;

        let results = client(&server.uri())
            .search(ResultSource::Bing, "site:example.go.id slot", "k", 1000)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://example.go.id/slot");
        assert_eq!(results[0].source, ResultSource::Bing);
    }

    #[tokio::test]
    async fn test_http_error_keeps_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "Invalid API key."})),
            )
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .search(ResultSource::Google, "q", "bad", 10)
            .await
            .unwrap_err();

        assert!(err.is_key_error());
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_non_engine_source_is_rejected() {
        let err = client("http://127.0.0.1:9/search.json")
            .search(ResultSource::Crawl, "q", "k", 10)
            .await
            .unwrap_err();
        assert!(!err.is_key_error());
    }
}
