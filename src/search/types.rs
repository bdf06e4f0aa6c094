//! Search result types.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter};

/// Where a candidate page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResultSource {
    Google,
    Bing,
    #[serde(rename = "duckduckgo")]
    #[strum(serialize = "duckduckgo")]
    DuckDuckGo,
    Crawl,
    Sitemap,
    Subdomain,
    PathProbe,
    Backlink,
}

impl ResultSource {
    /// SerpAPI `engine` parameter for search-engine sources.
    pub fn serpapi_engine(&self) -> Option<&'static str> {
        match self {
            ResultSource::Google => Some("google"),
            ResultSource::Bing => Some("bing"),
            ResultSource::DuckDuckGo => Some("duckduckgo"),
            _ => None,
        }
    }

    /// Whether this source is a search-engine index (as opposed to the live site).
    pub fn is_search_engine(&self) -> bool {
        self.serpapi_engine().is_some()
    }
}

/// One candidate page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page URL (canonicalized once deduplicated)
    pub url: String,
    /// Page title as reported by the source
    pub title: String,
    /// Snippet (search-engine cache text, or crawl excerpt)
    pub snippet: String,
    /// Source tag
    pub source: ResultSource,
}

impl SearchResult {
    /// Creates a result, trimming whitespace from every field.
    pub fn new(url: &str, title: &str, snippet: &str, source: ResultSource) -> Self {
        Self {
            url: url.trim().to_string(),
            title: title.trim().to_string(),
            snippet: snippet.trim().to_string(),
            source,
        }
    }

    /// Title and snippet joined, the text keyword matching runs on.
    pub fn cached_text(&self) -> String {
        format!("{} {}", self.title, self.snippet)
    }
}
