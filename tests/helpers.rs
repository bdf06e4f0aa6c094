// Shared test helpers: mock-server configuration, SerpAPI payloads and a fake
// headless browser.
//
// Every helper here is used by some but not all test files.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::json;

use seo_poison_scanner::config::Endpoints;
use seo_poison_scanner::dns::{HostResolver, StaticResolver};
use seo_poison_scanner::error_handling::InitializationError;
use seo_poison_scanner::initialization::init_client;
use seo_poison_scanner::verify::{BrowserLauncher, BrowserSession, NetworkRequest, RenderedPage};
use seo_poison_scanner::ScanConfig;

pub const SPAM_PAGE: &str = r#"<html><head><title>Slot Gacor Maxwin</title></head>
<body><h1>Daftar slot gacor hari ini</h1><p>Situs slot online terpercaya, bocoran slot maxwin.</p></body></html>"#;

pub const CLEAN_PAGE: &str = r#"<html><head><title>Dinas Pendidikan</title></head>
<body><h1>Selamat datang</h1><p>Informasi layanan publik dan pengumuman terbaru.</p></body></html>"#;

/// Scan target (`host:port`) for a mock server URI.
pub fn target_of(uri: &str) -> String {
    uri.trim_start_matches("http://").to_string()
}

/// A config pointing every external service at `uri`, with network-heavy
/// stages that tests do not exercise switched off.
pub fn test_config(uri: &str) -> ScanConfig {
    ScanConfig {
        enable_api_cache: false,
        enable_subdomain_dns_lookup: false,
        enable_graph_analysis: false,
        enable_deep_crawling: false,
        enable_sitemap_analysis: false,
        http_timeout_secs: 5,
        site_scheme: "http".to_string(),
        endpoints: Endpoints {
            serpapi_url: format!("{}/search.json", uri),
            crtsh_url: format!("{}/crtsh", uri),
            rdap_url: format!("{}/rdap", uri),
        },
        ..Default::default()
    }
}

pub fn client() -> Arc<reqwest::Client> {
    init_client(5).expect("client builds")
}

pub fn empty_resolver() -> Arc<dyn HostResolver> {
    Arc::new(StaticResolver::new())
}

/// A SerpAPI payload with one organic result per `(link, title, snippet)`.
pub fn serpapi_body(results: &[(String, &str, &str)]) -> serde_json::Value {
    let organic: Vec<serde_json::Value> = results
        .iter()
        .map(|(link, title, snippet)| json!({"link": link, "title": title, "snippet": snippet}))
        .collect();
    json!({ "search_metadata": {"status": "Success"}, "organic_results": organic })
}

/// Fake browser: returns canned HTML per URL, or fails for unknown URLs.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    pub pages: HashMap<String, String>,
    pub requests: Vec<NetworkRequest>,
    pub renders: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl FakeBrowser {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl BrowserSession for FakeBrowser {
    fn render<'a>(&'a mut self, url: &'a str) -> BoxFuture<'a, anyhow::Result<RenderedPage>> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        let page = self.pages.get(url).cloned();
        let requests = self.requests.clone();
        Box::pin(async move {
            match page {
                Some(html) => Ok(RenderedPage {
                    final_url: url.to_string(),
                    html,
                    requests,
                }),
                None => Err(anyhow::anyhow!("navigation to {} timed out", url)),
            }
        })
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out clones of one [`FakeBrowser`].
pub struct FakeLauncher {
    pub browser: FakeBrowser,
    pub launches: AtomicUsize,
}

impl FakeLauncher {
    pub fn new(browser: FakeBrowser) -> Self {
        Self {
            browser,
            launches: AtomicUsize::new(0),
        }
    }
}

impl BrowserLauncher for FakeLauncher {
    fn launch(&self) -> BoxFuture<'_, Result<Box<dyn BrowserSession>, InitializationError>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let browser = self.browser.clone();
        Box::pin(async move { Ok(Box::new(browser) as Box<dyn BrowserSession>) })
    }
}

/// A launcher that never finds a browser.
pub struct MissingChrome;

impl BrowserLauncher for MissingChrome {
    fn launch(&self) -> BoxFuture<'_, Result<Box<dyn BrowserSession>, InitializationError>> {
        Box::pin(async {
            Err(InitializationError::BrowserLaunchError(
                "Could not auto detect a chrome executable".to_string(),
            ))
        })
    }
}
