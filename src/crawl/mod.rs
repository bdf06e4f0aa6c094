//! Site crawling.
//!
//! This module provides:
//! - [`Crawler::crawl_graph`] / [`Crawler::crawl_and_analyze`]: sequential BFS that
//!   records every internal link as a directed edge
//! - [`Crawler::crawl_fast`]: batched concurrent crawl that only harvests keyword hits
//! - [`Crawler::discover_sitemap_urls`]: robots.txt + sitemap (index) ingestion
//! - [`Crawler::probe_paths`]: brute-force of paths commonly planted by gambling spam
//!
//! A page that fails to load is skipped, never retried, and never aborts a crawl.

mod fetch;
mod links;
mod sitemap;

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info};

pub use fetch::{FetchedPage, PageFetcher};
pub use links::{scan_page, PageScan};
pub use sitemap::{parse_sitemap, sitemaps_from_robots, SitemapDocument};

use crate::config::{FAST_CRAWL_BATCH_SIZE, MAX_SITEMAP_INDEX_FANOUT, MAX_SITEMAP_URLS};
use crate::domain::{host_of, same_site};
use crate::error_handling::{ErrorType, ScanStats};
use crate::graph::{GraphAnalysisResult, LinkGraph};
use crate::keywords::KeywordSet;
use crate::search::{ResultSource, SearchResult};
use crate::urls::{normalize_node_url, validate_web_url};
use crate::utils::snippet_around;

/// Paths spam campaigns commonly plant on compromised sites.
pub const SUSPICIOUS_PATHS: &[&str] = &[
    "/slot",
    "/slot-gacor",
    "/slot-online",
    "/slot88",
    "/judi",
    "/judi-online",
    "/togel",
    "/casino",
    "/sbobet",
    "/gacor",
    "/maxwin",
    "/rtp",
    "/link-alternatif",
    "/bokep",
    "/amp/slot",
    "/id/slot",
    "/wp-content/uploads/slot",
    "/assets/slot",
    "/images/slot",
    "/uploads/judi",
];

/// Output of a fast crawl.
#[derive(Debug, Clone, Default)]
pub struct FastCrawl {
    /// Pages whose visible text contained keywords
    pub hits: Vec<SearchResult>,
    /// Node-normalized URLs fetched successfully
    pub visited: Vec<String>,
}

/// Crawls one site.
#[derive(Clone)]
pub struct Crawler {
    fetcher: PageFetcher,
    keywords: Arc<KeywordSet>,
    stats: Arc<ScanStats>,
}

/// Two-tier frontier: discovered links first, sitemap seeds once links run out.
struct Frontier {
    links: VecDeque<String>,
    seeds: VecDeque<String>,
    enqueued: HashSet<String>,
}

impl Frontier {
    fn new(start: &str, seeds: &[String], site_host: &str) -> Self {
        let mut frontier = Self {
            links: VecDeque::new(),
            seeds: VecDeque::new(),
            enqueued: HashSet::new(),
        };
        frontier.push_link(start);
        for seed in seeds {
            let node = normalize_node_url(seed);
            if is_internal(&node, site_host) && frontier.enqueued.insert(node.clone()) {
                frontier.seeds.push_back(node);
            }
        }
        frontier
    }

    fn push_link(&mut self, url: &str) {
        let node = normalize_node_url(url);
        if self.enqueued.insert(node.clone()) {
            self.links.push_back(node);
        }
    }

    fn pop(&mut self) -> Option<String> {
        self.links.pop_front().or_else(|| self.seeds.pop_front())
    }
}

fn is_internal(url: &str, site_host: &str) -> bool {
    host_of(url).is_some_and(|h| same_site(&h, site_host))
}

impl Crawler {
    /// Creates a crawler.
    pub fn new(fetcher: PageFetcher, keywords: Arc<KeywordSet>, stats: Arc<ScanStats>) -> Self {
        Self {
            fetcher,
            keywords,
            stats,
        }
    }

    /// The page fetcher.
    pub fn fetcher(&self) -> &PageFetcher {
        &self.fetcher
    }

    async fn try_fetch(&self, url: &str) -> Option<FetchedPage> {
        match self.fetcher.fetch(url).await {
            Ok(page) => Some(page),
            Err(e) => {
                debug!("Skipping {}: {:#}", url, e);
                self.stats.increment(ErrorType::CrawlFetchFailed);
                None
            }
        }
    }

    /// Breadth-first crawl from `start_url`, building the directed link graph.
    ///
    /// Links found on pages are crawled before sitemap `seeds`; seeds are added
    /// as nodes only when fetched. At most `max_pages` pages are fetched.
    pub async fn crawl_graph(&self, start_url: &str, seeds: &[String], max_pages: usize) -> LinkGraph {
        let mut graph = LinkGraph::new();
        let Some(site_host) = host_of(start_url) else {
            return graph;
        };
        graph.add_node(start_url);

        let mut frontier = Frontier::new(start_url, seeds, &site_host);
        let mut fetched = 0;
        while fetched < max_pages {
            let Some(url) = frontier.pop() else {
                break;
            };
            fetched += 1;
            let Some(page) = self.try_fetch(&url).await else {
                continue;
            };
            graph.add_node(&url);
            let scan = scan_page(&page.body, &page.final_url, &self.keywords);
            for link in scan.links.iter().filter(|l| is_internal(l, &site_host)) {
                graph.add_edge(&url, link);
                frontier.push_link(link);
            }
        }

        info!(
            "Graph crawl of {} fetched {} page(s): {} nodes, {} edges",
            start_url,
            fetched,
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    /// Crawls and analyzes the link graph for orphan pages and isolated clusters.
    pub async fn crawl_and_analyze(
        &self,
        start_url: &str,
        seeds: &[String],
        max_pages: usize,
    ) -> GraphAnalysisResult {
        self.crawl_graph(start_url, seeds, max_pages)
            .await
            .analyze(start_url)
    }

    /// Batched concurrent crawl that harvests keyword hits.
    ///
    /// Fetches up to [`FAST_CRAWL_BATCH_SIZE`] pages at a time and follows
    /// internal links for reachability only.
    pub async fn crawl_fast(&self, start_url: &str, seeds: &[String], max_pages: usize) -> FastCrawl {
        let mut outcome = FastCrawl::default();
        let Some(site_host) = host_of(start_url) else {
            return outcome;
        };
        let mut frontier = Frontier::new(start_url, seeds, &site_host);
        let mut attempted = 0;

        while attempted < max_pages {
            let mut batch = Vec::new();
            while batch.len() < FAST_CRAWL_BATCH_SIZE && attempted + batch.len() < max_pages {
                match frontier.pop() {
                    Some(url) => batch.push(url),
                    None => break,
                }
            }
            if batch.is_empty() {
                break;
            }
            attempted += batch.len();

            let pages = join_all(batch.iter().map(|url| self.try_fetch(url))).await;
            for (url, page) in batch.into_iter().zip(pages) {
                let Some(page) = page else {
                    continue;
                };
                let scan = scan_page(&page.body, &page.final_url, &self.keywords);
                for link in scan.links.iter().filter(|l| is_internal(l, &site_host)) {
                    frontier.push_link(link);
                }
                if let Some(first) = scan.keyword_hits.first() {
                    outcome.hits.push(SearchResult::new(
                        &url,
                        scan.title.as_deref().unwrap_or_default(),
                        &snippet_around(&scan.text, first),
                        ResultSource::Crawl,
                    ));
                }
                outcome.visited.push(url);
            }
        }

        info!(
            "Fast crawl of {} visited {} page(s), {} keyword hit(s)",
            start_url,
            outcome.visited.len(),
            outcome.hits.len()
        );
        outcome
    }

    /// Collects page URLs from robots.txt-declared sitemaps and `/sitemap.xml`.
    ///
    /// Follows nested sitemap indexes up to [`MAX_SITEMAP_INDEX_FANOUT`] extra
    /// documents and keeps at most [`MAX_SITEMAP_URLS`] same-site URLs.
    pub async fn discover_sitemap_urls(&self, base_url: &str) -> Vec<String> {
        let Some(site_host) = host_of(base_url) else {
            return Vec::new();
        };
        let base = base_url.trim_end_matches('/');

        let mut queue: VecDeque<String> = VecDeque::new();
        if let Ok(robots) = self.fetcher.fetch(&format!("{}/robots.txt", base)).await {
            queue.extend(sitemaps_from_robots(&robots.body));
        }
        if queue.is_empty() {
            queue.push_back(format!("{}/sitemap.xml", base));
            queue.push_back(format!("{}/sitemap_index.xml", base));
        }

        let mut seen_docs = HashSet::new();
        let mut urls = Vec::new();
        let mut seen_urls = HashSet::new();
        let mut budget = queue.len() + MAX_SITEMAP_INDEX_FANOUT;

        while let Some(sitemap_url) = queue.pop_front() {
            if budget == 0 || urls.len() >= MAX_SITEMAP_URLS {
                break;
            }
            if !seen_docs.insert(sitemap_url.clone()) {
                continue;
            }
            budget -= 1;
            let page = match self.fetcher.fetch(&sitemap_url).await {
                Ok(page) => page,
                Err(e) => {
                    debug!("Sitemap {} unavailable: {:#}", sitemap_url, e);
                    self.stats.increment(ErrorType::SitemapFetchFailed);
                    continue;
                }
            };
            let document = parse_sitemap(&page.body);
            queue.extend(document.sitemaps);
            for url in document.urls {
                if urls.len() >= MAX_SITEMAP_URLS {
                    break;
                }
                if validate_web_url(&url).is_some()
                    && is_internal(&url, &site_host)
                    && seen_urls.insert(url.clone())
                {
                    urls.push(url);
                }
            }
        }

        info!("Sitemaps of {} listed {} URL(s)", base_url, urls.len());
        urls
    }

    /// Probes [`SUSPICIOUS_PATHS`] and keeps 2xx pages with keyword hits.
    pub async fn probe_paths(&self, base_url: &str) -> Vec<SearchResult> {
        let base = base_url.trim_end_matches('/');
        let mut results = Vec::new();
        for chunk in SUSPICIOUS_PATHS.chunks(FAST_CRAWL_BATCH_SIZE) {
            let urls: Vec<String> = chunk.iter().map(|p| format!("{}{}", base, p)).collect();
            // 404s are the expected outcome here, so failures are not counted
            let pages = join_all(urls.iter().map(|u| self.fetcher.fetch(u))).await;
            for (url, page) in urls.iter().zip(pages) {
                let Ok(page) = page else {
                    continue;
                };
                let scan = scan_page(&page.body, &page.final_url, &self.keywords);
                if let Some(first) = scan.keyword_hits.first() {
                    results.push(SearchResult::new(
                        url,
                        scan.title.as_deref().unwrap_or_default(),
                        &snippet_around(&scan.text, first),
                        ResultSource::PathProbe,
                    ));
                }
            }
        }
        info!("Path probing of {} found {} hit(s)", base_url, results.len());
        results
    }
}
