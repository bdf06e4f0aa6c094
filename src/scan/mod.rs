//! Scan orchestration.
//!
//! [`Scanner::perform_scan`] runs the pipeline for one domain in a fixed
//! order:
//!
//! 1. domain intelligence (RDAP + DNSBL)
//! 2. subdomain enumeration, then an optional homepage scan of active subdomains
//! 3. search aggregation
//! 4. comprehensive scans only: sitemaps, fast crawl, link graph, unindexed pages
//! 5. merge and deduplicate candidates
//! 6. classification
//! 7. verification against the live site
//! 8. final conclusion
//!
//! Nothing in the pipeline is fatal. Each failure is logged, counted in
//! [`ScanStats`] and leaves its part of the [`ScanResult`] empty. Progress is
//! published to the scanner's [`ProgressSink`] between steps.

mod conclusion;
mod deadline;
mod discovery;
mod types;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};

pub use conclusion::{ConclusionStats, FinalConclusion, RiskStatus};
pub use deadline::Deadline;
pub use discovery::unindexed_pages;
pub use types::{CategoryResult, ScanItem, ScanRequest, ScanResult};

use crate::cache::ScanCaches;
use crate::classify::{category_name, CandidateClassifier, Classifier};
use crate::config::{ScanConfig, ScanType};
use crate::crawl::{scan_page, Crawler, PageFetcher};
use crate::detection::{IllegalContentDetector, Taxonomy};
use crate::dns::HostResolver;
use crate::domain::{normalize_domain_input, registrable_domain};
use crate::error_handling::{ErrorType, InitializationError, ScanStats};
use crate::intel::DomainIntel;
use crate::keywords::KeywordSet;
use crate::progress::{LogProgress, ProgressSink, ProgressUpdate};
use crate::search::{engines_for, ResultSource, SearchAggregator, SearchResult, SerpApiClient};
use crate::subdomain::{SubdomainEnumerator, SubdomainReport};
use crate::urls::deduplicate_results;
use crate::utils::{sanitize_and_truncate_error_message, snippet_around};
use crate::verify::{BrowserLauncher, BrowserSession, ContentVerifier, ScopedSession};

/// Number of top-level phases reported as progress.
const PHASES: usize = 8;

/// Runs scans. One instance is shared by every scan in the process.
///
/// The HTTP client, resolver and caches are shared; everything else a scan
/// touches (stats, browser session, deadline) is created per scan.
pub struct Scanner {
    client: Arc<reqwest::Client>,
    resolver: Arc<dyn HostResolver>,
    caches: ScanCaches,
    keywords: Arc<KeywordSet>,
    taxonomy: Arc<Taxonomy>,
    model: Option<Arc<dyn Classifier>>,
    launcher: Option<Arc<dyn BrowserLauncher>>,
    progress: Arc<dyn ProgressSink>,
}

/// Per-scan state handed to each phase.
struct ScanContext<'a> {
    config: &'a ScanConfig,
    scan_id: String,
    /// Normalized target, possibly with a port
    target: String,
    stats: Arc<ScanStats>,
    deadline: Deadline,
    fetcher: PageFetcher,
}

/// Strips a trailing `:port`.
fn host_without_port(target: &str) -> &str {
    match target.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => target,
    }
}

/// Records the first budget expiry of a scan; later expiries are no-ops.
fn mark_timed_out(stats: &ScanStats, result: &mut ScanResult, warning: String) {
    if result.timed_out {
        return;
    }
    stats.increment(ErrorType::WallClockBudgetExceeded);
    result.timed_out = true;
    result.warnings.push(warning);
}

impl Scanner {
    /// Creates a scanner with in-memory caches, the built-in keyword lists,
    /// no trained model, no browser and log-only progress.
    pub fn new(client: Arc<reqwest::Client>, resolver: Arc<dyn HostResolver>) -> Self {
        Self {
            client,
            resolver,
            caches: ScanCaches::default(),
            keywords: Arc::new(KeywordSet::hardcoded()),
            taxonomy: Arc::new(Taxonomy::default()),
            model: None,
            launcher: None,
            progress: Arc::new(LogProgress),
        }
    }

    pub fn with_caches(mut self, caches: ScanCaches) -> Self {
        self.caches = caches;
        self
    }

    /// Replaces the keyword lists (e.g. merged with keywords from a database).
    pub fn with_keywords(mut self, keywords: Arc<KeywordSet>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_taxonomy(mut self, taxonomy: Arc<Taxonomy>) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    /// Trained classifier consulted before the keyword heuristic.
    pub fn with_classifier(mut self, model: Arc<dyn Classifier>) -> Self {
        self.model = Some(model);
        self
    }

    /// Browser used for deep verification.
    pub fn with_browser(mut self, launcher: Arc<dyn BrowserLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    fn report(&self, ctx: &ScanContext<'_>, phase: &str, step: usize, message: impl Into<String>) {
        self.progress
            .report_progress(&ctx.scan_id, ProgressUpdate::running(phase, step, PHASES, message));
    }

    /// Checks the deadline before `next`. The first expiry marks the result
    /// as timed out.
    fn budget_exhausted(&self, ctx: &ScanContext<'_>, result: &mut ScanResult, next: &str) -> bool {
        if !ctx.deadline.expired() {
            return false;
        }
        if !result.timed_out {
            warn!(
                "Scan {} ran out of its wall-clock budget after {:.1}s, skipping {}",
                ctx.scan_id,
                ctx.deadline.elapsed().as_secs_f64(),
                next
            );
        }
        mark_timed_out(&ctx.stats, result, format!("Wall-clock budget exhausted before {}", next));
        true
    }

    /// Scans one domain. Never fails: problems are recorded in the result.
    pub async fn perform_scan(&self, request: &ScanRequest, config: &ScanConfig) -> ScanResult {
        let started_at = Utc::now();
        let scan_id = request
            .scan_id
            .clone()
            .unwrap_or_else(|| format!("scan_{}", started_at.timestamp_millis()));

        let target = match normalize_domain_input(&request.domain) {
            Ok(target) => target,
            Err(e) => {
                let message = sanitize_and_truncate_error_message(&format!("{:#}", e));
                warn!("Scan {} rejected: {}", scan_id, message);
                let mut result =
                    ScanResult::empty(&scan_id, request.domain.trim(), request.scan_type, started_at);
                result.warnings.push(message);
                result.finished_at = Utc::now();
                self.progress
                    .report_progress(&scan_id, ProgressUpdate::completed("Scan aborted: invalid domain"));
                return result;
            }
        };

        info!("Starting {:?} scan {} of {}", request.scan_type, scan_id, target);
        let ctx = ScanContext {
            config,
            scan_id: scan_id.clone(),
            target: target.clone(),
            stats: Arc::new(ScanStats::new()),
            deadline: Deadline::start(config.wall_clock_budget()),
            fetcher: PageFetcher::new(self.client.clone()),
        };
        let mut result = ScanResult::empty(&scan_id, &target, request.scan_type, started_at);
        let search = SearchAggregator::new(
            SerpApiClient::new(self.client.clone(), &config.endpoints.serpapi_url),
            self.caches.search.clone(),
            config,
            self.keywords.clone(),
            ctx.stats.clone(),
        );
        let mut candidates: Vec<SearchResult> = Vec::new();

        // 1. Domain intelligence
        self.report(&ctx, "intelligence", 1, "Gathering domain intelligence");
        let intel = DomainIntel::new(
            self.client.clone(),
            self.resolver.clone(),
            &self.caches,
            config,
            ctx.stats.clone(),
        );
        result.domain_info = intel.gather(host_without_port(&target)).await;

        // 2. Subdomains
        if !self.budget_exhausted(&ctx, &mut result, "subdomain enumeration") {
            self.report(&ctx, "subdomains", 2, "Enumerating subdomains");
            result.subdomain_results = self.subdomains(&ctx, &search, request).await;
            candidates.extend(result.subdomain_results.content_hits.iter().cloned());
        }

        // 3. Search
        let mut indexed = Vec::new();
        if !self.budget_exhausted(&ctx, &mut result, "search") {
            self.report(&ctx, "search", 3, "Searching for indexed pages");
            let engines = engines_for(request.scan_type, config);
            indexed = search
                .search(&target, &request.keys, &engines, config.use_comprehensive_query)
                .await;
            if config.enable_backlink_analysis {
                result.backlinks = search.backlinks(host_without_port(&target), &request.keys).await;
            }
        }

        // 4. Site discovery
        if request.scan_type == ScanType::Comprehensive
            && !self.budget_exhausted(&ctx, &mut result, "site discovery")
        {
            self.report(&ctx, "crawl", 4, "Crawling the site");
            candidates.extend(self.discover(&ctx, &mut result, &indexed).await);
        }

        // 5. Merge
        self.report(&ctx, "merge", 5, "Merging candidates");
        let merged = deduplicate_results(indexed.into_iter().chain(candidates).collect(), &self.keywords);
        debug!("Scan {} has {} unique candidate(s)", scan_id, merged.len());

        // 6. Classification
        self.report(&ctx, "classification", 6, format!("Classifying {} candidate(s)", merged.len()));
        let classifier = CandidateClassifier::new(self.model.clone(), self.keywords.clone(), ctx.stats.clone());
        let mut items: Vec<ScanItem> = merged
            .into_iter()
            .filter_map(|candidate| {
                let text = format!("{} {}", candidate.cached_text(), candidate.url);
                classifier.classify(&text).map(|category| ScanItem {
                    result: candidate,
                    category,
                    verification: None,
                })
            })
            .collect();

        // 7. Verification
        if config.enable_realtime_verification
            && !items.is_empty()
            && !self.budget_exhausted(&ctx, &mut result, "verification")
        {
            self.verify_items(&ctx, &mut result, &mut items).await;
        }

        // 8. Conclusion
        self.report(&ctx, "conclusion", 8, "Computing conclusion");
        let stats = ConclusionStats::tally(
            items
                .iter()
                .map(|item| item.verification.as_ref().map(|v| v.verification_status)),
        );
        result.final_conclusion = FinalConclusion::compute(stats, &config.tuning);

        let mut categories: BTreeMap<String, CategoryResult> = BTreeMap::new();
        for item in items {
            categories
                .entry(item.category.clone())
                .or_insert_with(|| CategoryResult {
                    name: category_name(&item.category),
                    items: Vec::new(),
                })
                .items
                .push(item);
        }
        result.categories = categories;
        result.error_counts = ctx.stats.snapshot();
        result.finished_at = Utc::now();

        info!(
            "Scan {} of {} finished: {:?}, risk {} ({} item(s), {} verified{})",
            scan_id,
            target,
            result.final_conclusion.status,
            result.final_conclusion.risk_score,
            result.final_conclusion.stats.total,
            result.verified_items,
            if result.timed_out { ", timed out" } else { "" }
        );
        self.progress.report_progress(
            &scan_id,
            ProgressUpdate::completed(format!(
                "Scan finished with risk score {}",
                result.final_conclusion.risk_score
            )),
        );
        result
    }

    async fn subdomains(
        &self,
        ctx: &ScanContext<'_>,
        search: &SearchAggregator,
        request: &ScanRequest,
    ) -> SubdomainReport {
        let host = host_without_port(&ctx.target);
        let Some(domain) = registrable_domain(host) else {
            debug!("Skipping subdomain enumeration for {}", host);
            return SubdomainReport::default();
        };
        let enumerator = SubdomainEnumerator::new(
            self.resolver.clone(),
            self.client.clone(),
            &ctx.config.endpoints.crtsh_url,
            ctx.stats.clone(),
        );
        let via_search = ctx
            .config
            .enable_subdomain_search
            .then_some((search, &request.keys));
        let mut report = enumerator
            .enumerate(&domain, ctx.config.enable_subdomain_dns_lookup, via_search)
            .await;
        if ctx.config.enable_subdomain_content_scan {
            report.content_hits = self.scan_subdomain_content(ctx, &report).await;
        }
        report
    }

    /// Fetches the homepage of up to `max_subdomains_to_scan` active subdomains.
    async fn scan_subdomain_content(&self, ctx: &ScanContext<'_>, report: &SubdomainReport) -> Vec<SearchResult> {
        let hosts: Vec<&str> = report
            .active()
            .take(ctx.config.max_subdomains_to_scan)
            .collect();
        let mut hits = Vec::new();
        for host in hosts {
            let url = ctx.config.site_url(host);
            match ctx.fetcher.fetch(&url).await {
                Ok(page) => {
                    let scan = scan_page(&page.body, &page.final_url, &self.keywords);
                    if let Some(first) = scan.keyword_hits.first() {
                        hits.push(SearchResult::new(
                            &page.final_url,
                            scan.title.as_deref().unwrap_or(host),
                            &snippet_around(&scan.text, first),
                            ResultSource::Subdomain,
                        ));
                    }
                }
                Err(e) => {
                    debug!("Subdomain {} not scanned: {:#}", host, e);
                    ctx.stats.increment(ErrorType::SubdomainContentScanError);
                }
            }
        }
        info!("Subdomain content scan found {} hit(s)", hits.len());
        hits
    }

    /// Sitemaps, fast crawl, link graph and unindexed pages. Returns the new
    /// candidates.
    async fn discover(
        &self,
        ctx: &ScanContext<'_>,
        result: &mut ScanResult,
        indexed: &[SearchResult],
    ) -> Vec<SearchResult> {
        let config = ctx.config;
        let base = config.site_url(&ctx.target);
        let crawler = Crawler::new(ctx.fetcher.clone(), self.keywords.clone(), ctx.stats.clone());

        let sitemap_urls = if config.enable_sitemap_analysis {
            crawler.discover_sitemap_urls(&base).await
        } else {
            Vec::new()
        };

        let mut crawl_hits = Vec::new();
        if config.enable_deep_crawling && !self.budget_exhausted(ctx, result, "crawling") {
            let fast = crawler
                .crawl_fast(&base, &sitemap_urls, config.max_crawl_pages)
                .await;
            result.total_pages = fast.visited.len();
            crawl_hits = fast.hits;
        }

        if config.enable_graph_analysis && !self.budget_exhausted(ctx, result, "graph analysis") {
            let graph = crawler
                .crawl_and_analyze(&base, &sitemap_urls, config.max_crawl_pages)
                .await;
            result.total_pages = result.total_pages.max(graph.total_nodes);
            result.graph_analysis = graph;
        }

        let path_hits = if config.enable_path_discovery && !self.budget_exhausted(ctx, result, "path probing") {
            crawler.probe_paths(&base).await
        } else {
            Vec::new()
        };

        if config.enable_unindexed_discovery {
            result.unindexed_pages = unindexed_pages(indexed, &crawl_hits, &sitemap_urls, &path_hits, &self.keywords);
            info!(
                "Found {} page(s) not indexed by search",
                result.unindexed_pages.len()
            );
        }

        let mut found = crawl_hits;
        found.extend(path_hits);
        found.extend(result.unindexed_pages.iter().cloned());
        found
    }

    fn verifier(&self, ctx: &ScanContext<'_>) -> ContentVerifier {
        let config = ctx.config;
        let verifier = ContentVerifier::new(
            ctx.fetcher.clone(),
            self.keywords.clone(),
            config.tuning.clone(),
            ctx.stats.clone(),
        );
        if !config.enable_illegal_content_detection {
            return verifier;
        }
        let detector = IllegalContentDetector::from_config(self.taxonomy.clone(), self.keywords.clone(), config);
        verifier.with_detector(
            Arc::new(detector),
            config.enable_api_cache.then(|| self.caches.analysis.clone()),
            config.cache_ttl(),
        )
    }

    async fn open_session(&self) -> Result<ScopedSession, InitializationError> {
        match &self.launcher {
            Some(launcher) => Ok(ScopedSession::new(launcher.launch().await?)),
            None => Ok(ScopedSession::none()),
        }
    }

    /// Verifies items in collection order until done or out of time.
    async fn verify_items(&self, ctx: &ScanContext<'_>, result: &mut ScanResult, items: &mut [ScanItem]) {
        let mut session = match self.open_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Browser unavailable, verification disabled for scan {}: {}", ctx.scan_id, e);
                ctx.stats.increment(ErrorType::BrowserUnavailable);
                result.warnings.push(sanitize_and_truncate_error_message(&format!(
                    "Verification disabled: {}",
                    e
                )));
                return;
            }
        };
        if !session.is_active() {
            debug!("No browser configured, verification stays on the quick tier");
        }
        result.verified_scan = true;

        let verifier = self.verifier(ctx);
        let total = items.len();
        for (index, item) in items.iter_mut().enumerate() {
            if ctx.deadline.expired() {
                warn!(
                    "Scan {} ran out of its wall-clock budget after verifying {} of {} item(s)",
                    ctx.scan_id, index, total
                );
                mark_timed_out(
                    &ctx.stats,
                    result,
                    format!("Wall-clock budget exhausted after verifying {} of {} item(s)", index, total),
                );
                break;
            }
            self.progress.report_progress(
                &ctx.scan_id,
                ProgressUpdate::running("verification", index + 1, total, format!("Verifying {}", item.result.url)),
            );
            let verification = verifier
                .verify(
                    &item.result.url,
                    &item.result.cached_text(),
                    session.get().map(|s| s as &mut dyn BrowserSession),
                    ctx.config.use_tiered_verification,
                )
                .await;
            item.verification = Some(verification);
            result.verified_items += 1;
        }
    }
}
