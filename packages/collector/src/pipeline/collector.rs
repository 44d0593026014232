//! The Collector - per-exchange extraction entry point.
//!
//! One call per observed exchange, from any number of scanner threads:
//!
//! 1. Split the request path into path segments, files and the full path
//! 2. Validate and decode parameters; JSON-looking values are traversed
//! 3. Digest the response body; cached bodies are merged without parsing,
//!    new ones are tried as JSON, then scraped as HTML
//! 4. New exchanges are handed to the [`DataStore`] in the background
//!
//! Only the content cache is shared between calls. Everything else is local
//! to the exchange being processed.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use url::Url;

use super::html::{scrape_fields, FieldScrape};
use super::json::{extract_json, JsonSkip};
use super::params::normalize_param_name;
use super::path::split_path;
use crate::cache::{self, CacheEntry, ContentCache};
use crate::error::Result;
use crate::traits::{filter::ExchangeFilter, scan_check::ScanCheck, store::DataStore};
use crate::types::{
    buckets::{Bucket, Category, ExtractionResult, ValueMultimap},
    config::CollectorConfig,
    digest::Digest,
    exchange::{HttpExchange, HttpRequest, HttpResponse},
    issue::{consolidate_by_name, AuditIssue, AuditResult, ConsolidationAction, InsertionPoint},
};

/// How a response body was interpreted.
#[derive(Debug, Clone)]
pub enum BodyOutcome {
    /// Seen before; served from the content cache.
    Cached(Arc<CacheEntry>),
    /// Parsed as JSON (and now cached).
    Json(Arc<CacheEntry>),
    /// Not JSON; input fields scraped from it as HTML.
    Html(FieldScrape),
}

/// Running counters, shared with background persistence tasks.
#[derive(Debug, Default)]
struct Counters {
    exchanges: AtomicU64,
    excluded: AtomicU64,
    cache_hits: AtomicU64,
    json_parses: AtomicU64,
    html_scrapes: AtomicU64,
    persisted: AtomicU64,
    persist_failures: AtomicU64,
}

/// Point-in-time copy of the collector's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectorStats {
    /// Exchanges handed to `collect`.
    pub exchanges: u64,
    /// Exchanges the filter excluded.
    pub excluded: u64,
    /// Payloads served from the content cache.
    pub cache_hits: u64,
    /// JSON parse attempts (cache misses).
    pub json_parses: u64,
    /// Bodies scraped as HTML.
    pub html_scrapes: u64,
    /// Successful store inserts.
    pub persisted: u64,
    /// Failed store inserts.
    pub persist_failures: u64,
}

/// Per-exchange accumulator.
#[derive(Debug, Default)]
struct Harvest {
    paths: BTreeSet<String>,
    full_paths: BTreeSet<String>,
    files: BTreeSet<String>,
    params: BTreeSet<String>,
    values: ValueMultimap,
}

impl Harvest {
    fn merge_entry(&mut self, entry: &CacheEntry) {
        self.params.extend(entry.json_keys.iter().cloned());
        self.values.extend_from(&entry.json_values);
    }

    fn merge_scrape(&mut self, scrape: FieldScrape) {
        self.params.extend(scrape.names);
        self.values.extend_from(&scrape.values);
    }

    /// Buckets handed to the store: every non-empty set, plus the
    /// cross-host aggregates.
    fn persisted_buckets(&self) -> ExtractionResult {
        let mut buckets = ExtractionResult::new();
        buckets.insert_with_aggregate(Category::Path, &self.paths);
        buckets.insert_with_aggregate(Category::FullPath, &self.full_paths);
        buckets.insert_with_aggregate(Category::File, &self.files);
        buckets.insert_with_aggregate(Category::Param, &self.params);
        buckets.insert(Category::Value, Bucket::Values(self.values.clone()));
        buckets
    }

    /// What the caller sees for the current exchange.
    fn into_current(self) -> ExtractionResult {
        let mut result = ExtractionResult::new();
        result.insert(Category::Param, Bucket::Names(self.params));
        result.insert(Category::Value, Bucket::Values(self.values));
        result.insert(Category::Path, Bucket::Names(self.paths));
        result
    }
}

/// Passive collector of paths, files, parameters and JSON keys.
///
/// # Example
///
/// ```rust,ignore
/// let collector = Collector::new(Arc::new(MemoryStore::new()), ScopeFilter::default())?;
///
/// let result = collector.collect(&exchange);
/// if let Some(params) = result.names(Category::Param) {
///     println!("{params:?}");
/// }
///
/// // On shutdown, let background inserts finish
/// collector.flush().await;
/// ```
pub struct Collector<S: DataStore + 'static, F: ExchangeFilter> {
    store: Arc<S>,
    filter: F,
    cache: Arc<dyn ContentCache>,
    config: CollectorConfig,
    runtime: Handle,
    tasks: TaskTracker,
    counters: Arc<Counters>,
}

impl<S: DataStore + 'static, F: ExchangeFilter> Collector<S, F> {
    /// Create a collector with default configuration.
    ///
    /// Must be called from within a tokio runtime; persistence tasks are
    /// spawned on it.
    pub fn new(store: Arc<S>, filter: F) -> Result<Self> {
        Self::with_config(store, filter, CollectorConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(store: Arc<S>, filter: F, config: CollectorConfig) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current()?;
        let cache = cache::from_capacity(config.cache_capacity);

        info!(
            origin = %config.origin,
            cache_capacity = ?config.cache_capacity,
            "collector ready"
        );

        Ok(Self {
            store,
            filter,
            cache,
            config,
            runtime,
            tasks: TaskTracker::new(),
            counters: Arc::new(Counters::default()),
        })
    }

    /// Replace the content cache.
    pub fn with_cache(mut self, cache: Arc<dyn ContentCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Spawn persistence tasks on a different runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = runtime;
        self
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// The content cache shared by every call.
    pub fn cache(&self) -> &Arc<dyn ContentCache> {
        &self.cache
    }

    /// The store collected data is persisted to.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CollectorStats {
        let c = &self.counters;
        CollectorStats {
            exchanges: c.exchanges.load(Ordering::Relaxed),
            excluded: c.excluded.load(Ordering::Relaxed),
            cache_hits: c.cache_hits.load(Ordering::Relaxed),
            json_parses: c.json_parses.load(Ordering::Relaxed),
            html_scrapes: c.html_scrapes.load(Ordering::Relaxed),
            persisted: c.persisted.load(Ordering::Relaxed),
            persist_failures: c.persist_failures.load(Ordering::Relaxed),
        }
    }

    /// Wait for every background insert spawned so far.
    ///
    /// Not meant to be called concurrently with itself.
    pub async fn flush(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Extract everything one exchange has to offer.
    ///
    /// Never fails: malformed URLs, JSON or HTML simply contribute nothing.
    /// New exchanges are also persisted in the background; that data is not
    /// necessarily visible in the store when this returns.
    pub fn collect(&self, exchange: &HttpExchange) -> ExtractionResult {
        self.counters.exchanges.fetch_add(1, Ordering::Relaxed);
        let mut harvest = Harvest::default();

        match (&exchange.request, &exchange.response) {
            (Some(request), response) => {
                if self.filter.is_excluded(exchange, &self.config.origin) {
                    self.counters.excluded.fetch_add(1, Ordering::Relaxed);
                    debug!(url = %request.url, "exchange excluded");
                } else {
                    let host = self.collect_request(request, &mut harvest);
                    if let Some(response) = response {
                        self.collect_response(host, response, &mut harvest);
                    }
                }
            }
            (None, Some(response)) => {
                if let Some(entry) = self.cached(&Digest::of(&response.body)) {
                    harvest.merge_entry(&entry);
                }
            }
            (None, None) => {}
        }

        harvest.into_current()
    }

    /// Cache-assisted JSON interpretation of a payload.
    ///
    /// `None` when the payload is not a JSON object with extractable members.
    pub fn json_data(&self, bytes: &[u8]) -> Option<Arc<CacheEntry>> {
        let digest = Digest::of(bytes);
        if let Some(entry) = self.cached(&digest) {
            return Some(entry);
        }
        self.parse_json(digest, bytes).ok()
    }

    /// Interpret a response body: cache, then JSON, then HTML.
    pub fn classify_body(&self, body: &[u8]) -> BodyOutcome {
        let digest = Digest::of(body);
        match self.cached(&digest) {
            Some(entry) => BodyOutcome::Cached(entry),
            None => self.interpret_uncached(digest, body),
        }
    }

    fn collect_request(&self, request: &HttpRequest, harvest: &mut Harvest) -> Option<String> {
        let url = match Url::parse(&request.url) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(url = %request.url, error = %e, "request URL does not parse");
                None
            }
        };

        if let Some(url) = &url {
            let parts = split_path(url.path());
            harvest.paths.extend(parts.paths);
            harvest.files.extend(parts.files);
            harvest.full_paths.extend(parts.full_path);
        }

        for param in &request.parameters {
            let decoded = self.filter.decode_parameter(&param.name);
            let Some(name) = normalize_param_name(&decoded) else {
                continue;
            };
            harvest.params.insert(name.clone());

            let value = self.filter.decode_parameter(&param.value);
            if value.trim().is_empty() {
                continue;
            }
            match self.json_data(value.as_bytes()) {
                Some(entry) => harvest.merge_entry(&entry),
                None => {
                    harvest.values.insert(name, value);
                }
            }
        }

        url.and_then(|u| u.host_str().map(str::to_lowercase))
    }

    fn collect_response(&self, host: Option<String>, response: &HttpResponse, harvest: &mut Harvest) {
        let digest = Digest::of(&response.body);

        // Seen before: merge and stop, nothing new to persist
        if let Some(entry) = self.cached(&digest) {
            harvest.merge_entry(&entry);
            return;
        }

        match self.interpret_uncached(digest, &response.body) {
            BodyOutcome::Cached(entry) | BodyOutcome::Json(entry) => harvest.merge_entry(&entry),
            BodyOutcome::Html(scrape) => harvest.merge_scrape(scrape),
        }

        let buckets = harvest.persisted_buckets();
        if buckets.is_empty() {
            return;
        }
        match host {
            Some(host) => self.persist(host, buckets),
            None => debug!("no host for collected data, not persisting"),
        }
    }

    fn cached(&self, digest: &Digest) -> Option<Arc<CacheEntry>> {
        let entry = self.cache.get(digest)?;
        self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
        Some(entry)
    }

    fn parse_json(&self, digest: Digest, bytes: &[u8]) -> std::result::Result<Arc<CacheEntry>, JsonSkip> {
        self.counters.json_parses.fetch_add(1, Ordering::Relaxed);
        let entry = Arc::new(extract_json(bytes)?);
        // A racing miss may have stored an identical entry already
        self.cache.put(digest, Arc::clone(&entry));
        Ok(entry)
    }

    fn interpret_uncached(&self, digest: Digest, body: &[u8]) -> BodyOutcome {
        match self.parse_json(digest, body) {
            Ok(entry) => BodyOutcome::Json(entry),
            Err(skip) => {
                debug!(%digest, reason = %skip, "body is not JSON, scraping fields");
                self.counters.html_scrapes.fetch_add(1, Ordering::Relaxed);
                BodyOutcome::Html(scrape_fields(&String::from_utf8_lossy(body)))
            }
        }
    }

    /// Hand buckets to the store without waiting for it.
    fn persist(&self, host: String, buckets: ExtractionResult) {
        let store = Arc::clone(&self.store);
        let counters = Arc::clone(&self.counters);

        self.tasks.spawn_on(
            async move {
                match store.insert(&host, &buckets).await {
                    Ok(()) => {
                        counters.persisted.fetch_add(1, Ordering::Relaxed);
                        debug!(host = %host, categories = buckets.len(), "collected data stored");
                    }
                    Err(e) => {
                        counters.persist_failures.fetch_add(1, Ordering::Relaxed);
                        warn!(host = %host, error = %e, "storing collected data failed");
                    }
                }
            },
            &self.runtime,
        );
    }
}

impl<S: DataStore + 'static, F: ExchangeFilter> ScanCheck for Collector<S, F> {
    fn active_audit(&self, _exchange: &HttpExchange, _insertion_point: &InsertionPoint) -> AuditResult {
        AuditResult::empty()
    }

    fn passive_audit(&self, exchange: &HttpExchange) -> AuditResult {
        let result = self.collect(exchange);
        debug!(categories = result.len(), "passive audit finished");
        AuditResult::empty()
    }

    fn consolidate_issues(&self, new: &AuditIssue, existing: &AuditIssue) -> ConsolidationAction {
        consolidate_by_name(new, existing)
    }
}
