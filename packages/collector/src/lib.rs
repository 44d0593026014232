//! Passive HTTP Artifact Collector
//!
//! Mines every HTTP exchange a scanner observes for reconnaissance data:
//! path segments, file names, parameter names and values, and the keys and
//! values of JSON payloads. Everything is recorded per host and kept for
//! browsing later.
//!
//! # Design Philosophy
//!
//! **"Never slow the scanner down"**
//!
//! - Extraction never fails; malformed input contributes nothing
//! - Identical payloads are parsed once, across all threads
//! - Persistence happens in the background
//! - The hosting scanner decides scope and decoding
//!
//! # Usage
//!
//! ```rust,ignore
//! use collector::{Collector, CollectorConfig, MemoryStore, ScopeFilter};
//!
//! let config = CollectorConfig::from_env()?;
//! let filter = ScopeFilter::from_config(&config);
//! let collector = Collector::with_config(Arc::new(MemoryStore::new()), filter, config)?;
//!
//! // From any scanner thread
//! let result = collector.collect(&exchange);
//!
//! // Browse what was collected
//! collector.flush().await;
//! let rows = collector.store().query(&HostQuery::Any, Category::AllParam, 100).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (DataStore, ExchangeFilter, ScanCheck)
//! - [`types`] - Exchanges, buckets, digests and configuration
//! - [`pipeline`] - Per-exchange extraction and the [`Collector`]
//! - [`cache`] - Content-hash memoization of parsed payloads
//! - [`stores`] - Storage implementations (MemoryStore, SqliteStore)
//! - [`filters`] - Exchange filter implementations
//! - [`testing`] - Test doubles for stores and filters

pub mod cache;
pub mod error;
pub mod filters;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{CollectorError, Result};
pub use traits::{
    filter::ExchangeFilter,
    scan_check::ScanCheck,
    store::{DataStore, HostQuery, Row},
};
pub use types::{
    buckets::{Bucket, Category, ExtractionResult, ValueMultimap},
    config::CollectorConfig,
    digest::{hash, Digest},
    exchange::{HttpExchange, HttpParameter, HttpRequest, HttpResponse, ParamKind},
    issue::{AuditIssue, AuditResult, ConsolidationAction, InsertionPoint},
};

// Re-export pipeline components
pub use pipeline::{
    // Entry point
    BodyOutcome, Collector, CollectorStats,
    // Extraction steps
    extract_json, normalize_param_name, scrape_fields, split_path, traverse, FieldScrape,
    JsonSkip, PathParts,
};

// Re-export caches
pub use cache::{BoundedCache, CacheEntry, ContentCache, MemoryCache};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;

// Re-export filters
pub use filters::ScopeFilter;
