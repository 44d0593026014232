//! Configuration for the collector.

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{CollectorError, Result};

/// Static-file suffixes that carry nothing worth mining.
pub const DEFAULT_EXCLUDED_SUFFIXES: &[&str] = &[
    "3g2", "3gp", "7z", "aac", "avi", "bmp", "css", "eot", "flv", "gif", "gz", "ico", "jpeg",
    "jpg", "m4a", "mkv", "mov", "mp3", "mp4", "mpeg", "ogg", "otf", "pdf", "png", "rar", "svg",
    "tar", "tif", "tiff", "ttf", "wav", "webm", "webp", "woff", "woff2", "zip",
];

/// Configuration for the collection pipeline and its reference filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Origin label passed to the exchange filter for every passive audit.
    ///
    /// Default: `"Proxy"`.
    pub origin: String,

    /// Origins whose traffic is mined (used by [`ScopeFilter`](crate::ScopeFilter)).
    ///
    /// Default: `["Proxy"]`.
    #[serde(default)]
    pub scope: Vec<String>,

    /// Upper bound on content cache entries.
    ///
    /// `None` keeps every entry for the life of the process.
    pub cache_capacity: Option<u64>,

    /// Hosts never mined. `*.example.com` matches subdomains only.
    #[serde(default)]
    pub blocked_hosts: Vec<String>,

    /// Path suffixes (without the dot) never mined.
    #[serde(default)]
    pub excluded_suffixes: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            origin: "Proxy".to_string(),
            scope: vec!["Proxy".to_string()],
            cache_capacity: None,
            blocked_hosts: vec![],
            excluded_suffixes: DEFAULT_EXCLUDED_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CollectorConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// Reads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(origin) = env::var("COLLECTOR_ORIGIN") {
            config.origin = origin.trim().to_string();
        }
        if let Ok(scope) = env::var("COLLECTOR_SCOPE") {
            config.scope = split_list(&scope);
        }
        if let Ok(capacity) = env::var("COLLECTOR_CACHE_CAPACITY") {
            let capacity = capacity.trim().parse::<u64>().map_err(|e| {
                CollectorError::Config(format!("COLLECTOR_CACHE_CAPACITY must be a number: {e}"))
            })?;
            config.cache_capacity = Some(capacity);
        }
        if let Ok(hosts) = env::var("COLLECTOR_BLOCKED_HOSTS") {
            config.blocked_hosts = split_list(&hosts);
        }
        if let Ok(suffixes) = env::var("COLLECTOR_EXCLUDED_SUFFIXES") {
            config.excluded_suffixes = split_list(&suffixes);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.origin.is_empty() {
            return Err(CollectorError::Config("origin must not be empty".into()));
        }
        if self.cache_capacity == Some(0) {
            return Err(CollectorError::Config(
                "cache capacity must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Set the origin label.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set the origins in scope.
    pub fn with_scope(mut self, scope: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.scope = scope.into_iter().map(Into::into).collect();
        self
    }

    /// Bound the content cache.
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Block a host pattern.
    pub fn block_host(mut self, pattern: impl Into<String>) -> Self {
        self.blocked_hosts.push(pattern.into());
        self
    }

    /// Replace the excluded suffix list.
    pub fn with_excluded_suffixes(
        mut self,
        suffixes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.excluded_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(|c| c == ',' || c == '|')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
