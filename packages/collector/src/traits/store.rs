//! Storage trait for collected artifacts.
//!
//! The pipeline only ever calls [`DataStore::insert`], and never waits on
//! it. The read side (`query`, `list_hosts`, `suggest_hosts`) serves the
//! browsing front ends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::buckets::{Category, ExtractionResult};

/// Which hosts a query covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostQuery {
    /// Every host; counts are summed across hosts.
    Any,
    /// One host (lowercase).
    Exact(String),
}

impl HostQuery {
    /// Interpret user input for a category.
    ///
    /// Aggregate categories and `*` always query every host. Blank input
    /// selects nothing.
    pub fn from_input(category: Category, input: &str) -> Option<HostQuery> {
        let input = input.trim();
        if category.is_aggregate() || input == "*" {
            return Some(HostQuery::Any);
        }
        if input.is_empty() {
            return None;
        }
        Some(HostQuery::Exact(input.to_lowercase()))
    }

    pub fn matches(&self, host: &str) -> bool {
        match self {
            HostQuery::Any => true,
            HostQuery::Exact(h) => h == host,
        }
    }
}

/// One stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Owning host; `None` for rows aggregated across hosts.
    pub host: Option<String>,
    pub name: String,
    /// Only set for the `Value` category.
    pub value: Option<String>,
    /// How many exchanges reported this artifact.
    pub count: u64,
}

/// Order rows by count (highest first), then name, then value.
pub fn sort_rows(rows: &mut [Row]) {
    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.value.cmp(&b.value))
            .then_with(|| a.host.cmp(&b.host))
    });
}

/// Persistent, per-host store of collected artifacts.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Record every artifact of `buckets` for `host`.
    ///
    /// Artifacts already stored for the host have their count incremented.
    async fn insert(&self, host: &str, buckets: &ExtractionResult) -> Result<()>;

    /// Stored artifacts of one category, at most `limit` rows.
    async fn query(&self, host: &HostQuery, category: Category, limit: usize) -> Result<Vec<Row>>;

    /// Sorted distinct hosts that have data in `category`.
    async fn list_hosts(&self, category: Category) -> Result<Vec<String>>;

    /// Hosts matching a partial input, case-insensitively.
    ///
    /// An exact match comes first; the rest keep `list_hosts` order.
    /// Blank input and `*` suggest nothing.
    async fn suggest_hosts(&self, category: Category, input: &str) -> Result<Vec<String>> {
        let input = input.trim().to_lowercase();
        if input.is_empty() || input == "*" {
            return Ok(vec![]);
        }

        let mut exact = None;
        let mut partial = Vec::new();
        for host in self.list_hosts(category).await? {
            let lower = host.to_lowercase();
            if lower == input {
                exact = Some(lower);
            } else if lower.contains(&input) {
                partial.push(host);
            }
        }

        Ok(exact.into_iter().chain(partial).collect())
    }
}
