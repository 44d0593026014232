//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use crate::error::Result;
use crate::traits::store::{sort_rows, DataStore, HostQuery, Row};
use crate::types::buckets::{Category, ExtractionResult};

/// `(host, name, value)` → occurrence count.
type Table = HashMap<(String, String, Option<String>), u64>;

/// In-memory storage for collected artifacts.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Category, Table>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of distinct rows stored for a category, across hosts.
    pub fn row_count(&self, category: Category) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&category)
            .map_or(0, HashMap::len)
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn insert(&self, host: &str, buckets: &ExtractionResult) -> Result<()> {
        let host = host.to_lowercase();
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);

        for (category, bucket) in buckets {
            let table = tables.entry(*category).or_default();
            for (name, value) in bucket.rows() {
                let key = (host.clone(), name.to_string(), value.map(str::to_string));
                *table.entry(key).or_insert(0) += 1;
            }
        }
        Ok(())
    }

    async fn query(&self, host: &HostQuery, category: Category, limit: usize) -> Result<Vec<Row>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let Some(table) = tables.get(&category) else {
            return Ok(vec![]);
        };

        let mut rows: Vec<Row> = match host {
            HostQuery::Exact(wanted) => table
                .iter()
                .filter(|((h, _, _), _)| h == wanted)
                .map(|((h, name, value), count)| Row {
                    host: Some(h.clone()),
                    name: name.clone(),
                    value: value.clone(),
                    count: *count,
                })
                .collect(),
            HostQuery::Any => {
                let mut summed: HashMap<(&str, Option<&str>), u64> = HashMap::new();
                for ((_, name, value), count) in table {
                    *summed.entry((name.as_str(), value.as_deref())).or_insert(0) += count;
                }
                summed
                    .into_iter()
                    .map(|((name, value), count)| Row {
                        host: None,
                        name: name.to_string(),
                        value: value.map(str::to_string),
                        count,
                    })
                    .collect()
            }
        };

        sort_rows(&mut rows);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn list_hosts(&self, category: Category) -> Result<Vec<String>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let hosts: BTreeSet<&str> = tables
            .get(&category)
            .map(|t| t.keys().map(|(h, _, _)| h.as_str()).collect())
            .unwrap_or_default();
        Ok(hosts.into_iter().map(str::to_string).collect())
    }
}
