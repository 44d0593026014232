//! Testing utilities including test doubles for the collector's seams.
//!
//! These are useful for testing applications that embed the collector
//! without a real scanner or database.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use crate::error::{CollectorError, Result};
use crate::filters::form_decode;
use crate::stores::MemoryStore;
use crate::traits::filter::ExchangeFilter;
use crate::traits::store::{DataStore, HostQuery, Row};
use crate::types::buckets::{Category, ExtractionResult};
use crate::types::exchange::HttpExchange;

/// A store that remembers every insert it receives.
///
/// Inserts are also applied to an inner [`MemoryStore`], so the read side
/// behaves like a real store.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    inserts: Mutex<Vec<(String, ExtractionResult)>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(host, buckets)` insert received so far, in arrival order.
    pub fn inserts(&self) -> Vec<(String, ExtractionResult)> {
        self.inserts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Inserts received for one host.
    pub fn inserts_for(&self, host: &str) -> Vec<ExtractionResult> {
        self.inserts()
            .into_iter()
            .filter(|(h, _)| h == host)
            .map(|(_, buckets)| buckets)
            .collect()
    }

    pub fn clear(&self) {
        self.inserts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.inner.clear();
    }
}

#[async_trait]
impl DataStore for RecordingStore {
    async fn insert(&self, host: &str, buckets: &ExtractionResult) -> Result<()> {
        self.inserts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((host.to_string(), buckets.clone()));
        self.inner.insert(host, buckets).await
    }

    async fn query(&self, host: &HostQuery, category: Category, limit: usize) -> Result<Vec<Row>> {
        self.inner.query(host, category, limit).await
    }

    async fn list_hosts(&self, category: Category) -> Result<Vec<String>> {
        self.inner.list_hosts(category).await
    }
}

/// A store whose every operation fails.
#[derive(Debug, Clone, Default)]
pub struct FailingStore {
    message: String,
}

impl FailingStore {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn fail<T>(&self) -> Result<T> {
        Err(CollectorError::storage(&self.message))
    }
}

#[async_trait]
impl DataStore for FailingStore {
    async fn insert(&self, _host: &str, _buckets: &ExtractionResult) -> Result<()> {
        self.fail()
    }

    async fn query(&self, _host: &HostQuery, _category: Category, _limit: usize) -> Result<Vec<Row>> {
        self.fail()
    }

    async fn list_hosts(&self, _category: Category) -> Result<Vec<String>> {
        self.fail()
    }
}

/// A filter that excludes nothing and form-decodes parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ExchangeFilter for AllowAll {
    fn is_excluded(&self, _exchange: &HttpExchange, _origin: &str) -> bool {
        false
    }

    fn decode_parameter(&self, raw: &str) -> String {
        form_decode(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn test_recording_store() {
        let store = RecordingStore::new();
        let mut buckets = ExtractionResult::new();
        buckets.insert_with_aggregate(Category::File, &BTreeSet::from(["index.php".to_string()]));

        store.insert("example.com", &buckets).await.unwrap();

        assert_eq!(store.inserts().len(), 1);
        assert_eq!(store.inserts_for("example.com"), vec![buckets]);
        let rows = store.query(&HostQuery::Any, Category::AllFile, 10).await.unwrap();
        assert_eq!(rows[0].name, "index.php");

        store.clear();
        assert!(store.inserts().is_empty());
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = FailingStore::new("disk full");
        let err = store.insert("example.com", &ExtractionResult::new()).await.unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert!(store.list_hosts(Category::Param).await.is_err());
    }
}
