//! Integration tests for the Collector.
//!
//! These tests drive whole exchanges through the public API:
//! 1. Extract from request and response
//! 2. Memoize payloads across calls and threads
//! 3. Persist in the background
//! 4. Browse what was stored

use std::sync::Arc;

use collector::{
    testing::{AllowAll, FailingStore, RecordingStore},
    Category, Collector, CollectorConfig, DataStore, HostQuery, HttpExchange, HttpRequest,
    HttpResponse, MemoryStore, ScopeFilter,
};

/// Helper to build a GET exchange with a 200 response.
fn exchange(url: &str, body: &str) -> HttpExchange {
    HttpExchange::pair(HttpRequest::get(url), HttpResponse::ok(body))
}

#[tokio::test]
async fn test_full_exchange_is_persisted_per_host() {
    let store = Arc::new(MemoryStore::new());
    let collector = Collector::new(Arc::clone(&store), AllowAll).unwrap();

    let result = collector.collect(&exchange(
        "https://Shop.Example.com/api//v2/items/list.php?id=5",
        r#"{"item":{"sku":"A1","tags":["new"]}}"#,
    ));

    let params = result.names(Category::Param).unwrap();
    for name in ["id", "item", "sku", "tags"] {
        assert!(params.contains(name), "missing {name}");
    }

    collector.flush().await;
    assert_eq!(collector.stats().persisted, 1);

    let host = HostQuery::Exact("shop.example.com".into());
    let paths: Vec<_> = store
        .query(&host, Category::Path, 100)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(paths, vec!["api", "items", "v2"]);

    let files = store.query(&host, Category::File, 100).await.unwrap();
    assert_eq!(files[0].name, "list.php");

    let full = store.query(&host, Category::FullPath, 100).await.unwrap();
    assert_eq!(full[0].name, "/api/v2/items/list.php");

    let values = store.query(&host, Category::Value, 100).await.unwrap();
    assert!(values
        .iter()
        .any(|r| r.name == "sku" && r.value.as_deref() == Some("A1")));
    assert!(values
        .iter()
        .any(|r| r.name == "tags" && r.value.as_deref() == Some("new")));

    let all = store.query(&HostQuery::Any, Category::AllParam, 100).await.unwrap();
    assert!(all.iter().all(|r| r.host.is_none()));
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn test_cache_hit_is_not_persisted() {
    let store = Arc::new(RecordingStore::new());
    let collector = Collector::new(Arc::clone(&store), AllowAll).unwrap();
    let body = r#"{"status":"ok"}"#;

    collector.collect(&exchange("https://example.com/first", body));
    let second = collector.collect(&exchange("https://example.com/second", body));

    // The caller still sees the new path and the cached keys
    assert!(second.names(Category::Path).unwrap().contains("second"));
    assert!(second.values().unwrap().contains("status", "ok"));

    collector.flush().await;
    let inserts = store.inserts();
    assert_eq!(inserts.len(), 1);
    assert!(inserts[0].1.names(Category::Path).unwrap().contains("first"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_collect_shares_cache() {
    let store = Arc::new(RecordingStore::new());
    let collector = Collector::new(Arc::clone(&store), AllowAll).unwrap();
    let ex = exchange("https://example.com/api/me", r#"{"user":{"id":1,"role":"admin"}}"#);

    let (shared, ex) = (&collector, &ex);
    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(move || (0..50).map(|_| shared.collect(ex)).collect::<Vec<_>>()))
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    assert_eq!(results.len(), 400);
    assert!(results.iter().all(|r| *r == results[0]));
    assert!(results[0].values().unwrap().contains("role", "admin"));
    assert_eq!(collector.cache().len(), 1);

    collector.flush().await;
    let stats = collector.stats();
    assert_eq!(stats.exchanges, 400);
    // Only cache misses persist
    assert_eq!(stats.persisted, stats.json_parses);
    assert_eq!(store.inserts().len() as u64, stats.persisted);
}

#[tokio::test]
async fn test_store_failures_are_counted_not_raised() {
    let collector = Collector::new(Arc::new(FailingStore::new("unavailable")), AllowAll).unwrap();

    let result = collector.collect(&exchange("https://example.com/a?x=1", "{}"));
    assert!(result.names(Category::Param).unwrap().contains("x"));

    collector.flush().await;
    let stats = collector.stats();
    assert_eq!(stats.persisted, 0);
    assert_eq!(stats.persist_failures, 1);
}

#[tokio::test]
async fn test_response_only_uses_cache_only() {
    let store = Arc::new(RecordingStore::new());
    let collector = Collector::new(Arc::clone(&store), AllowAll).unwrap();
    let body = r#"{"session":"s1"}"#;

    // Unknown payload: not parsed, nothing recorded
    let unseen = collector.collect(&HttpExchange::response_only(HttpResponse::ok(body)));
    assert!(unseen.is_empty());
    assert_eq!(collector.stats().json_parses, 0);

    collector.collect(&exchange("https://example.com/login", body));
    let seen = collector.collect(&HttpExchange::response_only(HttpResponse::ok(body)));
    assert!(seen.values().unwrap().contains("session", "s1"));

    collector.flush().await;
    assert_eq!(store.inserts().len(), 1);
}

#[tokio::test]
async fn test_html_fields_are_scraped() {
    let collector = Collector::new(Arc::new(RecordingStore::new()), AllowAll).unwrap();
    let html = r#"
        <form>
            <input type="hidden" name="csrf" value="xyz">
            <input type="text" id="nocsrf">
            <input type="password" name="secret" value="hunter2">
        </form>
    "#;

    let result = collector.collect(&exchange("https://example.com/login", html));

    let params = result.names(Category::Param).unwrap();
    assert!(params.contains("csrf"));
    assert!(params.contains("nocsrf"));
    assert!(!params.contains("secret"));
    let values = result.values().unwrap();
    assert!(values.contains("csrf", "xyz"));
    assert!(values.get("nocsrf").is_none());
    // HTML is never memoized
    assert!(collector.cache().is_empty());
}

#[tokio::test]
async fn test_scope_filter_excludes_static_and_foreign_origins() {
    let store = Arc::new(RecordingStore::new());
    let config = CollectorConfig::new().block_host("*.tracker.io");
    let filter = ScopeFilter::from_config(&config);
    let collector = Collector::with_config(Arc::clone(&store), filter, config).unwrap();

    assert!(collector
        .collect(&exchange("https://example.com/img/logo.png", "{\"a\":1}"))
        .is_empty());
    assert!(collector
        .collect(&exchange("https://cdn.tracker.io/t?id=1", "{}"))
        .is_empty());
    assert!(!collector
        .collect(&exchange("https://example.com/app?id=1", "{}"))
        .is_empty());

    let foreign = CollectorConfig::new().with_origin("Intruder");
    let other = Collector::with_config(
        Arc::new(RecordingStore::new()),
        ScopeFilter::from_config(&foreign),
        foreign,
    )
    .unwrap();
    assert!(other
        .collect(&exchange("https://example.com/app?id=1", "{}"))
        .is_empty());

    collector.flush().await;
    assert_eq!(collector.stats().excluded, 2);
    assert_eq!(store.inserts().len(), 1);
}

#[tokio::test]
async fn test_browse_hosts_and_counts() {
    let store = Arc::new(MemoryStore::new());
    let collector = Collector::new(Arc::clone(&store), AllowAll).unwrap();

    for (i, host) in ["api.example.com", "example.com", "example.com", "other.org"]
        .iter()
        .enumerate()
    {
        // Distinct bodies so every exchange misses the cache
        collector.collect(&exchange(
            &format!("https://{host}/v1?page={i}"),
            &format!("{{\"n\":{i}}}"),
        ));
    }
    collector.flush().await;

    assert_eq!(
        store.list_hosts(Category::Param).await.unwrap(),
        vec!["api.example.com", "example.com", "other.org"]
    );
    assert_eq!(
        store.suggest_hosts(Category::Param, "example.com").await.unwrap(),
        vec!["example.com", "api.example.com"]
    );

    let query = HostQuery::from_input(Category::Param, "example.com").unwrap();
    let rows = store.query(&query, Category::Param, 100).await.unwrap();
    assert_eq!(rows[0].count, 2);

    let rows = store.query(&HostQuery::Any, Category::AllPath, 100).await.unwrap();
    assert_eq!(rows[0].name, "v1");
    assert_eq!(rows[0].count, 4);
}
