use std::any::TypeId;
use std::sync::Mutex;

use async_trait::async_trait;
use pagefetch::{
    tracked_entity, FetchError, FetchOptions, PageRequest, PagedFetcher, QueryEngine, Result,
    Row,
};

tracked_entity! {
    pub Account in "Accounts" {
        key id: i64,
        owner: String,
    }
}

tracked_entity! {
    pub Invoice in "Invoices" {
        key id: i64,
        total: f64,
    }
}

struct RecordingEngine {
    dialect: &'static str,
    calls: Mutex<Vec<String>>,
}

impl RecordingEngine {
    fn new(dialect: &'static str) -> Self {
        Self {
            dialect,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn received_sql(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryEngine for RecordingEngine {
    fn dialect(&self) -> &str {
        self.dialect
    }

    async fn query_rows(&self, sql: &str, _options: &FetchOptions) -> Result<Vec<Row>> {
        self.calls.lock().unwrap().push(sql.to_string());
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_cache_is_keyed_by_type_not_by_paging_shape() {
    // Deliberate, preserved behavior: the SQL cached by the first call for a
    // type is reused verbatim by later calls, even when they ask for a
    // different page.
    let engine = RecordingEngine::new("postgres");
    let fetcher = PagedFetcher::new();

    let _: Vec<AccountProxy> = fetcher
        .fetch_tracked(&engine, PageRequest::new(1, 10), &FetchOptions::new())
        .await
        .unwrap();
    let _: Vec<AccountProxy> = fetcher
        .fetch_tracked(&engine, PageRequest::new(5, 50), &FetchOptions::new())
        .await
        .unwrap();

    let sql = engine.received_sql();
    assert_eq!(sql.len(), 2);
    assert_eq!(sql[0], sql[1]);
    assert_eq!(sql[0], "SELECT * FROM \"Accounts\" LIMIT 10 OFFSET 0");
}

#[tokio::test]
async fn test_distinct_types_get_distinct_entries() {
    let engine = RecordingEngine::new("postgres");
    let fetcher = PagedFetcher::new();

    let _: Vec<AccountProxy> = fetcher
        .fetch_tracked(&engine, PageRequest::default(), &FetchOptions::new())
        .await
        .unwrap();
    let _: Vec<InvoiceProxy> = fetcher
        .fetch_tracked(&engine, PageRequest::default(), &FetchOptions::new())
        .await
        .unwrap();

    assert_eq!(fetcher.query_cache().len(), 2);
    let sql = engine.received_sql();
    assert!(sql[0].contains("Accounts"));
    assert!(sql[1].contains("Invoices"));
}

#[tokio::test]
async fn test_record_and_proxy_are_separate_cache_keys() {
    let engine = RecordingEngine::new("postgres");
    let fetcher = PagedFetcher::new();

    let _: Vec<Account> = fetcher
        .fetch(&engine, PageRequest::default(), &FetchOptions::new())
        .await
        .unwrap();
    let _: Vec<AccountProxy> = fetcher
        .fetch_tracked(&engine, PageRequest::default(), &FetchOptions::new())
        .await
        .unwrap();

    assert_eq!(fetcher.query_cache().len(), 2);
}

#[tokio::test]
async fn test_seeded_cache_is_used_verbatim() {
    let engine = RecordingEngine::new("postgres");
    let fetcher = PagedFetcher::new();

    fetcher
        .query_cache()
        .insert(
            TypeId::of::<AccountProxy>(),
            "SELECT * FROM accounts_view LIMIT 3 OFFSET 0".to_string(),
        )
        .unwrap();

    let _: Vec<AccountProxy> = fetcher
        .fetch_tracked(&engine, PageRequest::new(9, 99), &FetchOptions::new())
        .await
        .unwrap();

    assert_eq!(
        engine.received_sql(),
        vec!["SELECT * FROM accounts_view LIMIT 3 OFFSET 0".to_string()]
    );
}

#[tokio::test]
async fn test_clearing_the_cache_regenerates_sql() {
    let engine = RecordingEngine::new("postgres");
    let fetcher = PagedFetcher::new();

    let _: Vec<AccountProxy> = fetcher
        .fetch_tracked(&engine, PageRequest::new(1, 10), &FetchOptions::new())
        .await
        .unwrap();
    fetcher.query_cache().clear();
    let _: Vec<AccountProxy> = fetcher
        .fetch_tracked(&engine, PageRequest::new(2, 10), &FetchOptions::new())
        .await
        .unwrap();

    let sql = engine.received_sql();
    assert_eq!(sql[0], "SELECT * FROM \"Accounts\" LIMIT 10 OFFSET 0");
    assert_eq!(sql[1], "SELECT * FROM \"Accounts\" LIMIT 10 OFFSET 10");
}

#[tokio::test]
async fn test_dialect_changes_generated_sql() {
    let engine = RecordingEngine::new("sqlserver");
    let fetcher = PagedFetcher::new();

    let _: Vec<AccountProxy> = fetcher
        .fetch_tracked(&engine, PageRequest::new(2, 10), &FetchOptions::new())
        .await
        .unwrap();

    let sql = engine.received_sql();
    assert_eq!(
        sql[0],
        "SELECT * FROM [Accounts] ORDER BY (SELECT NULL) OFFSET 10 ROWS FETCH NEXT 10 ROWS ONLY"
    );
}

#[tokio::test]
async fn test_unsupported_dialect_is_rejected() {
    let engine = RecordingEngine::new("oracle");
    let fetcher = PagedFetcher::new();

    let err = fetcher
        .fetch_tracked::<AccountProxy>(&engine, PageRequest::default(), &FetchOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::UnsupportedDialect(_)));

    // Nothing was cached and the engine was never reached.
    assert!(fetcher.query_cache().is_empty());
    assert!(engine.received_sql().is_empty());
}

#[tokio::test]
async fn test_metadata_is_reflected_once_per_type() {
    let engine = RecordingEngine::new("postgres");
    let fetcher = PagedFetcher::new();

    for _ in 0..3 {
        let _: Vec<AccountProxy> = fetcher
            .fetch_tracked(&engine, PageRequest::default(), &FetchOptions::new())
            .await
            .unwrap();
    }

    assert_eq!(fetcher.metadata_cache().len(), 1);
}
