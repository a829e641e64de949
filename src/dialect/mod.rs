use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{FetchError, Result};

/// Emits dialect-correct paging SQL for a table.
///
/// Paging values are baked into the generated text as literals, never bound
/// as parameters.
pub trait DialectAdapter: Send + Sync {
    fn name(&self) -> &'static str;
    fn paged_query(&self, table: &str, page_number: i64, page_size: i64) -> String;
}

fn offset_of(page_number: i64, page_size: i64) -> i64 {
    (page_number - 1) * page_size
}

/// PostgreSQL paging via `LIMIT ... OFFSET ...`.
#[derive(Debug, Default)]
pub struct PostgresDialect;

impl DialectAdapter for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn paged_query(&self, table: &str, page_number: i64, page_size: i64) -> String {
        format!(
            "SELECT * FROM \"{}\" LIMIT {} OFFSET {}",
            table,
            page_size,
            offset_of(page_number, page_size)
        )
    }
}

/// MySQL paging via `LIMIT offset, count`.
#[derive(Debug, Default)]
pub struct MySqlDialect;

impl DialectAdapter for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn paged_query(&self, table: &str, page_number: i64, page_size: i64) -> String {
        format!(
            "SELECT * FROM `{}` LIMIT {}, {}",
            table,
            offset_of(page_number, page_size),
            page_size
        )
    }
}

/// SQLite paging via `LIMIT ... OFFSET ...`.
#[derive(Debug, Default)]
pub struct SqliteDialect;

impl DialectAdapter for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn paged_query(&self, table: &str, page_number: i64, page_size: i64) -> String {
        format!(
            "SELECT * FROM \"{}\" LIMIT {} OFFSET {}",
            table,
            page_size,
            offset_of(page_number, page_size)
        )
    }
}

/// SQL Server paging via `OFFSET ... ROWS FETCH NEXT ... ROWS ONLY`, which
/// requires an ORDER BY clause to be present.
#[derive(Debug, Default)]
pub struct SqlServerDialect;

impl DialectAdapter for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn paged_query(&self, table: &str, page_number: i64, page_size: i64) -> String {
        format!(
            "SELECT * FROM [{}] ORDER BY (SELECT NULL) OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
            table,
            offset_of(page_number, page_size),
            page_size
        )
    }
}

/// Maps a connection's declared dialect name to its adapter.
pub struct DialectRegistry {
    adapters: HashMap<String, Arc<dyn DialectAdapter>>,
}

impl DialectRegistry {
    /// An empty registry with no adapters.
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// A registry preloaded with the built-in adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(PostgresDialect));
        registry.register(Arc::new(MySqlDialect));
        registry.register(Arc::new(SqliteDialect));
        registry.register(Arc::new(SqlServerDialect));
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn DialectAdapter>) {
        self.adapters
            .insert(adapter.name().to_ascii_lowercase(), adapter);
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn DialectAdapter>> {
        self.adapters
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| FetchError::UnsupportedDialect(name.to_string()))
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
