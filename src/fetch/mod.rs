use std::any::TypeId;

use lazy_static::lazy_static;
use tracing::{debug, trace};

use crate::cache::QueryCache;
use crate::core::{coerce, FetchError, Result, Value};
use crate::dialect::DialectRegistry;
use crate::engine::{FetchOptions, FromRow, QueryEngine};
use crate::metadata::{DefaultTableNames, Entity, TableNameResolver, TypeMetadataCache};
use crate::proxy::{EntityProxyFactory, ProxyEntity};

/// Which page to fetch. Both values are 1-based and must be strictly
/// positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn new(page_number: i64, page_size: i64) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.page_number <= 0 || self.page_size <= 0 {
            return Err(FetchError::InvalidArgument(
                "pageNumber and pageSize must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: 100,
        }
    }
}

/// The public entry point: validates paging, resolves SQL through the query
/// cache and dialect adapter, executes it on the engine, and materializes
/// rows either as plain records or as change-tracked proxies.
///
/// Owns its caches; their lifetime is the fetcher's. [`shared`] provides the
/// process-wide instance most callers want, while tests can build their own
/// to seed, inspect, or reset cache state.
pub struct PagedFetcher {
    metadata: TypeMetadataCache,
    queries: QueryCache,
    dialects: DialectRegistry,
    naming: Box<dyn TableNameResolver>,
}

impl PagedFetcher {
    pub fn new() -> Self {
        Self {
            metadata: TypeMetadataCache::new(),
            queries: QueryCache::new(),
            dialects: DialectRegistry::with_defaults(),
            naming: Box::new(DefaultTableNames),
        }
    }

    pub fn with_dialects(mut self, dialects: DialectRegistry) -> Self {
        self.dialects = dialects;
        self
    }

    pub fn with_naming(mut self, naming: Box<dyn TableNameResolver>) -> Self {
        self.naming = naming;
        self
    }

    pub fn query_cache(&self) -> &QueryCache {
        &self.queries
    }

    pub fn metadata_cache(&self) -> &TypeMetadataCache {
        &self.metadata
    }

    /// Fetches a page deserialized directly into concrete records. No proxy
    /// is constructed and nothing is change-tracked.
    pub async fn fetch<T>(
        &self,
        engine: &dyn QueryEngine,
        page: PageRequest,
        options: &FetchOptions,
    ) -> Result<Vec<T>>
    where
        T: Entity + FromRow,
    {
        page.validate()?;
        let sql = self.paged_sql::<T>(engine, page)?;
        let rows = engine.query_rows(&sql, options).await?;

        rows.iter()
            .enumerate()
            .map(|(index, row)| T::from_row(row).map_err(|err| err.at_row(index)))
            .collect()
    }

    /// Fetches a page materialized as change-tracked proxies.
    ///
    /// Each row populates a fresh proxy property by property, coercing raw
    /// values to the declared types; NULL and absent columns leave the
    /// property unset. The dirty flag is cleared after population so only
    /// caller edits register as changes. Row order is preserved.
    pub async fn fetch_tracked<P>(
        &self,
        engine: &dyn QueryEngine,
        page: PageRequest,
        options: &FetchOptions,
    ) -> Result<Vec<P>>
    where
        P: ProxyEntity,
    {
        page.validate()?;
        let meta = self.metadata.describe::<P>()?;
        let sql = self.paged_sql::<P>(engine, page)?;
        let rows = engine.query_rows(&sql, options).await?;

        let mut entities = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let mut proxy = EntityProxyFactory::create::<P>();
            for property in meta.properties() {
                let raw = match row.get(property.name) {
                    None | Some(Value::Null) => continue,
                    Some(raw) => raw,
                };
                let coerced =
                    coerce(raw, &property.ty).map_err(|reason| FetchError::TypeCoercion {
                        property: property.name.to_string(),
                        row: index,
                        reason,
                    })?;
                proxy.set(property.name, coerced);
            }
            // Population writes must not look like caller edits.
            proxy.set_dirty(false);
            entities.push(proxy);
        }

        trace!(
            entity = meta.entity_name,
            rows = entities.len(),
            "materialized tracked page"
        );
        Ok(entities)
    }

    /// Resolves the paging SQL for an entity type, generating it through the
    /// dialect adapter on a cache miss.
    ///
    /// The cache is keyed by type identity only: a hit is returned even when
    /// the current call's paging values differ from those the text was
    /// generated with.
    fn paged_sql<T: Entity>(&self, engine: &dyn QueryEngine, page: PageRequest) -> Result<String> {
        let meta = self.metadata.describe::<T>()?;
        self.queries.get_or_try_insert_with(TypeId::of::<T>(), || {
            let adapter = self.dialects.resolve(engine.dialect())?;
            let table = self.naming.table_name(&meta);
            let sql = adapter.paged_query(&table, page.page_number, page.page_size);
            debug!(
                entity = meta.entity_name,
                dialect = adapter.name(),
                sql = %sql,
                "generated paged query"
            );
            Ok(sql)
        })
    }
}

impl Default for PagedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    static ref SHARED: PagedFetcher = PagedFetcher::new();
}

/// The process-wide fetcher, with caches that live for the process lifetime.
pub fn shared() -> &'static PagedFetcher {
    &SHARED
}

/// Convenience wrapper over [`shared`] for the concrete-record path.
pub async fn fetch_paged<T>(
    engine: &dyn QueryEngine,
    page: PageRequest,
    options: &FetchOptions,
) -> Result<Vec<T>>
where
    T: Entity + FromRow,
{
    shared().fetch(engine, page, options).await
}

/// Convenience wrapper over [`shared`] for the change-tracked path.
pub async fn fetch_paged_tracked<P>(
    engine: &dyn QueryEngine,
    page: PageRequest,
    options: &FetchOptions,
) -> Result<Vec<P>>
where
    P: ProxyEntity,
{
    shared().fetch_tracked(engine, page, options).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_default() {
        let page = PageRequest::default();
        assert_eq!(page.page_number, 1);
        assert_eq!(page.page_size, 100);
    }

    #[test]
    fn test_page_request_validation() {
        assert!(PageRequest::new(1, 1).validate().is_ok());
        assert!(PageRequest::new(0, 10).validate().is_err());
        assert!(PageRequest::new(10, 0).validate().is_err());
        assert!(PageRequest::new(-1, -1).validate().is_err());
    }
}
