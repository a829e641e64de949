// ============================================================================
// pagefetch
//
// Paged entity fetching over an external SQL-execution engine, with
// dialect-aware paging SQL cached per entity type and row materialization
// into change-tracked proxies.
// ============================================================================

//! # pagefetch
//!
//! This crate augments a minimal SQL engine (anything implementing
//! [`QueryEngine`]) with two capabilities:
//!
//! 1. **Paging SQL generation**, per database dialect, memoized per entity
//!    type in a process-wide [`QueryCache`].
//! 2. **Change-tracked materialization**: rows can be loaded into proxies
//!    that satisfy the entity's view interface while recording every
//!    property write, so update logic can persist only the fields that
//!    actually changed.
//!
//! Entities are declared once with [`tracked_entity!`], which generates the
//! plain record, the view trait, and the tracked proxy:
//!
//! ```
//! use pagefetch::{tracked_entity, TrackedRecord};
//!
//! tracked_entity! {
//!     pub Widget in "Widgets" {
//!         key id: i64,
//!         name: String,
//!         price: Option<f64>,
//!     }
//! }
//!
//! let mut proxy = WidgetProxy::default();
//! proxy.set_name("anvil".to_string());
//! assert!(proxy.is_dirty());
//! assert!(proxy.changed_properties().contains("name"));
//!
//! proxy.set_dirty(false);
//! assert!(proxy.changed_properties().is_empty());
//! ```
//!
//! Pages are fetched through a [`PagedFetcher`] (or the process-wide
//! [`fetch_paged`]/[`fetch_paged_tracked`] wrappers). The concrete path
//! returns plain records with no tracking; the tracked path returns proxies
//! whose dirty flag is cleared after population, so only caller edits
//! register as changes.

pub mod cache;
pub mod core;
pub mod dialect;
pub mod engine;
pub mod fetch;
pub mod metadata;
pub mod proxy;

mod macros;

// Re-export main types for convenience
pub use cache::QueryCache;
pub use core::{coerce, FetchError, PropertyType, PropertyValue, Result, Value};
pub use dialect::{
    DialectAdapter, DialectRegistry, MySqlDialect, PostgresDialect, SqlServerDialect,
    SqliteDialect,
};
pub use engine::{FetchOptions, FromRow, QueryEngine, Row, TransactionId};
pub use fetch::{fetch_paged, fetch_paged_tracked, shared, PageRequest, PagedFetcher};
pub use metadata::{
    DefaultTableNames, Entity, EntityMeta, EntitySchema, Property, TableNameResolver,
    TypeMetadataCache,
};
pub use proxy::{EntityProxyFactory, ProxyEntity, ProxyState, TrackedRecord};

// The entity macro expands accessor names with `paste`.
#[doc(hidden)]
pub use paste;
