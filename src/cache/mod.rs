use std::any::TypeId;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::core::Result;

/// Process-wide memoization of generated paging SQL, keyed by entity type
/// identity.
///
/// A hit returns the cached text regardless of the paging values of the
/// current call: the text was generated with whatever values the first call
/// for that type supplied. This mirrors the original behavior and is pinned
/// by an integration test.
///
/// Racing first writers may both compute the value; since the computation is
/// a pure function of the key, last write wins without a correctness risk.
#[derive(Debug, Default)]
pub struct QueryCache {
    queries: RwLock<HashMap<TypeId, String>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, type_id: TypeId) -> Option<String> {
        self.queries
            .read()
            .ok()
            .and_then(|map| map.get(&type_id).cloned())
    }

    pub fn insert(&self, type_id: TypeId, sql: String) -> Result<()> {
        self.queries.write()?.insert(type_id, sql);
        Ok(())
    }

    /// Returns the cached SQL for the type, generating and storing it on a
    /// miss. The generator runs outside the lock.
    pub fn get_or_try_insert_with<F>(&self, type_id: TypeId, generate: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        if let Some(sql) = self.get(type_id) {
            return Ok(sql);
        }

        let sql = generate()?;
        self.insert(type_id, sql.clone())?;
        Ok(sql)
    }

    pub fn len(&self) -> usize {
        self.queries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached query. Intended for tests that need a clean slate.
    pub fn clear(&self) {
        if let Ok(mut map) = self.queries.write() {
            map.clear();
        }
    }
}
