use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::core::{FetchError, PropertyType, Result};

/// A mapped property of an entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: &'static str,
    pub ty: PropertyType,
    pub is_key: bool,
}

impl Property {
    pub fn new(name: &'static str, ty: PropertyType) -> Self {
        Self {
            name,
            ty,
            is_key: false,
        }
    }

    pub fn key(name: &'static str, ty: PropertyType) -> Self {
        Self {
            name,
            ty,
            is_key: true,
        }
    }
}

/// The raw per-type description supplied by an [`Entity`] implementation.
///
/// This is what gets "reflected" on first use; the validated, cached form is
/// [`EntityMeta`].
#[derive(Debug, Clone)]
pub struct EntitySchema {
    pub entity_name: &'static str,
    pub table: Option<&'static str>,
    pub properties: Vec<Property>,
}

/// A type that maps to a database table.
///
/// Usually implemented by the `tracked_entity!` macro rather than by hand.
pub trait Entity: 'static {
    fn schema() -> EntitySchema;
}

/// Validated, immutable metadata for an entity type.
///
/// Built once per type on first use and cached for the process lifetime.
#[derive(Debug)]
pub struct EntityMeta {
    pub entity_name: &'static str,
    pub table: Option<&'static str>,
    properties: Vec<Property>,
    key: usize,
}

impl EntityMeta {
    fn from_schema(schema: EntitySchema) -> Result<Self> {
        let keys: Vec<usize> = schema
            .properties
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_key)
            .map(|(i, _)| i)
            .collect();

        let key = match keys.as_slice() {
            [single] => *single,
            [] => {
                return Err(FetchError::Configuration(format!(
                    "Entity '{}' declares no key property",
                    schema.entity_name
                )));
            }
            _ => {
                return Err(FetchError::Configuration(format!(
                    "Entity '{}' declares {} key properties, expected exactly one",
                    schema.entity_name,
                    keys.len()
                )));
            }
        };

        Ok(Self {
            entity_name: schema.entity_name,
            table: schema.table,
            properties: schema.properties,
            key,
        })
    }

    /// The mapped properties, in declaration order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn key_property(&self) -> &Property {
        &self.properties[self.key]
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Process-wide cache of validated entity metadata, keyed by type identity.
///
/// The first call for a type builds and validates its [`EntityMeta`];
/// subsequent calls return the cached value. Racing first callers may build
/// the same metadata redundantly, which is harmless since the result is a
/// pure function of the type.
#[derive(Debug, Default)]
pub struct TypeMetadataCache {
    inner: RwLock<HashMap<TypeId, Arc<EntityMeta>>>,
}

impl TypeMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn describe<T: Entity>(&self) -> Result<Arc<EntityMeta>> {
        let type_id = TypeId::of::<T>();

        if let Some(meta) = self.inner.read()?.get(&type_id) {
            return Ok(Arc::clone(meta));
        }

        let meta = Arc::new(EntityMeta::from_schema(T::schema())?);
        self.inner
            .write()?
            .entry(type_id)
            .or_insert_with(|| Arc::clone(&meta));
        Ok(meta)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut map) = self.inner.write() {
            map.clear();
        }
    }
}

/// Maps entity metadata to a table name.
pub trait TableNameResolver: Send + Sync {
    fn table_name(&self, meta: &EntityMeta) -> String;
}

/// Default naming convention: an explicit table declaration wins, otherwise
/// the lowercased entity name with an `s` appended.
#[derive(Debug, Default)]
pub struct DefaultTableNames;

impl TableNameResolver for DefaultTableNames {
    fn table_name(&self, meta: &EntityMeta) -> String {
        match meta.table {
            Some(table) => table.to_string(),
            None => format!("{}s", meta.entity_name.to_lowercase()),
        }
    }
}
