use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::{coerce, FetchError, PropertyValue, Result, Value};

/// Opaque handle to a transaction owned by the external engine. Passed
/// through unchanged; this crate never begins or ends transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(pub u64);

/// Per-call execution options forwarded to the engine as-is.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub transaction: Option<TransactionId>,
    pub timeout: Option<Duration>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transaction(mut self, transaction: TransactionId) -> Self {
        self.transaction = Some(transaction);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// An untyped fetched row: a column-name to value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column insertion, mostly useful in tests and engine
    /// adapters.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Builds a row from a JSON object, for engines that surface rows as
    /// JSON documents.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            FetchError::Execution(format!("expected a JSON object row, got {}", value))
        })?;

        let mut row = Row::new();
        for (column, raw) in object {
            row.insert(column.clone(), Value::from_json(raw));
        }
        Ok(row)
    }

    /// Decodes a column into a typed value, coercing the raw value to the
    /// target type. Absent and NULL columns decode to the type's default.
    ///
    /// Coercion failures carry a zero row index; callers looping over rows
    /// rewrite it via [`FetchError::at_row`].
    pub fn decode<T: PropertyValue>(&self, column: &str) -> Result<T> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(raw) => {
                let target = T::property_type();
                let coerced =
                    coerce(raw, &target).map_err(|reason| FetchError::TypeCoercion {
                        property: column.to_string(),
                        row: 0,
                        reason,
                    })?;
                T::from_value(&coerced).ok_or_else(|| FetchError::TypeCoercion {
                    property: column.to_string(),
                    row: 0,
                    reason: format!("coerced value does not fit {}", target),
                })
            }
        }
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// A concrete record type that deserializes directly from a fetched row.
///
/// Usually implemented by the `tracked_entity!` macro.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self>;
}

/// The external SQL-execution engine this crate augments.
///
/// Implementations wrap a real database connection. The engine declares its
/// SQL dialect by name; paging values arrive baked into the SQL text, never
/// as bound parameters.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// The dialect name used to resolve a paging adapter, e.g. "postgres".
    fn dialect(&self) -> &str;

    /// Executes a query and returns the resulting rows in engine order.
    async fn query_rows(&self, sql: &str, options: &FetchOptions) -> Result<Vec<Row>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_coerces_text_to_integer() {
        let row = Row::new().with("id", "5");
        let id: i64 = row.decode("id").unwrap();
        assert_eq!(id, 5);
    }

    #[test]
    fn test_decode_absent_column_is_default() {
        let row = Row::new();
        let name: String = row.decode("name").unwrap();
        assert_eq!(name, "");
        let price: Option<f64> = row.decode("price").unwrap();
        assert_eq!(price, None);
    }

    #[test]
    fn test_decode_null_is_default() {
        let row = Row::new().with("price", Value::Null);
        let price: Option<f64> = row.decode("price").unwrap();
        assert_eq!(price, None);
    }

    #[test]
    fn test_decode_failure_names_property() {
        let row = Row::new().with("id", "not a number");
        let err = row.decode::<i64>("id").unwrap_err();
        match err {
            FetchError::TypeCoercion { property, .. } => assert_eq!(property, "id"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_row_from_json() {
        let row = Row::from_json(&serde_json::json!({
            "id": 7,
            "name": "A",
            "price": null,
        }))
        .unwrap();
        assert_eq!(row.get("id"), Some(&Value::Integer(7)));
        assert_eq!(row.get("price"), Some(&Value::Null));
        assert!(Row::from_json(&serde_json::json!([1, 2])).is_err());
    }
}
