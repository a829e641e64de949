use std::collections::{BTreeSet, HashMap};

use crate::core::Value;
use crate::metadata::Entity;

/// Uniform untyped access to a tracked entity's properties, plus its change
/// tracking state.
///
/// Every write records the property name in the changed set and marks the
/// record dirty; reads never affect tracking state. Setting the dirty flag
/// to `false` clears the changed set.
pub trait TrackedRecord {
    fn get(&self, property: &str) -> Option<&Value>;
    fn set(&mut self, property: &str, value: Value);
    fn is_dirty(&self) -> bool;
    fn set_dirty(&mut self, dirty: bool);
    fn changed_properties(&self) -> &BTreeSet<String>;
}

/// The backing store shared by every generated proxy type: a name to value
/// mapping plus the dirty flag and changed-property set.
#[derive(Debug, Clone, Default)]
pub struct ProxyState {
    values: HashMap<String, Value>,
    dirty: bool,
    changed: BTreeSet<String>,
}

impl ProxyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed read used by generated accessors. Unset properties come back as
    /// the type's default value.
    pub fn read<T: crate::core::PropertyValue>(&self, property: &str) -> T {
        self.values
            .get(property)
            .and_then(T::from_value)
            .unwrap_or_default()
    }

    /// Typed write used by generated accessors.
    pub fn write<T: crate::core::PropertyValue>(&mut self, property: &str, value: T) {
        self.set(property, value.into_value());
    }
}

impl TrackedRecord for ProxyState {
    fn get(&self, property: &str) -> Option<&Value> {
        self.values.get(property)
    }

    fn set(&mut self, property: &str, value: Value) {
        self.values.insert(property.to_string(), value);
        self.changed.insert(property.to_string());
        self.dirty = true;
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
        if !dirty {
            self.changed.clear();
        }
    }

    fn changed_properties(&self) -> &BTreeSet<String> {
        &self.changed
    }
}

/// A change-tracked stand-in for an entity, constructable empty.
///
/// Implemented by the proxy types the `tracked_entity!` macro generates.
pub trait ProxyEntity: Entity + TrackedRecord {
    fn new_proxy() -> Self;
}

/// Creates empty proxies for tracked materialization.
pub struct EntityProxyFactory;

impl EntityProxyFactory {
    pub fn create<P: ProxyEntity>() -> P {
        P::new_proxy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state_is_clean() {
        let state = ProxyState::new();
        assert!(!state.is_dirty());
        assert!(state.changed_properties().is_empty());
    }

    #[test]
    fn test_write_marks_dirty_and_records_name() {
        let mut state = ProxyState::new();
        state.set("name", Value::Text("A".into()));
        assert!(state.is_dirty());
        assert!(state.changed_properties().contains("name"));
    }

    #[test]
    fn test_read_does_not_affect_tracking() {
        let mut state = ProxyState::new();
        state.set("name", Value::Text("A".into()));
        state.set_dirty(false);

        let _ = state.get("name");
        let _: String = state.read("name");
        assert!(!state.is_dirty());
        assert!(state.changed_properties().is_empty());
    }

    #[test]
    fn test_clearing_dirty_clears_changed_set() {
        let mut state = ProxyState::new();
        state.set("a", Value::Integer(1));
        state.set("b", Value::Integer(2));
        assert_eq!(state.changed_properties().len(), 2);

        state.set_dirty(false);
        assert!(!state.is_dirty());
        assert!(state.changed_properties().is_empty());

        // Values survive a tracking reset.
        assert_eq!(state.get("a"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_forcing_dirty_true_keeps_changed_set() {
        let mut state = ProxyState::new();
        state.set("a", Value::Integer(1));
        state.set_dirty(true);
        assert!(state.changed_properties().contains("a"));
    }

    #[test]
    fn test_typed_read_of_unset_property_is_default() {
        let state = ProxyState::new();
        let n: i64 = state.read("missing");
        assert_eq!(n, 0);
        let opt: Option<f64> = state.read("missing");
        assert_eq!(opt, None);
    }
}
