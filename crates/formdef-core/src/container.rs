//! # Value Containers
//!
//! Live values reach the field utilities in one of three storage shapes:
//!
//! 1. a property-accessor object (`PropertyAccess`),
//! 2. a get/set-accessor object (`GetSetAccessor`),
//! 3. a plain keyed map (`serde_json::Map`).
//!
//! Each is adapted to the single [`ValueSource`] capability, so the read
//! and condition algorithms never branch on container flavor. A
//! [`Container`] bundles up to one of each and probes them in that order.

use serde_json::{Map, Value};

/// Uniform read façade over a live value store.
pub trait ValueSource {
    /// The value stored under `key`, or `None` when the key is absent.
    fn read(&self, key: &str) -> Option<Value>;
}

/// An object exposing its values as named properties.
pub trait PropertyAccess {
    fn property(&self, name: &str) -> Option<Value>;
}

/// An object exposing values through explicit getter/setter calls.
pub trait GetSetAccessor {
    fn get_property(&self, name: &str) -> Option<Value>;
    fn set_property(&mut self, name: &str, value: Value);
}

/// Adapts a [`PropertyAccess`] object.
pub struct PropertyObject<'a, T: ?Sized>(pub &'a T);

impl<T: PropertyAccess + ?Sized> ValueSource for PropertyObject<'_, T> {
    fn read(&self, key: &str) -> Option<Value> {
        self.0.property(key)
    }
}

/// Adapts a [`GetSetAccessor`] object.
pub struct AccessorObject<'a, T: ?Sized>(pub &'a T);

impl<T: GetSetAccessor + ?Sized> ValueSource for AccessorObject<'_, T> {
    fn read(&self, key: &str) -> Option<Value> {
        self.0.get_property(key)
    }
}

/// Adapts a plain keyed map.
pub struct KeyedMap<'a>(pub &'a Map<String, Value>);

impl ValueSource for KeyedMap<'_> {
    fn read(&self, key: &str) -> Option<Value> {
        self.0.get(key).cloned()
    }
}

impl ValueSource for Map<String, Value> {
    fn read(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

/// A JSON value read as a keyed map; non-objects hold no keys.
impl ValueSource for Value {
    fn read(&self, key: &str) -> Option<Value> {
        self.as_object().and_then(|m| m.get(key)).cloned()
    }
}

/// Probes a property object, then an accessor object, then a keyed map.
#[derive(Default)]
pub struct Container<'a> {
    properties: Option<&'a dyn PropertyAccess>,
    accessor: Option<&'a dyn GetSetAccessor>,
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Container<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_properties(mut self, properties: &'a dyn PropertyAccess) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn with_accessor(mut self, accessor: &'a dyn GetSetAccessor) -> Self {
        self.accessor = Some(accessor);
        self
    }

    pub fn with_map(mut self, map: &'a Map<String, Value>) -> Self {
        self.map = Some(map);
        self
    }
}

impl ValueSource for Container<'_> {
    fn read(&self, key: &str) -> Option<Value> {
        if let Some(v) = self.properties.and_then(|p| PropertyObject(p).read(key)) {
            return Some(v);
        }
        if let Some(v) = self.accessor.and_then(|a| AccessorObject(a).read(key)) {
            return Some(v);
        }
        self.map.and_then(|m| KeyedMap(m).read(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    struct Props {
        luminance: i64,
    }

    impl PropertyAccess for Props {
        fn property(&self, name: &str) -> Option<Value> {
            (name == "luminance").then(|| json!(self.luminance))
        }
    }

    #[derive(Default)]
    struct Accessors(BTreeMap<String, Value>);

    impl GetSetAccessor for Accessors {
        fn get_property(&self, name: &str) -> Option<Value> {
            self.0.get(name).cloned()
        }
        fn set_property(&mut self, name: &str, value: Value) {
            self.0.insert(name.to_string(), value);
        }
    }

    #[test]
    fn adapters_read_their_shape() {
        let props = Props { luminance: 7 };
        assert_eq!(PropertyObject(&props).read("luminance"), Some(json!(7)));

        let mut acc = Accessors::default();
        acc.set_property("is_solid", json!(true));
        assert_eq!(AccessorObject(&acc).read("is_solid"), Some(json!(true)));

        let map = json!({"a": 1}).as_object().cloned().unwrap();
        assert_eq!(KeyedMap(&map).read("a"), Some(json!(1)));
        assert_eq!(KeyedMap(&map).read("b"), None);
    }

    #[test]
    fn container_probes_in_order() {
        let props = Props { luminance: 3 };
        let mut acc = Accessors::default();
        acc.set_property("luminance", json!(9));
        acc.set_property("is_solid", json!(false));
        let map = json!({"luminance": 12, "is_solid": true, "name": "x"})
            .as_object()
            .cloned()
            .unwrap();

        let c = Container::new()
            .with_properties(&props)
            .with_accessor(&acc)
            .with_map(&map);
        assert_eq!(c.read("luminance"), Some(json!(3)));
        assert_eq!(c.read("is_solid"), Some(json!(false)));
        assert_eq!(c.read("name"), Some(json!("x")));
        assert_eq!(c.read("missing"), None);
    }

    #[test]
    fn json_value_reads_as_map() {
        assert_eq!(json!({"k": "v"}).read("k"), Some(json!("v")));
        assert_eq!(json!(5).read("k"), None);
    }
}
