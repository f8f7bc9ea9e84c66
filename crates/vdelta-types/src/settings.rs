//! Element settings: attributes, properties, style rules, and listeners.
//!
//! Every collection is a `BTreeMap`, so inserting a second value under the
//! same key replaces the first (last write wins) and iteration order is
//! deterministic, which keeps diff output stable.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::decoder::DecoderSpec;

/// Attribute identity: optional namespace URI plus attribute name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeKey {
    pub namespace: Option<String>,
    pub name: String,
}

impl AttributeKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }
}

/// Listener identity: event type plus capture phase.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerKey {
    pub event_type: String,
    pub capture: bool,
}

impl ListenerKey {
    pub fn new(event_type: impl Into<String>, capture: bool) -> Self {
        Self {
            event_type: event_type.into(),
            capture,
        }
    }
}

/// All settings attached to one element.
///
/// A property whose value is `null` is treated as absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    pub attributes: BTreeMap<AttributeKey, String>,
    pub properties: BTreeMap<String, Value>,
    pub style: BTreeMap<String, String>,
    pub listeners: BTreeMap<ListenerKey, DecoderSpec>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no setting of any kind is present.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.properties.values().all(Value::is_null)
            && self.style.is_empty()
            && self.listeners.is_empty()
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(AttributeKey::new(name), value.into());
    }

    pub fn set_attribute_ns(
        &mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.attributes
            .insert(AttributeKey::namespaced(namespace, name), value.into());
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }

    pub fn set_style(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.style.insert(name.into(), value.into());
    }

    pub fn add_listener(&mut self, event_type: impl Into<String>, capture: bool, decoder: DecoderSpec) {
        self.listeners
            .insert(ListenerKey::new(event_type, capture), decoder);
    }

    /// Look up a property, treating `null` as absent.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name).filter(|v| !v.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn last_write_wins_per_name() {
        let mut settings = Settings::new();
        settings.set_property("value", json!("a"));
        settings.set_property("value", json!("b"));
        settings.set_attribute("id", "x");
        settings.set_attribute("id", "y");
        assert_eq!(settings.property("value"), Some(&json!("b")));
        assert_eq!(settings.attributes.len(), 1);
        assert_eq!(settings.attributes[&AttributeKey::new("id")], "y");
    }

    #[test]
    fn namespaced_attribute_is_distinct() {
        let mut settings = Settings::new();
        settings.set_attribute("href", "a");
        settings.set_attribute_ns("http://www.w3.org/1999/xlink", "href", "b");
        assert_eq!(settings.attributes.len(), 2);
    }

    #[test]
    fn null_property_counts_as_absent() {
        let mut settings = Settings::new();
        settings.set_property("checked", Value::Null);
        assert!(settings.is_empty());
        assert!(settings.property("checked").is_none());
    }

    #[test]
    fn listener_key_includes_capture() {
        let mut settings = Settings::new();
        settings.add_listener("click", false, DecoderSpec::Value);
        settings.add_listener("click", true, DecoderSpec::Value);
        assert_eq!(settings.listeners.len(), 2);
    }
}
