//! Settings diff: attributes, properties, style rules, and listeners.
//!
//! Each collection is compared by key. Keys only in `last` are removed,
//! keys whose value differs are set. Listeners are never patched partially:
//! any difference in the decoder removes the old listener and adds the new
//! one. Removals of every kind come before the sets of that kind.

use vdelta_types::{Instruction, Settings};

/// Compute the instructions that turn `last` settings into `next` settings
/// on the current element.
pub fn diff_settings(last: &Settings, next: &Settings) -> Vec<Instruction> {
    let mut out = Vec::new();
    diff_attributes(last, next, &mut out);
    diff_properties(last, next, &mut out);
    diff_style(last, next, &mut out);
    diff_listeners(last, next, &mut out);
    out
}

fn diff_attributes(last: &Settings, next: &Settings, out: &mut Vec<Instruction>) {
    for key in last.attributes.keys() {
        if next.attributes.contains_key(key) {
            continue;
        }
        out.push(match &key.namespace {
            Some(namespace) => Instruction::RemoveAttributeNs {
                namespace: namespace.clone(),
                name: key.name.clone(),
            },
            None => Instruction::RemoveAttribute {
                name: key.name.clone(),
            },
        });
    }

    for (key, value) in &next.attributes {
        if last.attributes.get(key) == Some(value) {
            continue;
        }
        out.push(match &key.namespace {
            Some(namespace) => Instruction::SetAttributeNs {
                namespace: namespace.clone(),
                name: key.name.clone(),
                value: value.clone(),
            },
            None => Instruction::SetAttribute {
                name: key.name.clone(),
                value: value.clone(),
            },
        });
    }
}

fn diff_properties(last: &Settings, next: &Settings, out: &mut Vec<Instruction>) {
    for name in last.properties.keys() {
        if last.property(name).is_some() && next.property(name).is_none() {
            out.push(Instruction::DeleteProperty { name: name.clone() });
        }
    }

    for name in next.properties.keys() {
        let Some(value) = next.property(name) else {
            continue;
        };
        if last.property(name) != Some(value) {
            out.push(Instruction::AssignProperty {
                name: name.clone(),
                value: value.clone(),
            });
        }
    }
}

fn diff_style(last: &Settings, next: &Settings, out: &mut Vec<Instruction>) {
    for name in last.style.keys() {
        if !next.style.contains_key(name) {
            out.push(Instruction::RemoveStyleRule { name: name.clone() });
        }
    }

    for (name, value) in &next.style {
        if last.style.get(name) != Some(value) {
            out.push(Instruction::SetStyleRule {
                name: name.clone(),
                value: value.clone(),
            });
        }
    }
}

fn diff_listeners(last: &Settings, next: &Settings, out: &mut Vec<Instruction>) {
    for (key, decoder) in &last.listeners {
        if next.listeners.get(key) != Some(decoder) {
            out.push(Instruction::RemoveEventListener {
                event_type: key.event_type.clone(),
                decoder: decoder.clone(),
                capture: key.capture,
            });
        }
    }

    for (key, decoder) in &next.listeners {
        if last.listeners.get(key) != Some(decoder) {
            out.push(Instruction::AddEventListener {
                event_type: key.event_type.clone(),
                decoder: decoder.clone(),
                capture: key.capture,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use vdelta_types::DecoderSpec;

    const SVG_XLINK: &str = "http://www.w3.org/1999/xlink";

    fn settings() -> Settings {
        Settings::new()
    }

    #[test]
    fn identical_settings_no_change() {
        let mut s = settings();
        s.set_attribute("id", "main");
        s.set_property("value", json!("x"));
        s.set_style("color", "red");
        s.add_listener("click", false, DecoderSpec::Value);
        assert!(diff_settings(&s, &s.clone()).is_empty());
    }

    #[test]
    fn attribute_add_change_remove() {
        let mut last = settings();
        last.set_attribute("id", "a");
        last.set_attribute("title", "t");
        let mut next = settings();
        next.set_attribute("id", "b");
        next.set_attribute("class", "c");

        assert_eq!(
            diff_settings(&last, &next),
            vec![
                Instruction::RemoveAttribute { name: "title".into() },
                Instruction::SetAttribute { name: "class".into(), value: "c".into() },
                Instruction::SetAttribute { name: "id".into(), value: "b".into() },
            ]
        );
    }

    #[test]
    fn namespaced_attributes_use_ns_instructions() {
        let mut last = settings();
        last.set_attribute_ns(SVG_XLINK, "title", "old");
        let mut next = settings();
        next.set_attribute_ns(SVG_XLINK, "href", "#a");

        assert_eq!(
            diff_settings(&last, &next),
            vec![
                Instruction::RemoveAttributeNs {
                    namespace: SVG_XLINK.into(),
                    name: "title".into()
                },
                Instruction::SetAttributeNs {
                    namespace: SVG_XLINK.into(),
                    name: "href".into(),
                    value: "#a".into()
                },
            ]
        );
    }

    #[test]
    fn null_property_means_delete() {
        let mut last = settings();
        last.set_property("checked", json!(true));
        last.set_property("value", json!("v"));
        let mut next = settings();
        next.set_property("checked", Value::Null);
        next.set_property("value", json!("v"));

        assert_eq!(
            diff_settings(&last, &next),
            vec![Instruction::DeleteProperty { name: "checked".into() }]
        );
    }

    #[test]
    fn property_value_change_assigns() {
        let mut last = settings();
        last.set_property("data", json!({"n": 1}));
        let mut next = settings();
        next.set_property("data", json!({"n": 2}));

        assert_eq!(
            diff_settings(&last, &next),
            vec![Instruction::AssignProperty {
                name: "data".into(),
                value: json!({"n": 2})
            }]
        );
    }

    #[test]
    fn style_rules() {
        let mut last = settings();
        last.set_style("color", "red");
        last.set_style("margin", "0");
        let mut next = settings();
        next.set_style("color", "blue");

        assert_eq!(
            diff_settings(&last, &next),
            vec![
                Instruction::RemoveStyleRule { name: "margin".into() },
                Instruction::SetStyleRule { name: "color".into(), value: "blue".into() },
            ]
        );
    }

    #[test]
    fn listener_leaf_change_is_remove_then_add() {
        let old = DecoderSpec::field("key", DecoderSpec::Match { literal: json!("Enter") });
        let new = DecoderSpec::field("key", DecoderSpec::Match { literal: json!("Tab") });
        let mut last = settings();
        last.add_listener("keydown", false, old.clone());
        let mut next = settings();
        next.add_listener("keydown", false, new.clone());

        assert_eq!(
            diff_settings(&last, &next),
            vec![
                Instruction::RemoveEventListener {
                    event_type: "keydown".into(),
                    decoder: old,
                    capture: false
                },
                Instruction::AddEventListener {
                    event_type: "keydown".into(),
                    decoder: new,
                    capture: false
                },
            ]
        );
    }

    #[test]
    fn listener_capture_flag_is_part_of_identity() {
        let mut last = settings();
        last.add_listener("click", false, DecoderSpec::Value);
        let mut next = settings();
        next.add_listener("click", true, DecoderSpec::Value);

        let ops = diff_settings(&last, &next);
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[0],
            Instruction::RemoveEventListener { capture: false, .. }
        ));
        assert!(matches!(
            &ops[1],
            Instruction::AddEventListener { capture: true, .. }
        ));
    }

    #[test]
    fn category_order_is_stable() {
        let last = settings();
        let mut next = settings();
        next.add_listener("input", false, DecoderSpec::Value);
        next.set_style("color", "red");
        next.set_property("value", json!(1));
        next.set_attribute("id", "x");

        let names: Vec<&str> = diff_settings(&last, &next)
            .iter()
            .map(Instruction::name)
            .collect();
        assert_eq!(
            names,
            ["SetAttribute", "AssignProperty", "SetStyleRule", "AddEventListener"]
        );
    }
}
