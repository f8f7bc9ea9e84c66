//! JSON documents accepted and produced by the CLI.
//!
//! ```json
//! { "type": "element", "tag": "ul", "attributes": { "class": "list" },
//!   "children": [ { "key": "a", "node": { "type": "text", "data": "A" } } ] }
//! ```
//!
//! A child list of `{ "key", "node" }` objects is keyed; a list of plain
//! documents is unkeyed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use vdelta_types::{AttributeKey, Children, DecoderSpec, Element, Node, Settings};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Document {
    Text {
        data: String,
    },
    Comment {
        data: String,
    },
    Element {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
        tag: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        namespaced_attributes: Vec<NamespacedAttribute>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        properties: BTreeMap<String, Value>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        style: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        listeners: Vec<Listener>,
        #[serde(default, skip_serializing_if = "ChildList::is_empty")]
        children: ChildList,
    },
    Fragment {
        #[serde(default)]
        children: ChildList,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamespacedAttribute {
    pub namespace: String,
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listener {
    pub event: String,
    #[serde(default)]
    pub capture: bool,
    pub decoder: DecoderSpec,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyedChild {
    pub key: String,
    pub node: Document,
}

/// Unkeyed is tried first, so `[]` reads as an empty unkeyed list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildList {
    Unkeyed(Vec<Document>),
    Keyed(Vec<KeyedChild>),
}

impl Default for ChildList {
    fn default() -> Self {
        Self::Unkeyed(Vec::new())
    }
}

impl ChildList {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Unkeyed(children) => children.is_empty(),
            Self::Keyed(children) => children.is_empty(),
        }
    }

    fn into_children(self) -> Children {
        match self {
            Self::Unkeyed(children) => {
                Children::Unkeyed(children.into_iter().map(Document::into_node).collect())
            }
            Self::Keyed(children) => Children::Keyed(
                children
                    .into_iter()
                    .map(|child| (child.key, child.node.into_node()))
                    .collect(),
            ),
        }
    }

    fn from_children(children: &Children) -> Self {
        match children {
            Children::Unkeyed(nodes) => Self::Unkeyed(nodes.iter().map(Document::from_node).collect()),
            Children::Keyed(nodes) => Self::Keyed(
                nodes
                    .iter()
                    .map(|(key, node)| KeyedChild {
                        key: key.clone(),
                        node: Document::from_node(node),
                    })
                    .collect(),
            ),
        }
    }
}

impl Document {
    pub fn into_node(self) -> Node {
        match self {
            Self::Text { data } => Node::Text(data),
            Self::Comment { data } => Node::Comment(data),
            Self::Element {
                namespace,
                tag,
                attributes,
                namespaced_attributes,
                properties,
                style,
                listeners,
                children,
            } => {
                let mut settings = Settings::new();
                for (name, value) in attributes {
                    settings.set_attribute(name, value);
                }
                for attr in namespaced_attributes {
                    settings.set_attribute_ns(attr.namespace, attr.name, attr.value);
                }
                for (name, value) in properties {
                    settings.set_property(name, value);
                }
                for (name, value) in style {
                    settings.set_style(name, value);
                }
                for listener in listeners {
                    settings.add_listener(listener.event, listener.capture, listener.decoder);
                }
                Node::Element(Element {
                    namespace,
                    local_name: tag,
                    settings,
                    children: children.into_children(),
                })
            }
            Self::Fragment { children } => Node::Fragment(children.into_children()),
        }
    }

    /// Thunks are forced and tagged wrappers dropped.
    pub fn from_node(node: &Node) -> Self {
        match node {
            Node::Text(data) => Self::Text { data: data.clone() },
            Node::Comment(data) => Self::Comment { data: data.clone() },
            Node::Element(element) => {
                let settings = &element.settings;
                let mut attributes = BTreeMap::new();
                let mut namespaced_attributes = Vec::new();
                for (AttributeKey { namespace, name }, value) in &settings.attributes {
                    match namespace {
                        Some(namespace) => namespaced_attributes.push(NamespacedAttribute {
                            namespace: namespace.clone(),
                            name: name.clone(),
                            value: value.clone(),
                        }),
                        None => {
                            attributes.insert(name.clone(), value.clone());
                        }
                    }
                }
                Self::Element {
                    namespace: element.namespace.clone(),
                    tag: element.local_name.clone(),
                    attributes,
                    namespaced_attributes,
                    properties: settings.properties.clone(),
                    style: settings.style.clone(),
                    listeners: settings
                        .listeners
                        .iter()
                        .map(|(key, decoder)| Listener {
                            event: key.event_type.clone(),
                            capture: key.capture,
                            decoder: decoder.clone(),
                        })
                        .collect(),
                    children: ChildList::from_children(&element.children),
                }
            }
            Node::Fragment(children) => Self::Fragment {
                children: ChildList::from_children(children),
            },
            Node::Thunk(thunk) => Self::from_node(thunk.force()),
            Node::Tagged(tagged) => Self::from_node(tagged.node()),
        }
    }

    /// A single node stays as is; anything else becomes a fragment.
    pub fn from_roots(roots: &[Node]) -> Self {
        match roots {
            [only] => Self::from_node(only),
            _ => Self::Fragment {
                children: ChildList::Unkeyed(roots.iter().map(Self::from_node).collect()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_keyed_and_unkeyed_children() {
        let doc: Document = serde_json::from_value(json!({
            "type": "element",
            "tag": "ul",
            "attributes": { "class": "list" },
            "children": [
                { "key": "a", "node": { "type": "text", "data": "A" } },
                { "key": "b", "node": { "type": "comment", "data": "B" } }
            ]
        }))
        .unwrap();
        let node = doc.into_node();
        assert_eq!(
            node,
            Node::from(Element::new("ul").attr("class", "list").keyed(vec![
                ("a", Node::text("A")),
                ("b", Node::comment("B")),
            ]))
        );

        let doc: Document = serde_json::from_value(json!({
            "type": "fragment",
            "children": [{ "type": "text", "data": "x" }]
        }))
        .unwrap();
        assert_eq!(doc.into_node(), Node::fragment(vec![Node::text("x")]));
    }

    #[test]
    fn empty_child_list_is_unkeyed() {
        let doc: Document =
            serde_json::from_value(json!({ "type": "element", "tag": "br", "children": [] })).unwrap();
        assert_eq!(doc.into_node(), Node::from(Element::new("br")));
    }

    #[test]
    fn settings_survive_node_conversion() {
        let element = Element::with_namespace("http://www.w3.org/2000/svg", "svg")
            .attr("width", "10")
            .attr_ns("http://www.w3.org/1999/xlink", "href", "#a")
            .prop("value", json!(3))
            .style("color", "red")
            .on("click", true, DecoderSpec::field("x", DecoderSpec::Int));
        let node = Node::from(element);
        let doc = Document::from_node(&node);
        let text = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&text).unwrap();
        assert_eq!(back.into_node(), node);
    }

    #[test]
    fn roots_become_a_fragment() {
        let roots = vec![Node::text("a"), Node::text("b")];
        assert_eq!(
            Document::from_roots(&roots).into_node(),
            Node::fragment(roots.clone())
        );
        assert_eq!(Document::from_roots(&roots[..1]).into_node(), Node::text("a"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_value::<Document>(json!({ "type": "widget" })).is_err());
    }
}
