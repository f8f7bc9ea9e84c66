//! The document node model.
//!
//! A [`Node`] tree is an immutable snapshot. Diffing borrows two snapshots
//! and never changes their structure; the only interior state is the thunk
//! cache, which memoizes a pure render function.
//!
//! # Slots
//!
//! When a tree is rendered into a live structure each node occupies a number
//! of sibling *slots*: one for text, comments and elements, and the sum of its
//! children's slots for a fragment (which splices its children into the
//! parent). Thunks and tagged wrappers occupy whatever their content does.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::decoder::DecoderSpec;
use crate::error::{TypeError, TypeResult};
use crate::settings::Settings;

/// Largest number of positional arguments a thunk may carry.
pub const MAX_THUNK_ARGS: usize = 9;

/// Render function of a thunk. Identity is pointer identity.
pub type RenderFn = dyn Fn(&[Value]) -> Node + Send + Sync;

/// Payload remapping function of a tagged wrapper.
pub type MapFn = dyn Fn(Value) -> Value + Send + Sync;

/// A document tree node.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Text(String),
    Comment(String),
    Element(Element),
    /// Tagless grouping whose children are spliced into the parent.
    Fragment(Children),
    Thunk(Thunk),
    Tagged(Tagged),
}

/// Discriminant used to decide whether two nodes can be diffed in place.
///
/// Keyed and unkeyed containers are different kinds: they are reconciled
/// with different strategies and never diffed against each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Text,
    Comment,
    Element,
    KeyedElement,
    Fragment,
    KeyedFragment,
    Thunk,
    Tagged,
}

impl Node {
    pub fn text(data: impl Into<String>) -> Self {
        Self::Text(data.into())
    }

    pub fn comment(data: impl Into<String>) -> Self {
        Self::Comment(data.into())
    }

    pub fn fragment(children: Vec<Node>) -> Self {
        Self::Fragment(Children::Unkeyed(children))
    }

    pub fn keyed_fragment<K: Into<String>>(children: Vec<(K, Node)>) -> Self {
        Self::Fragment(Children::keyed(children))
    }

    /// An empty fragment: the tree of an empty host.
    pub fn empty() -> Self {
        Self::fragment(Vec::new())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Text(_) => NodeKind::Text,
            Self::Comment(_) => NodeKind::Comment,
            Self::Element(e) if e.children.is_keyed() => NodeKind::KeyedElement,
            Self::Element(_) => NodeKind::Element,
            Self::Fragment(c) if c.is_keyed() => NodeKind::KeyedFragment,
            Self::Fragment(_) => NodeKind::Fragment,
            Self::Thunk(_) => NodeKind::Thunk,
            Self::Tagged(_) => NodeKind::Tagged,
        }
    }

    /// Reference identity: both sides are the same snapshot node.
    pub fn is_same(&self, other: &Node) -> bool {
        std::ptr::eq(self, other)
    }

    /// Number of sibling slots this node occupies once rendered.
    pub fn span(&self) -> usize {
        match self {
            Self::Text(_) | Self::Comment(_) | Self::Element(_) => 1,
            Self::Fragment(children) => children.nodes().map(Node::span).sum(),
            Self::Thunk(thunk) => thunk.force().span(),
            Self::Tagged(tagged) => tagged.node().span(),
        }
    }

    /// The rendered shape of this node: thunks forced, tagged wrappers
    /// removed, fragments spliced and keys dropped.
    ///
    /// Returns one node per slot, so the result has `self.span()` entries.
    pub fn flatten(&self) -> Vec<Node> {
        let mut out = Vec::with_capacity(1);
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut Vec<Node>) {
        match self {
            Self::Text(_) | Self::Comment(_) => out.push(self.clone()),
            Self::Element(element) => {
                let mut children = Vec::new();
                for child in element.children.nodes() {
                    child.flatten_into(&mut children);
                }
                out.push(Self::Element(Element {
                    namespace: element.namespace.clone(),
                    local_name: element.local_name.clone(),
                    settings: element.settings.clone(),
                    children: Children::Unkeyed(children),
                }));
            }
            Self::Fragment(children) => {
                for child in children.nodes() {
                    child.flatten_into(out);
                }
            }
            Self::Thunk(thunk) => thunk.force().flatten_into(out),
            Self::Tagged(tagged) => tagged.node().flatten_into(out),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<Thunk> for Node {
    fn from(thunk: Thunk) -> Self {
        Self::Thunk(thunk)
    }
}

impl From<Tagged> for Node {
    fn from(tagged: Tagged) -> Self {
        Self::Tagged(tagged)
    }
}

/// Child collection of an element or fragment.
#[derive(Clone, Debug, PartialEq)]
pub enum Children {
    Unkeyed(Vec<Node>),
    /// Each child carries an identity key used for move-aware reconciliation.
    Keyed(Vec<(String, Node)>),
}

impl Default for Children {
    fn default() -> Self {
        Self::Unkeyed(Vec::new())
    }
}

impl Children {
    pub fn keyed<K: Into<String>>(children: Vec<(K, Node)>) -> Self {
        Self::Keyed(children.into_iter().map(|(k, n)| (k.into(), n)).collect())
    }

    pub fn is_keyed(&self) -> bool {
        matches!(self, Self::Keyed(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Unkeyed(nodes) => nodes.len(),
            Self::Keyed(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the child nodes, ignoring keys.
    pub fn nodes(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        match self {
            Self::Unkeyed(nodes) => Box::new(nodes.iter()),
            Self::Keyed(entries) => Box::new(entries.iter().map(|(_, n)| n)),
        }
    }
}

/// An element: namespace, tag name, settings and children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub namespace: Option<String>,
    pub local_name: String,
    pub settings: Settings,
    pub children: Children,
}

impl Element {
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.set_attribute(name, value);
        self
    }

    pub fn attr_ns(
        mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.settings.set_attribute_ns(namespace, name, value);
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: Value) -> Self {
        self.settings.set_property(name, value);
        self
    }

    pub fn style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.set_style(name, value);
        self
    }

    pub fn on(mut self, event_type: impl Into<String>, capture: bool, decoder: DecoderSpec) -> Self {
        self.settings.add_listener(event_type, capture, decoder);
        self
    }

    /// Replace the children with an unkeyed list.
    pub fn children(mut self, children: Vec<Node>) -> Self {
        self.children = Children::Unkeyed(children);
        self
    }

    /// Replace the children with a keyed list.
    pub fn keyed<K: Into<String>>(mut self, children: Vec<(K, Node)>) -> Self {
        self.children = Children::keyed(children);
        self
    }

    /// Whether `other` has the same namespace and tag name.
    pub fn same_tag(&self, other: &Element) -> bool {
        self.namespace == other.namespace && self.local_name == other.local_name
    }
}

/// A memoized lazy node producer.
///
/// The render function must be pure: two thunks with the same function and
/// equal arguments are assumed to render the same node.
#[derive(Clone)]
pub struct Thunk {
    render: Arc<RenderFn>,
    args: Vec<Value>,
    cached: OnceLock<Arc<Node>>,
}

impl Thunk {
    /// Create a thunk. Fails if more than [`MAX_THUNK_ARGS`] arguments are given.
    pub fn new(render: Arc<RenderFn>, args: Vec<Value>) -> TypeResult<Self> {
        if args.len() > MAX_THUNK_ARGS {
            return Err(TypeError::TooManyThunkArgs {
                max: MAX_THUNK_ARGS,
                actual: args.len(),
            });
        }
        Ok(Self {
            render,
            args,
            cached: OnceLock::new(),
        })
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Whether both thunks share the same render function.
    pub fn same_render(&self, other: &Thunk) -> bool {
        Arc::ptr_eq(&self.render, &other.render)
    }

    /// Same render function and shallow-equal arguments: the cached output
    /// of one is valid for the other.
    pub fn matches(&self, other: &Thunk) -> bool {
        self.same_render(other) && self.args == other.args
    }

    /// Render on first use, then return the cached node.
    pub fn force(&self) -> &Node {
        self.rendered()
    }

    fn rendered(&self) -> &Arc<Node> {
        self.cached
            .get_or_init(|| Arc::new((self.render)(&self.args)))
    }

    pub fn is_forced(&self) -> bool {
        self.cached.get().is_some()
    }

    /// Take over the rendered output of a matching thunk without rendering.
    ///
    /// Returns `false` if this thunk already had a cached node.
    pub fn adopt(&self, from: &Thunk) -> bool {
        let node = Arc::clone(from.rendered());
        self.cached.set(node).is_ok()
    }
}

impl PartialEq for Thunk {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk")
            .field("args", &self.args)
            .field("forced", &self.is_forced())
            .finish()
    }
}

/// Transparent wrapper that remaps payloads produced inside its subtree.
///
/// The mapping only matters where events are delivered; diffing looks
/// straight through it.
#[derive(Clone)]
pub struct Tagged {
    mapper: Arc<MapFn>,
    node: Box<Node>,
}

impl Tagged {
    pub fn new(mapper: Arc<MapFn>, node: Node) -> Self {
        Self {
            mapper,
            node: Box::new(node),
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Apply the payload mapping.
    pub fn map(&self, payload: Value) -> Value {
        (self.mapper)(payload)
    }
}

impl PartialEq for Tagged {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.mapper, &other.mapper) && self.node == other.node
    }
}

impl fmt::Debug for Tagged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tagged").field("node", &self.node).finish()
    }
}
