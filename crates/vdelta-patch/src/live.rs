//! In-memory reference host.
//!
//! [`LiveTree`] is a plain owned tree under a root container, plus the stash
//! table used by reorders. It implements [`Executor`] with a cursor made of
//! the path to the current parent and the position inside it.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use vdelta_types::{Address, AttributeKey, ChangeLog, Children, DecoderSpec, Element, ListenerKey, Node, Settings};

use crate::error::{ApplyError, HostError, HostResult};
use crate::executor::{self, Executor};
use crate::reader::PatchReader;

/// A node as it exists in the host.
#[derive(Clone, Debug, PartialEq)]
pub enum LiveNode {
    Text(String),
    Comment(String),
    Element {
        namespace: Option<String>,
        local_name: String,
        settings: Settings,
        children: Vec<LiveNode>,
    },
}

impl LiveNode {
    fn element(namespace: Option<&str>, local_name: &str) -> Self {
        Self::Element {
            namespace: namespace.map(str::to_string),
            local_name: local_name.to_string(),
            settings: Settings::default(),
            children: Vec::new(),
        }
    }

    /// Build from a concrete (already flattened) node.
    fn from_node(node: &Node) -> Vec<Self> {
        node.flatten()
            .iter()
            .filter_map(|node| match node {
                Node::Text(data) => Some(Self::Text(data.clone())),
                Node::Comment(data) => Some(Self::Comment(data.clone())),
                Node::Element(element) => Some(Self::Element {
                    namespace: element.namespace.clone(),
                    local_name: element.local_name.clone(),
                    settings: element.settings.clone(),
                    children: element
                        .children
                        .nodes()
                        .flat_map(LiveNode::from_node)
                        .collect(),
                }),
                // flatten() leaves only concrete nodes.
                Node::Fragment(_) | Node::Thunk(_) | Node::Tagged(_) => None,
            })
            .collect()
    }

    pub fn to_node(&self) -> Node {
        match self {
            Self::Text(data) => Node::Text(data.clone()),
            Self::Comment(data) => Node::Comment(data.clone()),
            Self::Element {
                namespace,
                local_name,
                settings,
                children,
            } => Node::Element(Element {
                namespace: namespace.clone(),
                local_name: local_name.clone(),
                settings: settings.clone(),
                children: Children::Unkeyed(children.iter().map(LiveNode::to_node).collect()),
            }),
        }
    }

    fn settings_mut(&mut self, op: &'static str) -> HostResult<&mut Settings> {
        match self {
            Self::Element { settings, .. } => Ok(settings),
            _ => Err(HostError::WrongNodeKind(op)),
        }
    }
}

/// Cursor into a [`LiveTree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveCursor {
    path: Vec<usize>,
    position: isize,
}

impl LiveCursor {
    /// Before the first node of the root container.
    pub fn root() -> Self {
        Self {
            path: Vec::new(),
            position: -1,
        }
    }

    /// Child indices leading to the current parent.
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    /// Position inside the current parent, `-1` before the first child.
    pub fn position(&self) -> isize {
        self.position
    }
}

impl Default for LiveCursor {
    fn default() -> Self {
        Self::root()
    }
}

/// In-memory live structure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LiveTree {
    roots: Vec<LiveNode>,
    stash: HashMap<Address, LiveNode>,
}

impl LiveTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host already holding the rendering of `node`.
    pub fn render(node: &Node) -> Self {
        Self {
            roots: LiveNode::from_node(node),
            stash: HashMap::new(),
        }
    }

    pub fn roots(&self) -> &[LiveNode] {
        &self.roots
    }

    /// Nodes currently parked in the stash.
    pub fn stashed(&self) -> usize {
        self.stash.len()
    }

    /// The structure as plain nodes, comparable with [`Node::flatten`].
    pub fn snapshot(&self) -> Vec<Node> {
        self.roots.iter().map(LiveNode::to_node).collect()
    }

    /// Apply patch bytes. On any error the tree is left untouched.
    pub fn apply_patch(&mut self, patch: &[u8]) -> Result<(), ApplyError<HostError>> {
        let mut next = self.clone();
        PatchReader::new(patch).apply(&mut next, LiveCursor::root())?;
        next.finish_pass();
        *self = next;
        Ok(())
    }

    /// Apply an owned change log. On any error the tree is left untouched.
    pub fn apply_log(&mut self, log: &ChangeLog) -> HostResult<()> {
        let mut next = self.clone();
        executor::apply_log(log, &mut next, LiveCursor::root())?;
        next.finish_pass();
        *self = next;
        Ok(())
    }

    fn finish_pass(&mut self) {
        if !self.stash.is_empty() {
            debug!(leaked = self.stash.len(), "stash not empty after patch");
            self.stash.clear();
        }
    }

    fn siblings_mut(&mut self, path: &[usize]) -> HostResult<&mut Vec<LiveNode>> {
        let mut siblings = &mut self.roots;
        for &index in path {
            match siblings.get_mut(index) {
                Some(LiveNode::Element { children, .. }) => siblings = children,
                Some(_) => return Err(HostError::WrongNodeKind("SelectChildren")),
                None => return Err(HostError::NoCurrentNode),
            }
        }
        Ok(siblings)
    }

    fn current_mut(&mut self, cursor: &LiveCursor) -> HostResult<&mut LiveNode> {
        let siblings = self.siblings_mut(&cursor.path)?;
        usize::try_from(cursor.position)
            .ok()
            .and_then(|index| siblings.get_mut(index))
            .ok_or(HostError::NoCurrentNode)
    }

    fn insert(&mut self, mut cursor: LiveCursor, node: LiveNode) -> HostResult<LiveCursor> {
        let at = (cursor.position + 1) as usize;
        let siblings = self.siblings_mut(&cursor.path)?;
        if at > siblings.len() {
            return Err(HostError::NoCurrentNode);
        }
        siblings.insert(at, node);
        cursor.position += 1;
        Ok(cursor)
    }

    fn replace(&mut self, cursor: LiveCursor, node: LiveNode) -> HostResult<LiveCursor> {
        *self.current_mut(&cursor)? = node;
        Ok(cursor)
    }

    fn take_next(&mut self, cursor: &LiveCursor) -> HostResult<LiveNode> {
        let at = (cursor.position + 1) as usize;
        let siblings = self.siblings_mut(&cursor.path)?;
        if at >= siblings.len() {
            return Err(HostError::NoNextSibling);
        }
        Ok(siblings.remove(at))
    }

    fn unstash(&mut self, address: Address) -> HostResult<LiveNode> {
        self.stash.remove(&address).ok_or(HostError::EmptyAddress(address))
    }

    fn settings(&mut self, cursor: &LiveCursor, op: &'static str) -> HostResult<&mut Settings> {
        self.current_mut(cursor)?.settings_mut(op)
    }
}

impl Executor for LiveTree {
    type Cursor = LiveCursor;
    type Error = HostError;

    fn select_children(&mut self, mut cursor: LiveCursor) -> HostResult<LiveCursor> {
        match self.current_mut(&cursor)? {
            LiveNode::Element { .. } => {
                cursor.path.push(cursor.position as usize);
                cursor.position = -1;
                Ok(cursor)
            }
            _ => Err(HostError::WrongNodeKind("SelectChildren")),
        }
    }

    fn select_sibling(&mut self, mut cursor: LiveCursor, offset: i32) -> HostResult<LiveCursor> {
        let len = self.siblings_mut(&cursor.path)?.len();
        let target = cursor.position + offset as isize;
        if target < -1 || target >= len as isize {
            return Err(HostError::SiblingOutOfRange {
                position: cursor.position,
                offset,
                len,
            });
        }
        cursor.position = target;
        Ok(cursor)
    }

    fn select_parent(&mut self, mut cursor: LiveCursor) -> HostResult<LiveCursor> {
        let index = cursor.path.pop().ok_or(HostError::AtRoot)?;
        cursor.position = index as isize;
        Ok(cursor)
    }

    fn insert_text(&mut self, cursor: LiveCursor, data: &str) -> HostResult<LiveCursor> {
        self.insert(cursor, LiveNode::Text(data.to_string()))
    }

    fn insert_comment(&mut self, cursor: LiveCursor, data: &str) -> HostResult<LiveCursor> {
        self.insert(cursor, LiveNode::Comment(data.to_string()))
    }

    fn insert_element(&mut self, cursor: LiveCursor, local_name: &str) -> HostResult<LiveCursor> {
        self.insert(cursor, LiveNode::element(None, local_name))
    }

    fn insert_element_ns(
        &mut self,
        cursor: LiveCursor,
        namespace: &str,
        local_name: &str,
    ) -> HostResult<LiveCursor> {
        self.insert(cursor, LiveNode::element(Some(namespace), local_name))
    }

    fn insert_stashed_node(&mut self, cursor: LiveCursor, address: Address) -> HostResult<LiveCursor> {
        let node = self.unstash(address)?;
        self.insert(cursor, node)
    }

    fn replace_with_text(&mut self, cursor: LiveCursor, data: &str) -> HostResult<LiveCursor> {
        self.replace(cursor, LiveNode::Text(data.to_string()))
    }

    fn replace_with_comment(&mut self, cursor: LiveCursor, data: &str) -> HostResult<LiveCursor> {
        self.replace(cursor, LiveNode::Comment(data.to_string()))
    }

    fn replace_with_element(&mut self, cursor: LiveCursor, local_name: &str) -> HostResult<LiveCursor> {
        self.replace(cursor, LiveNode::element(None, local_name))
    }

    fn replace_with_element_ns(
        &mut self,
        cursor: LiveCursor,
        namespace: &str,
        local_name: &str,
    ) -> HostResult<LiveCursor> {
        self.replace(cursor, LiveNode::element(Some(namespace), local_name))
    }

    fn replace_with_stashed_node(
        &mut self,
        cursor: LiveCursor,
        address: Address,
    ) -> HostResult<LiveCursor> {
        // Check the target first so a bad cursor does not lose the stashed node.
        self.current_mut(&cursor)?;
        let node = self.unstash(address)?;
        self.replace(cursor, node)
    }

    fn remove_next_sibling(&mut self, cursor: LiveCursor) -> HostResult<LiveCursor> {
        self.take_next(&cursor)?;
        Ok(cursor)
    }

    fn set_text_data(&mut self, cursor: LiveCursor, data: &str) -> HostResult<LiveCursor> {
        match self.current_mut(&cursor)? {
            LiveNode::Text(text) | LiveNode::Comment(text) => {
                *text = data.to_string();
                Ok(cursor)
            }
            LiveNode::Element { .. } => Err(HostError::WrongNodeKind("SetTextData")),
        }
    }

    fn edit_text_data(
        &mut self,
        cursor: LiveCursor,
        start: u32,
        end: u32,
        prefix: &str,
        suffix: &str,
    ) -> HostResult<LiveCursor> {
        let text = match self.current_mut(&cursor)? {
            LiveNode::Text(text) | LiveNode::Comment(text) => text,
            LiveNode::Element { .. } => return Err(HostError::WrongNodeKind("EditTextData")),
        };
        let len = text.chars().count();
        let (start, end) = (start as usize, end as usize);
        if start + end > len {
            return Err(HostError::EditOutOfRange {
                start: start as u32,
                end: end as u32,
                len,
            });
        }
        let kept: String = text.chars().skip(start).take(len - start - end).collect();
        *text = format!("{prefix}{kept}{suffix}");
        Ok(cursor)
    }

    fn set_attribute(&mut self, cursor: LiveCursor, name: &str, value: &str) -> HostResult<LiveCursor> {
        self.settings(&cursor, "SetAttribute")?.set_attribute(name, value);
        Ok(cursor)
    }

    fn set_attribute_ns(
        &mut self,
        cursor: LiveCursor,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> HostResult<LiveCursor> {
        self.settings(&cursor, "SetAttributeNs")?
            .set_attribute_ns(namespace, name, value);
        Ok(cursor)
    }

    fn remove_attribute(&mut self, cursor: LiveCursor, name: &str) -> HostResult<LiveCursor> {
        self.settings(&cursor, "RemoveAttribute")?
            .attributes
            .remove(&AttributeKey::new(name));
        Ok(cursor)
    }

    fn remove_attribute_ns(
        &mut self,
        cursor: LiveCursor,
        namespace: &str,
        name: &str,
    ) -> HostResult<LiveCursor> {
        self.settings(&cursor, "RemoveAttributeNs")?
            .attributes
            .remove(&AttributeKey::namespaced(namespace, name));
        Ok(cursor)
    }

    fn assign_property(&mut self, cursor: LiveCursor, name: &str, value: &Value) -> HostResult<LiveCursor> {
        self.settings(&cursor, "AssignProperty")?
            .set_property(name, value.clone());
        Ok(cursor)
    }

    fn delete_property(&mut self, cursor: LiveCursor, name: &str) -> HostResult<LiveCursor> {
        self.settings(&cursor, "DeleteProperty")?.properties.remove(name);
        Ok(cursor)
    }

    fn set_style_rule(&mut self, cursor: LiveCursor, name: &str, value: &str) -> HostResult<LiveCursor> {
        self.settings(&cursor, "SetStyleRule")?.set_style(name, value);
        Ok(cursor)
    }

    fn remove_style_rule(&mut self, cursor: LiveCursor, name: &str) -> HostResult<LiveCursor> {
        self.settings(&cursor, "RemoveStyleRule")?.style.remove(name);
        Ok(cursor)
    }

    fn add_event_listener(
        &mut self,
        cursor: LiveCursor,
        event_type: &str,
        decoder: &DecoderSpec,
        capture: bool,
    ) -> HostResult<LiveCursor> {
        self.settings(&cursor, "AddEventListener")?
            .add_listener(event_type, capture, decoder.clone());
        Ok(cursor)
    }

    fn remove_event_listener(
        &mut self,
        cursor: LiveCursor,
        event_type: &str,
        _decoder: &DecoderSpec,
        capture: bool,
    ) -> HostResult<LiveCursor> {
        self.settings(&cursor, "RemoveEventListener")?
            .listeners
            .remove(&ListenerKey::new(event_type, capture));
        Ok(cursor)
    }

    fn stash_next_sibling(&mut self, cursor: LiveCursor, address: Address) -> HostResult<LiveCursor> {
        if self.stash.contains_key(&address) {
            return Err(HostError::AddressInUse(address));
        }
        let node = self.take_next(&cursor)?;
        self.stash.insert(address, node);
        Ok(cursor)
    }

    fn discard_stashed_node(&mut self, cursor: LiveCursor, address: Address) -> HostResult<LiveCursor> {
        self.unstash(address)?;
        Ok(cursor)
    }

    fn shift_siblings(&mut self, cursor: LiveCursor, count: u32) -> HostResult<LiveCursor> {
        let at = (cursor.position + 1) as usize;
        let from = at + count as usize;
        let siblings = self.siblings_mut(&cursor.path)?;
        if from >= siblings.len() {
            return Err(HostError::NoNextSibling);
        }
        let node = siblings.remove(from);
        siblings.insert(at, node);
        Ok(cursor)
    }
}
