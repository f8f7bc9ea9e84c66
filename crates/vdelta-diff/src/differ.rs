//! Structural tree diff.
//!
//! A diff pass walks `last` and `next` in lockstep and records the
//! instructions that turn a structure rendered from `last` into one matching
//! `next`. Inputs are only borrowed; the resulting [`ChangeLog`] owns all of
//! its data.
//!
//! # Cursor convention
//!
//! Diffing a node starts with the cursor on the slot *before* the node and
//! leaves it on the node's last slot. A diff of the whole tree therefore
//! starts just before the root inside the host container.

use tracing::debug;

use vdelta_types::{
    AddressCounter, ChangeLog, Children, Element, Instruction, Node, Settings,
};

use crate::config::DiffConfig;
use crate::cursor::NavigationLog;
use crate::settings_diff::diff_settings;
use crate::text_diff::diff_text;

/// Diff driver holding the configuration shared by its passes.
#[derive(Clone, Debug, Default)]
pub struct Differ {
    config: DiffConfig,
}

impl Differ {
    pub fn new(config: DiffConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Compute the change log from `last` to `next`.
    pub fn diff(&self, last: &Node, next: &Node) -> ChangeLog {
        let mut pass = Pass::new(&self.config);
        pass.diff_node(last, next);
        let log = pass.finish();
        debug!(
            instructions = log.len(),
            mutations = log.mutations(),
            "diff pass complete"
        );
        log
    }
}

/// Diff with the default configuration.
pub fn diff(last: &Node, next: &Node) -> ChangeLog {
    Differ::default().diff(last, next)
}

/// Diff against an empty host: every node of `next` is inserted.
pub fn diff_from_empty(next: &Node) -> ChangeLog {
    diff(&Node::empty(), next)
}

/// State of one diff pass. Dropped when the pass returns.
pub(crate) struct Pass<'c> {
    config: &'c DiffConfig,
    out: Vec<Instruction>,
    nav: NavigationLog,
    pub(crate) addresses: AddressCounter,
}

impl<'c> Pass<'c> {
    fn new(config: &'c DiffConfig) -> Self {
        Self {
            config,
            out: Vec::new(),
            nav: NavigationLog::new(),
            addresses: AddressCounter::new(),
        }
    }

    fn finish(mut self) -> ChangeLog {
        self.nav.clear();
        ChangeLog::from(self.out)
    }

    // ---------------------------------------------------------------
    // Emission
    // ---------------------------------------------------------------

    /// Emit a mutation, materializing pending navigation first.
    pub(crate) fn emit(&mut self, instruction: Instruction) {
        self.nav.flush_into(&mut self.out);
        self.out.push(instruction);
    }

    /// Emit an instruction that does not read the cursor. Pending
    /// navigation stays pending.
    pub(crate) fn emit_detached(&mut self, instruction: Instruction) {
        self.out.push(instruction);
    }

    pub(crate) fn select_sibling(&mut self, offset: i32) {
        self.nav.select_sibling(offset);
    }

    /// Move over `slots` sibling slots without touching them.
    pub(crate) fn skip(&mut self, slots: usize) {
        if slots > 0 {
            self.nav.select_sibling(slots as i32);
        }
    }

    // ---------------------------------------------------------------
    // Structural dispatch
    // ---------------------------------------------------------------

    pub(crate) fn diff_node(&mut self, last: &Node, next: &Node) {
        if last.is_same(next) {
            self.skip(last.span());
            return;
        }

        match (last, next) {
            (Node::Tagged(l), Node::Tagged(n)) => self.diff_node(l.node(), n.node()),
            (Node::Thunk(l), Node::Thunk(n)) => {
                if l.matches(n) {
                    n.adopt(l);
                    self.skip(l.force().span());
                } else {
                    self.diff_node(l.force(), n.force());
                }
            }
            (Node::Text(l), Node::Text(n)) | (Node::Comment(l), Node::Comment(n)) => {
                self.select_sibling(1);
                if let Some(instruction) = diff_text(l, n, self.config) {
                    self.emit(instruction);
                }
            }
            (Node::Element(l), Node::Element(n))
                if l.children.is_keyed() == n.children.is_keyed() && l.same_tag(n) =>
            {
                self.select_sibling(1);
                self.diff_element(l, n);
            }
            (Node::Fragment(l), Node::Fragment(n)) if l.is_keyed() == n.is_keyed() => {
                self.diff_children(l, n);
            }
            _ => self.replace(last, next),
        }
    }

    /// Diff an element already under the cursor.
    fn diff_element(&mut self, last: &Element, next: &Element) {
        for instruction in diff_settings(&last.settings, &next.settings) {
            self.emit(instruction);
        }
        if last.children.is_empty() && next.children.is_empty() {
            return;
        }
        self.nav.select_children();
        self.diff_children(&last.children, &next.children);
        self.nav.select_parent();
    }

    fn diff_children(&mut self, last: &Children, next: &Children) {
        match (last, next) {
            (Children::Unkeyed(l), Children::Unkeyed(n)) => self.diff_unkeyed(l, n),
            (Children::Keyed(l), Children::Keyed(n)) => self.diff_keyed(l, n),
            _ => {
                for child in last.nodes() {
                    self.remove_node(child);
                }
                for child in next.nodes() {
                    self.insert_node(child);
                }
            }
        }
    }

    /// Positional alignment. Never reorders.
    fn diff_unkeyed(&mut self, last: &[Node], next: &[Node]) {
        for (l, n) in last.iter().zip(next) {
            self.diff_node(l, n);
        }
        for l in last.iter().skip(next.len()) {
            self.remove_node(l);
        }
        for n in next.iter().skip(last.len()) {
            self.insert_node(n);
        }
    }

    // ---------------------------------------------------------------
    // Replacement, insertion, removal
    // ---------------------------------------------------------------

    fn replace(&mut self, last: &Node, next: &Node) {
        match (last.span(), sole(next)) {
            (1, Some(concrete)) => {
                self.select_sibling(1);
                match concrete {
                    Sole::Text(data) => self.emit(Instruction::ReplaceWithText { data: data.into() }),
                    Sole::Comment(data) => {
                        self.emit(Instruction::ReplaceWithComment { data: data.into() })
                    }
                    Sole::Element(element) => {
                        self.emit(match &element.namespace {
                            Some(namespace) => Instruction::ReplaceWithElementNs {
                                namespace: namespace.clone(),
                                local_name: element.local_name.clone(),
                            },
                            None => Instruction::ReplaceWithElement {
                                local_name: element.local_name.clone(),
                            },
                        });
                        self.fill_element(element);
                    }
                }
            }
            _ => {
                self.remove_node(last);
                self.insert_node(next);
            }
        }
    }

    /// Insert `node` after the cursor, leaving the cursor on its last slot.
    pub(crate) fn insert_node(&mut self, node: &Node) {
        match node {
            Node::Text(data) => self.emit(Instruction::InsertText { data: data.clone() }),
            Node::Comment(data) => self.emit(Instruction::InsertComment { data: data.clone() }),
            Node::Element(element) => {
                self.emit(match &element.namespace {
                    Some(namespace) => Instruction::InsertElementNs {
                        namespace: namespace.clone(),
                        local_name: element.local_name.clone(),
                    },
                    None => Instruction::InsertElement {
                        local_name: element.local_name.clone(),
                    },
                });
                self.fill_element(element);
            }
            Node::Fragment(children) => {
                for child in children.nodes() {
                    self.insert_node(child);
                }
            }
            Node::Thunk(thunk) => self.insert_node(thunk.force()),
            Node::Tagged(tagged) => self.insert_node(tagged.node()),
        }
    }

    /// Populate a freshly created element under the cursor.
    fn fill_element(&mut self, element: &Element) {
        for instruction in diff_settings(&Settings::default(), &element.settings) {
            self.emit(instruction);
        }
        if element.children.is_empty() {
            return;
        }
        self.nav.select_children();
        for child in element.children.nodes() {
            self.insert_node(child);
        }
        self.nav.select_parent();
    }

    /// Remove every slot of `node` after the cursor. The cursor stays put.
    pub(crate) fn remove_node(&mut self, node: &Node) {
        for _ in 0..node.span() {
            self.emit(Instruction::RemoveNextSibling);
        }
    }
}

/// The only concrete node a single-slot node renders to.
enum Sole<'a> {
    Text(&'a str),
    Comment(&'a str),
    Element(&'a Element),
}

fn sole(node: &Node) -> Option<Sole<'_>> {
    match node {
        Node::Text(data) => Some(Sole::Text(data)),
        Node::Comment(data) => Some(Sole::Comment(data)),
        Node::Element(element) => Some(Sole::Element(element)),
        Node::Thunk(thunk) => sole(thunk.force()),
        Node::Tagged(tagged) => sole(tagged.node()),
        Node::Fragment(children) => {
            let mut filled = children.nodes().filter(|c| c.span() > 0);
            match (filled.next(), filled.next()) {
                (Some(only), None) => sole(only),
                _ => None,
            }
        }
    }
}
