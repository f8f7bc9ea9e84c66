//! Lazily materialized cursor navigation.
//!
//! The differ walks both trees in lockstep and reports every cursor move,
//! but most moves cross subtrees that turn out unchanged. Moves are
//! therefore recorded in a [`NavigationLog`] and only turned into
//! instructions right before a real mutation is emitted. Moves still
//! pending when the pass ends are dropped.
//!
//! Each entry is a `(level, index)` pair: first move one level
//! (`Parent`, `Same` or `Children`), then `index` siblings.

use vdelta_types::Instruction;

/// Vertical component of a logged move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Parent,
    Same,
    Children,
}

/// One coalesced cursor move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    pub level: Level,
    pub index: i32,
}

impl Move {
    const fn new(level: Level, index: i32) -> Self {
        Self { level, index }
    }
}

/// Pending cursor moves, coalesced at the head.
#[derive(Clone, Debug, Default)]
pub struct NavigationLog {
    entries: Vec<Move>,
}

impl NavigationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Move] {
        &self.entries
    }

    pub fn select_children(&mut self) {
        match self.entries.last_mut() {
            Some(head) if head.level == Level::Same && head.index == 0 => {
                head.level = Level::Children;
            }
            _ => self.entries.push(Move::new(Level::Children, 0)),
        }
    }

    pub fn select_sibling(&mut self, offset: i32) {
        if offset == 0 {
            return;
        }
        match self.entries.last_mut() {
            Some(head) => {
                head.index += offset;
                if *head == Move::new(Level::Same, 0) {
                    self.entries.pop();
                }
            }
            None => self.entries.push(Move::new(Level::Same, offset)),
        }
    }

    pub fn select_parent(&mut self) {
        match self.entries.last_mut() {
            // Children, some siblings, back up: no net move.
            Some(head) if head.level == Level::Children => {
                self.entries.pop();
            }
            // Sibling moves are irrelevant once we leave the level.
            Some(head) if head.level == Level::Same => {
                *head = Move::new(Level::Parent, 0);
            }
            Some(head) => {
                head.index = 0;
                self.entries.push(Move::new(Level::Parent, 0));
            }
            None => self.entries.push(Move::new(Level::Parent, 0)),
        }
    }

    /// Materialize and clear the pending moves.
    pub fn flush_into(&mut self, out: &mut Vec<Instruction>) {
        for entry in self.entries.drain(..) {
            match entry.level {
                Level::Parent => out.push(Instruction::SelectParent),
                Level::Children => out.push(Instruction::SelectChildren),
                Level::Same => {}
            }
            if entry.index != 0 {
                out.push(Instruction::SelectSibling {
                    offset: entry.index,
                });
            }
        }
    }

    /// Forget the pending moves.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
