//! Keyed list reconciliation.
//!
//! Keys of both lists are aligned with an [`EditTable`] and the edit script is
//! walked front to back. Nodes whose key survives are moved instead of being
//! rebuilt:
//!
//! - a node needed further ahead is pulled forward with `ShiftSiblings`
//! - a node needed further back is parked with `StashNextSibling` and put
//!   back with `InsertStashedNode`
//!
//! Only single-slot nodes move. Anything else is removed and inserted again.
//! Stashed nodes that end up unused are discarded at the end of the list.

use std::collections::HashMap;

use tracing::debug;

use vdelta_types::{Address, Instruction, Node};

use crate::differ::Pass;
use crate::table::{Edit, EditTable};

struct Stashed<'a> {
    address: Address,
    node: &'a Node,
    used: bool,
}

#[derive(Default)]
struct Tally {
    retained: usize,
    shifted: usize,
    stashed: usize,
    inserted: usize,
    removed: usize,
}

impl Pass<'_> {
    pub(crate) fn diff_keyed(&mut self, last: &[(String, Node)], next: &[(String, Node)]) {
        let last_keys: Vec<&str> = last.iter().map(|(k, _)| k.as_str()).collect();
        let next_keys: Vec<&str> = next.iter().map(|(k, _)| k.as_str()).collect();
        let table = EditTable::build(&last_keys, &next_keys);

        // First occurrence in `last`, final occurrence in `next`.
        let mut last_index: HashMap<&str, usize> = HashMap::with_capacity(last.len());
        for (index, key) in last_keys.iter().enumerate() {
            last_index.entry(*key).or_insert(index);
        }
        let next_index: HashMap<&str, usize> = next_keys
            .iter()
            .enumerate()
            .map(|(index, key)| (*key, index))
            .collect();

        let mut shifted = vec![false; last.len()];
        let mut stash: HashMap<&str, usize> = HashMap::new();
        let mut stashed: Vec<Stashed<'_>> = Vec::new();
        let mut tally = Tally::default();
        let (mut i, mut j) = (0, 0);

        for edit in table.script() {
            match edit {
                Edit::Delete(_) => {
                    let (key, node) = (&last[j].0, &last[j].1);
                    if shifted[j] {
                        // Already pulled forward.
                    } else if node.span() == 1
                        && !stash.contains_key(key.as_str())
                        && next_index.get(key.as_str()).is_some_and(|&at| at >= i)
                    {
                        let address = self.addresses.mint();
                        self.emit(Instruction::StashNextSibling { address });
                        stash.insert(key.as_str(), stashed.len());
                        stashed.push(Stashed {
                            address,
                            node,
                            used: false,
                        });
                        tally.stashed += 1;
                    } else {
                        self.remove_node(node);
                        tally.removed += 1;
                    }
                    j += 1;
                }
                Edit::Retain(_) => {
                    if shifted[j] {
                        self.insert_node(&next[i].1);
                        tally.inserted += 1;
                    } else {
                        self.diff_node(&last[j].1, &next[i].1);
                        tally.retained += 1;
                    }
                    i += 1;
                    j += 1;
                }
                Edit::Insert(_) => {
                    let (key, node) = (next[i].0.as_str(), &next[i].1);
                    if let Some(entry) = stash
                        .get(key)
                        .map(|&slot| &mut stashed[slot])
                        .filter(|entry| !entry.used)
                    {
                        entry.used = true;
                        let (address, old) = (entry.address, entry.node);
                        self.emit(Instruction::InsertStashedNode { address });
                        self.select_sibling(-1);
                        self.diff_node(old, node);
                    } else if let Some(at) = movable(last, &shifted, &last_index, key, j) {
                        let count: usize = (j..at)
                            .filter(|&k| !shifted[k])
                            .map(|k| last[k].1.span())
                            .sum();
                        if count > 0 {
                            self.emit(Instruction::ShiftSiblings {
                                count: count as u32,
                            });
                        }
                        shifted[at] = true;
                        self.diff_node(&last[at].1, node);
                        tally.shifted += 1;
                    } else {
                        self.insert_node(node);
                        tally.inserted += 1;
                    }
                    i += 1;
                }
            }
        }

        for entry in stashed.iter().filter(|entry| !entry.used) {
            self.emit_detached(Instruction::DiscardStashedNode {
                address: entry.address,
            });
        }

        debug!(
            last = last.len(),
            next = next.len(),
            retained = tally.retained,
            shifted = tally.shifted,
            stashed = tally.stashed,
            inserted = tally.inserted,
            removed = tally.removed,
            "keyed list reconciled"
        );
    }
}

/// Index of a not yet consumed single-slot node in `last` with `key`.
fn movable(
    last: &[(String, Node)],
    shifted: &[bool],
    last_index: &HashMap<&str, usize>,
    key: &str,
    j: usize,
) -> Option<usize> {
    let at = *last_index.get(key)?;
    (at >= j && !shifted[at] && last[at].1.span() == 1).then_some(at)
}
