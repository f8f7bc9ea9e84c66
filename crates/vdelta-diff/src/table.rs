//! Edit-distance table for keyed sequences.
//!
//! The table has one row per prefix of `next` and one column per prefix of
//! `last`. The cost of a cell is the length of the cheapest edit script that
//! turns that prefix of `last` into that prefix of `next`, where every token
//! (`Retain`, `Delete`, `Insert`) costs one. Each cell remembers the step it
//! was reached by, so the script itself is recovered by walking back from
//! the final cell.
//!
//! Candidates are considered in a fixed order and a later candidate only
//! wins when strictly cheaper:
//!
//! 1. `Up` -- `cell(i, j-1)` plus `Delete(last[j-1])`
//! 2. `Left` -- `cell(i-1, j)` plus `Insert(next[i-1])`
//! 3. `Diagonal` -- `cell(i-1, j-1)` plus `Retain` for equal keys, or
//!    `Delete` + `Insert` otherwise
//!
//! Ties therefore favour deletion, then insertion. The reorder emission in
//! the differ relies on exactly this preference.

/// One token of an edit script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edit<K> {
    Retain(K),
    Delete(K),
    Insert(K),
}

impl<K> Edit<K> {
    pub fn key(&self) -> &K {
        match self {
            Self::Retain(k) | Self::Delete(k) | Self::Insert(k) => k,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Origin,
    Up,
    Left,
    Diagonal { retained: bool },
}

#[derive(Clone, Copy, Debug)]
struct Cell {
    cost: usize,
    step: Step,
}

/// Dynamic-programming table over two key sequences.
#[derive(Debug)]
pub struct EditTable<'k, K> {
    last: &'k [K],
    next: &'k [K],
    cells: Vec<Cell>,
}

impl<'k, K: PartialEq> EditTable<'k, K> {
    /// Fill the `(next.len() + 1) x (last.len() + 1)` table.
    pub fn build(last: &'k [K], next: &'k [K]) -> Self {
        let width = last.len() + 1;
        let height = next.len() + 1;
        let mut cells = Vec::with_capacity(width * height);

        cells.push(Cell {
            cost: 0,
            step: Step::Origin,
        });
        for j in 1..width {
            cells.push(Cell {
                cost: j,
                step: Step::Up,
            });
        }

        for i in 1..height {
            cells.push(Cell {
                cost: i,
                step: Step::Left,
            });
            for j in 1..width {
                let up = cells[i * width + j - 1].cost + 1;
                let left = cells[(i - 1) * width + j].cost + 1;
                let retained = last[j - 1] == next[i - 1];
                let diagonal = cells[(i - 1) * width + j - 1].cost + if retained { 1 } else { 2 };

                let mut best = Cell {
                    cost: up,
                    step: Step::Up,
                };
                if left < best.cost {
                    best = Cell {
                        cost: left,
                        step: Step::Left,
                    };
                }
                if diagonal < best.cost {
                    best = Cell {
                        cost: diagonal,
                        step: Step::Diagonal { retained },
                    };
                }
                cells.push(best);
            }
        }

        Self { last, next, cells }
    }

    fn width(&self) -> usize {
        self.last.len() + 1
    }

    /// Length of the script, i.e. the cost of the final cell.
    pub fn distance(&self) -> usize {
        self.cells[self.cells.len() - 1].cost
    }

    /// The edit script in forward order.
    pub fn script(&self) -> Vec<Edit<&'k K>> {
        let width = self.width();
        let mut i = self.next.len();
        let mut j = self.last.len();
        let mut reversed = Vec::with_capacity(self.distance());

        loop {
            match self.cells[i * width + j].step {
                Step::Origin => break,
                Step::Up => {
                    reversed.push(Edit::Delete(&self.last[j - 1]));
                    j -= 1;
                }
                Step::Left => {
                    reversed.push(Edit::Insert(&self.next[i - 1]));
                    i -= 1;
                }
                Step::Diagonal { retained: true } => {
                    reversed.push(Edit::Retain(&self.last[j - 1]));
                    i -= 1;
                    j -= 1;
                }
                Step::Diagonal { retained: false } => {
                    reversed.push(Edit::Insert(&self.next[i - 1]));
                    reversed.push(Edit::Delete(&self.last[j - 1]));
                    i -= 1;
                    j -= 1;
                }
            }
        }

        reversed.reverse();
        reversed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script<'a>(last: &'a [&'a str], next: &'a [&'a str]) -> Vec<Edit<&'a str>> {
        EditTable::build(last, next)
            .script()
            .into_iter()
            .map(|e| match e {
                Edit::Retain(k) => Edit::Retain(*k),
                Edit::Delete(k) => Edit::Delete(*k),
                Edit::Insert(k) => Edit::Insert(*k),
            })
            .collect()
    }

    #[test]
    fn empty_sequences() {
        assert!(script(&[], &[]).is_empty());
        assert_eq!(EditTable::<&str>::build(&[], &[]).distance(), 0);
    }

    #[test]
    fn all_inserts_and_all_deletes() {
        assert_eq!(
            script(&[], &["a", "b"]),
            vec![Edit::Insert("a"), Edit::Insert("b")]
        );
        assert_eq!(
            script(&["a", "b"], &[]),
            vec![Edit::Delete("a"), Edit::Delete("b")]
        );
    }

    #[test]
    fn identical_keys_are_retained() {
        assert_eq!(
            script(&["a", "b", "c"], &["a", "b", "c"]),
            vec![Edit::Retain("a"), Edit::Retain("b"), Edit::Retain("c")]
        );
    }

    #[test]
    fn swap_tie_break_is_insert_retain_delete() {
        // Up is taken unconditionally, Left and Diagonal only when strictly
        // cheaper, which fixes this exact script for a swap.
        let table = EditTable::build(&["a", "b"], &["b", "a"]);
        assert_eq!(table.distance(), 3);
        assert_eq!(
            script(&["a", "b"], &["b", "a"]),
            vec![Edit::Insert("b"), Edit::Retain("a"), Edit::Delete("b")]
        );
    }

    #[test]
    fn replacement_prefers_delete_before_insert() {
        assert_eq!(
            script(&["a"], &["b"]),
            vec![Edit::Insert("b"), Edit::Delete("a")]
        );
    }

    #[test]
    fn rotation_moves_one_key() {
        assert_eq!(
            script(&["a", "b", "c"], &["b", "c", "a"]),
            vec![
                Edit::Delete("a"),
                Edit::Retain("b"),
                Edit::Retain("c"),
                Edit::Insert("a"),
            ]
        );
    }

    #[test]
    fn distance_counts_every_token() {
        let table = EditTable::build(&["a", "x", "c"], &["a", "y", "c"]);
        // Two retains plus one delete and one insert.
        assert_eq!(table.distance(), 4);
        assert_eq!(table.script().len(), 4);
    }

    #[test]
    fn script_consumes_both_sequences_in_order() {
        let last = ["k1", "k2", "k3", "k4", "k5"];
        let next = ["k5", "k3", "k9", "k1"];
        let script = script(&last, &next);

        let consumed_last: Vec<&str> = script
            .iter()
            .filter(|e| !matches!(e, Edit::Insert(_)))
            .map(|e| *e.key())
            .collect();
        let consumed_next: Vec<&str> = script
            .iter()
            .filter(|e| !matches!(e, Edit::Delete(_)))
            .map(|e| *e.key())
            .collect();
        assert_eq!(consumed_last, last);
        assert_eq!(consumed_next, next);
    }
}
