use serde::{Deserialize, Serialize};

use crate::instruction::Instruction;

/// The ordered instruction stream produced by one diff pass.
///
/// Built once by the differ and read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeLog {
    instructions: Vec<Instruction>,
}

impl ChangeLog {
    /// An empty change log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the two trees were equivalent.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    /// Number of instructions that are not pure cursor moves.
    pub fn mutations(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| !i.is_navigation())
            .count()
    }
}

impl From<Vec<Instruction>> for ChangeLog {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}

impl IntoIterator for ChangeLog {
    type Item = Instruction;
    type IntoIter = std::vec::IntoIter<Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeLog {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log() {
        let log = ChangeLog::new();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert_eq!(log.mutations(), 0);
    }

    #[test]
    fn mutations_skip_navigation() {
        let log = ChangeLog::from(vec![
            Instruction::SelectChildren,
            Instruction::SelectSibling { offset: 1 },
            Instruction::SetTextData { data: "x".into() },
            Instruction::SelectParent,
        ]);
        assert_eq!(log.len(), 4);
        assert_eq!(log.mutations(), 1);
        assert_eq!(log.iter().count(), 4);
    }
}
