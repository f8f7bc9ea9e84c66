//! Record opcodes.
//!
//! Every record starts with one opcode byte. `0x00` is reserved for layout
//! items, so opcodes start at 1.

use vdelta_types::Instruction;

use crate::error::{PatchError, PatchResult};

/// Tag byte of a layout item.
pub const LAYOUT_TAG: u8 = 0x00;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    SelectChildren = 1,
    SelectSibling = 2,
    SelectParent = 3,
    InsertText = 4,
    InsertComment = 5,
    InsertElement = 6,
    InsertElementNs = 7,
    InsertStashedNode = 8,
    ReplaceWithText = 9,
    ReplaceWithComment = 10,
    ReplaceWithElement = 11,
    ReplaceWithElementNs = 12,
    ReplaceWithStashedNode = 13,
    RemoveNextSibling = 14,
    SetAttribute = 15,
    SetAttributeNs = 16,
    RemoveAttribute = 17,
    RemoveAttributeNs = 18,
    AssignProperty = 19,
    DeleteProperty = 20,
    SetStyleRule = 21,
    RemoveStyleRule = 22,
    AddEventListener = 23,
    RemoveEventListener = 24,
    SetTextData = 25,
    EditTextData = 26,
    StashNextSibling = 27,
    DiscardStashedNode = 28,
    ShiftSiblings = 29,
}

const ALL: [Opcode; 29] = [
    Opcode::SelectChildren,
    Opcode::SelectSibling,
    Opcode::SelectParent,
    Opcode::InsertText,
    Opcode::InsertComment,
    Opcode::InsertElement,
    Opcode::InsertElementNs,
    Opcode::InsertStashedNode,
    Opcode::ReplaceWithText,
    Opcode::ReplaceWithComment,
    Opcode::ReplaceWithElement,
    Opcode::ReplaceWithElementNs,
    Opcode::ReplaceWithStashedNode,
    Opcode::RemoveNextSibling,
    Opcode::SetAttribute,
    Opcode::SetAttributeNs,
    Opcode::RemoveAttribute,
    Opcode::RemoveAttributeNs,
    Opcode::AssignProperty,
    Opcode::DeleteProperty,
    Opcode::SetStyleRule,
    Opcode::RemoveStyleRule,
    Opcode::AddEventListener,
    Opcode::RemoveEventListener,
    Opcode::SetTextData,
    Opcode::EditTextData,
    Opcode::StashNextSibling,
    Opcode::DiscardStashedNode,
    Opcode::ShiftSiblings,
];

impl Opcode {
    /// Parse an opcode byte read at `offset`.
    pub fn from_byte(byte: u8, offset: usize) -> PatchResult<Self> {
        match byte {
            1..=29 => Ok(ALL[usize::from(byte) - 1]),
            _ => Err(PatchError::UnknownOpcode {
                opcode: byte,
                offset,
            }),
        }
    }

    pub fn byte(self) -> u8 {
        self as u8
    }

    pub fn of(instruction: &Instruction) -> Self {
        match instruction {
            Instruction::SelectChildren => Self::SelectChildren,
            Instruction::SelectSibling { .. } => Self::SelectSibling,
            Instruction::SelectParent => Self::SelectParent,
            Instruction::InsertText { .. } => Self::InsertText,
            Instruction::InsertComment { .. } => Self::InsertComment,
            Instruction::InsertElement { .. } => Self::InsertElement,
            Instruction::InsertElementNs { .. } => Self::InsertElementNs,
            Instruction::InsertStashedNode { .. } => Self::InsertStashedNode,
            Instruction::ReplaceWithText { .. } => Self::ReplaceWithText,
            Instruction::ReplaceWithComment { .. } => Self::ReplaceWithComment,
            Instruction::ReplaceWithElement { .. } => Self::ReplaceWithElement,
            Instruction::ReplaceWithElementNs { .. } => Self::ReplaceWithElementNs,
            Instruction::ReplaceWithStashedNode { .. } => Self::ReplaceWithStashedNode,
            Instruction::RemoveNextSibling => Self::RemoveNextSibling,
            Instruction::SetAttribute { .. } => Self::SetAttribute,
            Instruction::SetAttributeNs { .. } => Self::SetAttributeNs,
            Instruction::RemoveAttribute { .. } => Self::RemoveAttribute,
            Instruction::RemoveAttributeNs { .. } => Self::RemoveAttributeNs,
            Instruction::AssignProperty { .. } => Self::AssignProperty,
            Instruction::DeleteProperty { .. } => Self::DeleteProperty,
            Instruction::SetStyleRule { .. } => Self::SetStyleRule,
            Instruction::RemoveStyleRule { .. } => Self::RemoveStyleRule,
            Instruction::AddEventListener { .. } => Self::AddEventListener,
            Instruction::RemoveEventListener { .. } => Self::RemoveEventListener,
            Instruction::SetTextData { .. } => Self::SetTextData,
            Instruction::EditTextData { .. } => Self::EditTextData,
            Instruction::StashNextSibling { .. } => Self::StashNextSibling,
            Instruction::DiscardStashedNode { .. } => Self::DiscardStashedNode,
            Instruction::ShiftSiblings { .. } => Self::ShiftSiblings,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SelectChildren => "SelectChildren",
            Self::SelectSibling => "SelectSibling",
            Self::SelectParent => "SelectParent",
            Self::InsertText => "InsertText",
            Self::InsertComment => "InsertComment",
            Self::InsertElement => "InsertElement",
            Self::InsertElementNs => "InsertElementNs",
            Self::InsertStashedNode => "InsertStashedNode",
            Self::ReplaceWithText => "ReplaceWithText",
            Self::ReplaceWithComment => "ReplaceWithComment",
            Self::ReplaceWithElement => "ReplaceWithElement",
            Self::ReplaceWithElementNs => "ReplaceWithElementNs",
            Self::ReplaceWithStashedNode => "ReplaceWithStashedNode",
            Self::RemoveNextSibling => "RemoveNextSibling",
            Self::SetAttribute => "SetAttribute",
            Self::SetAttributeNs => "SetAttributeNs",
            Self::RemoveAttribute => "RemoveAttribute",
            Self::RemoveAttributeNs => "RemoveAttributeNs",
            Self::AssignProperty => "AssignProperty",
            Self::DeleteProperty => "DeleteProperty",
            Self::SetStyleRule => "SetStyleRule",
            Self::RemoveStyleRule => "RemoveStyleRule",
            Self::AddEventListener => "AddEventListener",
            Self::RemoveEventListener => "RemoveEventListener",
            Self::SetTextData => "SetTextData",
            Self::EditTextData => "EditTextData",
            Self::StashNextSibling => "StashNextSibling",
            Self::DiscardStashedNode => "DiscardStashedNode",
            Self::ShiftSiblings => "ShiftSiblings",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_dense_and_stable() {
        for (index, opcode) in ALL.iter().enumerate() {
            assert_eq!(opcode.byte() as usize, index + 1);
            assert_eq!(Opcode::from_byte(opcode.byte(), 0).unwrap(), *opcode);
        }
    }

    #[test]
    fn names_match_instruction_names() {
        let instr = Instruction::EditTextData {
            start: 0,
            end: 0,
            prefix: String::new(),
            suffix: String::new(),
        };
        assert_eq!(Opcode::of(&instr).name(), instr.name());
        assert_eq!(Opcode::of(&Instruction::SelectParent).name(), "SelectParent");
    }

    #[test]
    fn layout_tag_and_out_of_range_bytes_are_not_opcodes() {
        for byte in [LAYOUT_TAG, 30, 0x7F, 0xFF] {
            let err = Opcode::from_byte(byte, 12).unwrap_err();
            assert_eq!(err, PatchError::UnknownOpcode { opcode: byte, offset: 12 });
        }
    }
}
