//! Patch instructions.
//!
//! Instructions are replayed strictly in order against a cursor. The cursor
//! sits on a *current node* inside a *current parent*; right after
//! `SelectChildren` it sits before the first child.
//!
//! - `Insert*` places a node right after the current node and moves onto it.
//! - `ReplaceWith*` swaps the current node in place.
//! - `RemoveNextSibling` and `StashNextSibling` detach the node after the
//!   current one; the cursor stays put.
//! - `ShiftSiblings(count)` moves the node `count` places further along so
//!   it becomes the next sibling; the cursor stays put.
//! - Settings and text instructions act on the current node.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::Address;
use crate::decoder::DecoderSpec;

/// One step of a patch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    // Navigation
    SelectChildren,
    SelectSibling { offset: i32 },
    SelectParent,

    // Structure
    InsertText { data: String },
    InsertComment { data: String },
    InsertElement { local_name: String },
    InsertElementNs { namespace: String, local_name: String },
    InsertStashedNode { address: Address },
    ReplaceWithText { data: String },
    ReplaceWithComment { data: String },
    ReplaceWithElement { local_name: String },
    ReplaceWithElementNs { namespace: String, local_name: String },
    ReplaceWithStashedNode { address: Address },
    RemoveNextSibling,

    // Settings
    SetAttribute { name: String, value: String },
    SetAttributeNs { namespace: String, name: String, value: String },
    RemoveAttribute { name: String },
    RemoveAttributeNs { namespace: String, name: String },
    AssignProperty { name: String, value: Value },
    DeleteProperty { name: String },
    SetStyleRule { name: String, value: String },
    RemoveStyleRule { name: String },
    AddEventListener { event_type: String, decoder: DecoderSpec, capture: bool },
    RemoveEventListener { event_type: String, decoder: DecoderSpec, capture: bool },

    // Text
    SetTextData { data: String },
    /// New data is `prefix + data[start .. len - end] + suffix`, counted in chars.
    EditTextData { start: u32, end: u32, prefix: String, suffix: String },

    // Reordering
    StashNextSibling { address: Address },
    DiscardStashedNode { address: Address },
    ShiftSiblings { count: u32 },
}

impl Instruction {
    /// Stable instruction name, used in logs and decode errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectChildren => "SelectChildren",
            Self::SelectSibling { .. } => "SelectSibling",
            Self::SelectParent => "SelectParent",
            Self::InsertText { .. } => "InsertText",
            Self::InsertComment { .. } => "InsertComment",
            Self::InsertElement { .. } => "InsertElement",
            Self::InsertElementNs { .. } => "InsertElementNs",
            Self::InsertStashedNode { .. } => "InsertStashedNode",
            Self::ReplaceWithText { .. } => "ReplaceWithText",
            Self::ReplaceWithComment { .. } => "ReplaceWithComment",
            Self::ReplaceWithElement { .. } => "ReplaceWithElement",
            Self::ReplaceWithElementNs { .. } => "ReplaceWithElementNs",
            Self::ReplaceWithStashedNode { .. } => "ReplaceWithStashedNode",
            Self::RemoveNextSibling => "RemoveNextSibling",
            Self::SetAttribute { .. } => "SetAttribute",
            Self::SetAttributeNs { .. } => "SetAttributeNs",
            Self::RemoveAttribute { .. } => "RemoveAttribute",
            Self::RemoveAttributeNs { .. } => "RemoveAttributeNs",
            Self::AssignProperty { .. } => "AssignProperty",
            Self::DeleteProperty { .. } => "DeleteProperty",
            Self::SetStyleRule { .. } => "SetStyleRule",
            Self::RemoveStyleRule { .. } => "RemoveStyleRule",
            Self::AddEventListener { .. } => "AddEventListener",
            Self::RemoveEventListener { .. } => "RemoveEventListener",
            Self::SetTextData { .. } => "SetTextData",
            Self::EditTextData { .. } => "EditTextData",
            Self::StashNextSibling { .. } => "StashNextSibling",
            Self::DiscardStashedNode { .. } => "DiscardStashedNode",
            Self::ShiftSiblings { .. } => "ShiftSiblings",
        }
    }

    /// Whether this instruction only moves the cursor.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::SelectChildren | Self::SelectSibling { .. } | Self::SelectParent
        )
    }

    /// Whether this instruction moves nodes around without creating or
    /// destroying them.
    pub fn is_reorder(&self) -> bool {
        matches!(
            self,
            Self::StashNextSibling { .. }
                | Self::InsertStashedNode { .. }
                | Self::ReplaceWithStashedNode { .. }
                | Self::DiscardStashedNode { .. }
                | Self::ShiftSiblings { .. }
        )
    }
}
