//! The executor capability interface.
//!
//! An [`Executor`] owns the live structure a patch is applied to. Every call
//! takes the current cursor and returns the next one, so the executor decides
//! what a cursor is: a DOM node handle, an arena index, or `()`.

use std::convert::Infallible;

use serde_json::Value;
use tracing::trace;

use vdelta_types::{Address, ChangeLog, DecoderSpec, Instruction};

/// Target-specific applier of patch instructions.
pub trait Executor {
    type Cursor;
    type Error: std::error::Error + 'static;

    fn select_children(&mut self, cursor: Self::Cursor) -> Result<Self::Cursor, Self::Error>;
    fn select_sibling(&mut self, cursor: Self::Cursor, offset: i32) -> Result<Self::Cursor, Self::Error>;
    fn select_parent(&mut self, cursor: Self::Cursor) -> Result<Self::Cursor, Self::Error>;

    fn insert_text(&mut self, cursor: Self::Cursor, data: &str) -> Result<Self::Cursor, Self::Error>;
    fn insert_comment(&mut self, cursor: Self::Cursor, data: &str) -> Result<Self::Cursor, Self::Error>;
    fn insert_element(&mut self, cursor: Self::Cursor, local_name: &str) -> Result<Self::Cursor, Self::Error>;
    fn insert_element_ns(
        &mut self,
        cursor: Self::Cursor,
        namespace: &str,
        local_name: &str,
    ) -> Result<Self::Cursor, Self::Error>;
    fn insert_stashed_node(&mut self, cursor: Self::Cursor, address: Address) -> Result<Self::Cursor, Self::Error>;

    fn replace_with_text(&mut self, cursor: Self::Cursor, data: &str) -> Result<Self::Cursor, Self::Error>;
    fn replace_with_comment(&mut self, cursor: Self::Cursor, data: &str) -> Result<Self::Cursor, Self::Error>;
    fn replace_with_element(&mut self, cursor: Self::Cursor, local_name: &str) -> Result<Self::Cursor, Self::Error>;
    fn replace_with_element_ns(
        &mut self,
        cursor: Self::Cursor,
        namespace: &str,
        local_name: &str,
    ) -> Result<Self::Cursor, Self::Error>;
    fn replace_with_stashed_node(
        &mut self,
        cursor: Self::Cursor,
        address: Address,
    ) -> Result<Self::Cursor, Self::Error>;

    fn remove_next_sibling(&mut self, cursor: Self::Cursor) -> Result<Self::Cursor, Self::Error>;

    fn set_text_data(&mut self, cursor: Self::Cursor, data: &str) -> Result<Self::Cursor, Self::Error>;
    fn edit_text_data(
        &mut self,
        cursor: Self::Cursor,
        start: u32,
        end: u32,
        prefix: &str,
        suffix: &str,
    ) -> Result<Self::Cursor, Self::Error>;

    fn set_attribute(&mut self, cursor: Self::Cursor, name: &str, value: &str) -> Result<Self::Cursor, Self::Error>;
    fn set_attribute_ns(
        &mut self,
        cursor: Self::Cursor,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<Self::Cursor, Self::Error>;
    fn remove_attribute(&mut self, cursor: Self::Cursor, name: &str) -> Result<Self::Cursor, Self::Error>;
    fn remove_attribute_ns(
        &mut self,
        cursor: Self::Cursor,
        namespace: &str,
        name: &str,
    ) -> Result<Self::Cursor, Self::Error>;

    fn assign_property(&mut self, cursor: Self::Cursor, name: &str, value: &Value) -> Result<Self::Cursor, Self::Error>;
    fn delete_property(&mut self, cursor: Self::Cursor, name: &str) -> Result<Self::Cursor, Self::Error>;

    fn set_style_rule(&mut self, cursor: Self::Cursor, name: &str, value: &str) -> Result<Self::Cursor, Self::Error>;
    fn remove_style_rule(&mut self, cursor: Self::Cursor, name: &str) -> Result<Self::Cursor, Self::Error>;

    fn add_event_listener(
        &mut self,
        cursor: Self::Cursor,
        event_type: &str,
        decoder: &DecoderSpec,
        capture: bool,
    ) -> Result<Self::Cursor, Self::Error>;
    fn remove_event_listener(
        &mut self,
        cursor: Self::Cursor,
        event_type: &str,
        decoder: &DecoderSpec,
        capture: bool,
    ) -> Result<Self::Cursor, Self::Error>;

    fn stash_next_sibling(&mut self, cursor: Self::Cursor, address: Address) -> Result<Self::Cursor, Self::Error>;
    fn discard_stashed_node(&mut self, cursor: Self::Cursor, address: Address) -> Result<Self::Cursor, Self::Error>;
    fn shift_siblings(&mut self, cursor: Self::Cursor, count: u32) -> Result<Self::Cursor, Self::Error>;
}

/// Apply one owned instruction directly, without going through bytes.
pub fn apply_instruction<E: Executor>(
    instruction: &Instruction,
    exec: &mut E,
    cursor: E::Cursor,
) -> Result<E::Cursor, E::Error> {
    trace!(op = instruction.name(), "apply");
    match instruction {
        Instruction::SelectChildren => exec.select_children(cursor),
        Instruction::SelectSibling { offset } => exec.select_sibling(cursor, *offset),
        Instruction::SelectParent => exec.select_parent(cursor),
        Instruction::InsertText { data } => exec.insert_text(cursor, data),
        Instruction::InsertComment { data } => exec.insert_comment(cursor, data),
        Instruction::InsertElement { local_name } => exec.insert_element(cursor, local_name),
        Instruction::InsertElementNs {
            namespace,
            local_name,
        } => exec.insert_element_ns(cursor, namespace, local_name),
        Instruction::InsertStashedNode { address } => exec.insert_stashed_node(cursor, *address),
        Instruction::ReplaceWithText { data } => exec.replace_with_text(cursor, data),
        Instruction::ReplaceWithComment { data } => exec.replace_with_comment(cursor, data),
        Instruction::ReplaceWithElement { local_name } => exec.replace_with_element(cursor, local_name),
        Instruction::ReplaceWithElementNs {
            namespace,
            local_name,
        } => exec.replace_with_element_ns(cursor, namespace, local_name),
        Instruction::ReplaceWithStashedNode { address } => {
            exec.replace_with_stashed_node(cursor, *address)
        }
        Instruction::RemoveNextSibling => exec.remove_next_sibling(cursor),
        Instruction::SetAttribute { name, value } => exec.set_attribute(cursor, name, value),
        Instruction::SetAttributeNs {
            namespace,
            name,
            value,
        } => exec.set_attribute_ns(cursor, namespace, name, value),
        Instruction::RemoveAttribute { name } => exec.remove_attribute(cursor, name),
        Instruction::RemoveAttributeNs { namespace, name } => {
            exec.remove_attribute_ns(cursor, namespace, name)
        }
        Instruction::AssignProperty { name, value } => exec.assign_property(cursor, name, value),
        Instruction::DeleteProperty { name } => exec.delete_property(cursor, name),
        Instruction::SetStyleRule { name, value } => exec.set_style_rule(cursor, name, value),
        Instruction::RemoveStyleRule { name } => exec.remove_style_rule(cursor, name),
        Instruction::AddEventListener {
            event_type,
            decoder,
            capture,
        } => exec.add_event_listener(cursor, event_type, decoder, *capture),
        Instruction::RemoveEventListener {
            event_type,
            decoder,
            capture,
        } => exec.remove_event_listener(cursor, event_type, decoder, *capture),
        Instruction::SetTextData { data } => exec.set_text_data(cursor, data),
        Instruction::EditTextData {
            start,
            end,
            prefix,
            suffix,
        } => exec.edit_text_data(cursor, *start, *end, prefix, suffix),
        Instruction::StashNextSibling { address } => exec.stash_next_sibling(cursor, *address),
        Instruction::DiscardStashedNode { address } => exec.discard_stashed_node(cursor, *address),
        Instruction::ShiftSiblings { count } => exec.shift_siblings(cursor, *count),
    }
}

/// Apply a whole change log in order.
pub fn apply_log<E: Executor>(
    log: &ChangeLog,
    exec: &mut E,
    mut cursor: E::Cursor,
) -> Result<E::Cursor, E::Error> {
    for instruction in log {
        cursor = apply_instruction(instruction, exec, cursor)?;
    }
    Ok(cursor)
}

/// Accepts every call and does nothing. Used to validate a patch.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullExecutor;

/// Rebuilds owned instructions from executor calls.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    instructions: Vec<Instruction>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn into_change_log(self) -> ChangeLog {
        ChangeLog::from(self.instructions)
    }

    fn record(&mut self, instruction: Instruction) -> Result<(), Infallible> {
        self.instructions.push(instruction);
        Ok(())
    }
}

macro_rules! unit_executor {
    ($ty:ty, |$this:ident, $instr:ident| $body:expr) => {
        impl Executor for $ty {
            type Cursor = ();
            type Error = Infallible;

            fn select_children(&mut self, _: ()) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::SelectChildren);
                $body
            }
            fn select_sibling(&mut self, _: (), offset: i32) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::SelectSibling { offset });
                $body
            }
            fn select_parent(&mut self, _: ()) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::SelectParent);
                $body
            }
            fn insert_text(&mut self, _: (), data: &str) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::InsertText { data: data.into() });
                $body
            }
            fn insert_comment(&mut self, _: (), data: &str) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::InsertComment { data: data.into() });
                $body
            }
            fn insert_element(&mut self, _: (), local_name: &str) -> Result<(), Infallible> {
                let ($this, $instr) = (
                    self,
                    Instruction::InsertElement {
                        local_name: local_name.into(),
                    },
                );
                $body
            }
            fn insert_element_ns(
                &mut self,
                _: (),
                namespace: &str,
                local_name: &str,
            ) -> Result<(), Infallible> {
                let ($this, $instr) = (
                    self,
                    Instruction::InsertElementNs {
                        namespace: namespace.into(),
                        local_name: local_name.into(),
                    },
                );
                $body
            }
            fn insert_stashed_node(&mut self, _: (), address: Address) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::InsertStashedNode { address });
                $body
            }
            fn replace_with_text(&mut self, _: (), data: &str) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::ReplaceWithText { data: data.into() });
                $body
            }
            fn replace_with_comment(&mut self, _: (), data: &str) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::ReplaceWithComment { data: data.into() });
                $body
            }
            fn replace_with_element(&mut self, _: (), local_name: &str) -> Result<(), Infallible> {
                let ($this, $instr) = (
                    self,
                    Instruction::ReplaceWithElement {
                        local_name: local_name.into(),
                    },
                );
                $body
            }
            fn replace_with_element_ns(
                &mut self,
                _: (),
                namespace: &str,
                local_name: &str,
            ) -> Result<(), Infallible> {
                let ($this, $instr) = (
                    self,
                    Instruction::ReplaceWithElementNs {
                        namespace: namespace.into(),
                        local_name: local_name.into(),
                    },
                );
                $body
            }
            fn replace_with_stashed_node(&mut self, _: (), address: Address) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::ReplaceWithStashedNode { address });
                $body
            }
            fn remove_next_sibling(&mut self, _: ()) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::RemoveNextSibling);
                $body
            }
            fn set_text_data(&mut self, _: (), data: &str) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::SetTextData { data: data.into() });
                $body
            }
            fn edit_text_data(
                &mut self,
                _: (),
                start: u32,
                end: u32,
                prefix: &str,
                suffix: &str,
            ) -> Result<(), Infallible> {
                let ($this, $instr) = (
                    self,
                    Instruction::EditTextData {
                        start,
                        end,
                        prefix: prefix.into(),
                        suffix: suffix.into(),
                    },
                );
                $body
            }
            fn set_attribute(&mut self, _: (), name: &str, value: &str) -> Result<(), Infallible> {
                let ($this, $instr) = (
                    self,
                    Instruction::SetAttribute {
                        name: name.into(),
                        value: value.into(),
                    },
                );
                $body
            }
            fn set_attribute_ns(
                &mut self,
                _: (),
                namespace: &str,
                name: &str,
                value: &str,
            ) -> Result<(), Infallible> {
                let ($this, $instr) = (
                    self,
                    Instruction::SetAttributeNs {
                        namespace: namespace.into(),
                        name: name.into(),
                        value: value.into(),
                    },
                );
                $body
            }
            fn remove_attribute(&mut self, _: (), name: &str) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::RemoveAttribute { name: name.into() });
                $body
            }
            fn remove_attribute_ns(&mut self, _: (), namespace: &str, name: &str) -> Result<(), Infallible> {
                let ($this, $instr) = (
                    self,
                    Instruction::RemoveAttributeNs {
                        namespace: namespace.into(),
                        name: name.into(),
                    },
                );
                $body
            }
            fn assign_property(&mut self, _: (), name: &str, value: &Value) -> Result<(), Infallible> {
                let ($this, $instr) = (
                    self,
                    Instruction::AssignProperty {
                        name: name.into(),
                        value: value.clone(),
                    },
                );
                $body
            }
            fn delete_property(&mut self, _: (), name: &str) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::DeleteProperty { name: name.into() });
                $body
            }
            fn set_style_rule(&mut self, _: (), name: &str, value: &str) -> Result<(), Infallible> {
                let ($this, $instr) = (
                    self,
                    Instruction::SetStyleRule {
                        name: name.into(),
                        value: value.into(),
                    },
                );
                $body
            }
            fn remove_style_rule(&mut self, _: (), name: &str) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::RemoveStyleRule { name: name.into() });
                $body
            }
            fn add_event_listener(
                &mut self,
                _: (),
                event_type: &str,
                decoder: &DecoderSpec,
                capture: bool,
            ) -> Result<(), Infallible> {
                let ($this, $instr) = (
                    self,
                    Instruction::AddEventListener {
                        event_type: event_type.into(),
                        decoder: decoder.clone(),
                        capture,
                    },
                );
                $body
            }
            fn remove_event_listener(
                &mut self,
                _: (),
                event_type: &str,
                decoder: &DecoderSpec,
                capture: bool,
            ) -> Result<(), Infallible> {
                let ($this, $instr) = (
                    self,
                    Instruction::RemoveEventListener {
                        event_type: event_type.into(),
                        decoder: decoder.clone(),
                        capture,
                    },
                );
                $body
            }
            fn stash_next_sibling(&mut self, _: (), address: Address) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::StashNextSibling { address });
                $body
            }
            fn discard_stashed_node(&mut self, _: (), address: Address) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::DiscardStashedNode { address });
                $body
            }
            fn shift_siblings(&mut self, _: (), count: u32) -> Result<(), Infallible> {
                let ($this, $instr) = (self, Instruction::ShiftSiblings { count });
                $body
            }
        }
    };
}

unit_executor!(Recorder, |this, instruction| this.record(instruction));
unit_executor!(NullExecutor, |this, instruction| {
    let _ = (this, instruction);
    Ok(())
});

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_log() -> ChangeLog {
        ChangeLog::from(vec![
            Instruction::SelectSibling { offset: 1 },
            Instruction::SelectChildren,
            Instruction::InsertElementNs {
                namespace: "http://www.w3.org/2000/svg".into(),
                local_name: "circle".into(),
            },
            Instruction::AssignProperty {
                name: "r".into(),
                value: json!(4),
            },
            Instruction::AddEventListener {
                event_type: "click".into(),
                decoder: DecoderSpec::Value,
                capture: true,
            },
            Instruction::EditTextData {
                start: 1,
                end: 2,
                prefix: "<".into(),
                suffix: ">".into(),
            },
            Instruction::SelectParent,
        ])
    }

    #[test]
    fn recorder_rebuilds_applied_log() {
        let log = sample_log();
        let mut recorder = Recorder::new();
        apply_log(&log, &mut recorder, ()).unwrap();
        assert_eq!(recorder.instructions(), log.instructions());
        assert_eq!(recorder.into_change_log(), log);
    }

    #[test]
    fn null_executor_accepts_everything() {
        let mut null = NullExecutor;
        assert!(apply_log(&sample_log(), &mut null, ()).is_ok());
    }
}
