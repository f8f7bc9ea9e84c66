//! Patch encoder.
//!
//! # Format
//!
//! A patch is a header-less sequence of items. Each item starts with a tag
//! byte:
//!
//! ```text
//! layout:  0x00 | field_count: u8 | field_count x u16 LE body offset (0xFFFF = absent)
//! record:  opcode: u8 (1..=29) | layout: u32 LE | body_len: u32 LE | body
//! ```
//!
//! `layout` is the absolute position of a layout item written earlier in
//! the same patch. Records with the same field shape share one layout item.
//!
//! The body starts with one 4-byte little-endian slot per present field.
//! Integers, booleans and addresses live in the slot itself. Strings, JSON
//! values and listener decoders live in the tail of the body; their slot
//! holds the body-relative offset of a `u32` length followed by the bytes.

use std::collections::HashMap;

use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Value;
use tracing::debug;

use vdelta_types::{Address, ChangeLog, DecoderSpec, Instruction};

use crate::decoder_codec::encode_decoder;
use crate::opcode::{Opcode, LAYOUT_TAG};
use crate::reader::PatchReader;

/// Layout offset marking an absent field.
pub const ABSENT: u16 = 0xFFFF;

/// Width of one fixed body slot.
pub const SLOT: usize = 4;

/// A finished, immutable patch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patch {
    bytes: Bytes,
    records: usize,
}

impl Patch {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of instruction records.
    pub fn records(&self) -> usize {
        self.records
    }

    pub fn reader(&self) -> PatchReader<'_> {
        PatchReader::new(&self.bytes)
    }
}

/// Encode a whole change log.
pub fn encode(log: &ChangeLog) -> Patch {
    let mut encoder = PatchEncoder::new();
    encoder.extend(log);
    encoder.finish()
}

/// Write-once patch builder. [`finish`](Self::finish) consumes it.
#[derive(Debug, Default)]
pub struct PatchEncoder {
    buf: BytesMut,
    layouts: HashMap<Vec<u16>, u32>,
    records: usize,
}

impl PatchEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written so far.
    pub fn records(&self) -> usize {
        self.records
    }

    pub fn extend<'a, I>(&mut self, instructions: I)
    where
        I: IntoIterator<Item = &'a Instruction>,
    {
        for instruction in instructions {
            self.push(instruction);
        }
    }

    pub fn push(&mut self, instruction: &Instruction) {
        let mut fields = Fields::default();
        match instruction {
            Instruction::SelectChildren
            | Instruction::SelectParent
            | Instruction::RemoveNextSibling => {}
            Instruction::SelectSibling { offset } => fields.i32(*offset),
            Instruction::InsertText { data }
            | Instruction::InsertComment { data }
            | Instruction::ReplaceWithText { data }
            | Instruction::ReplaceWithComment { data }
            | Instruction::SetTextData { data } => fields.str(data),
            Instruction::InsertElement { local_name }
            | Instruction::ReplaceWithElement { local_name } => fields.str(local_name),
            Instruction::InsertElementNs {
                namespace,
                local_name,
            }
            | Instruction::ReplaceWithElementNs {
                namespace,
                local_name,
            } => {
                fields.str(namespace);
                fields.str(local_name);
            }
            Instruction::InsertStashedNode { address }
            | Instruction::ReplaceWithStashedNode { address }
            | Instruction::StashNextSibling { address }
            | Instruction::DiscardStashedNode { address } => fields.address(*address),
            Instruction::SetAttribute { name, value } | Instruction::SetStyleRule { name, value } => {
                fields.str(name);
                fields.str(value);
            }
            Instruction::SetAttributeNs {
                namespace,
                name,
                value,
            } => {
                fields.str(namespace);
                fields.str(name);
                fields.str(value);
            }
            Instruction::RemoveAttribute { name }
            | Instruction::DeleteProperty { name }
            | Instruction::RemoveStyleRule { name } => fields.str(name),
            Instruction::RemoveAttributeNs { namespace, name } => {
                fields.str(namespace);
                fields.str(name);
            }
            Instruction::AssignProperty { name, value } => {
                fields.str(name);
                fields.json(value);
            }
            Instruction::AddEventListener {
                event_type,
                decoder,
                capture,
            }
            | Instruction::RemoveEventListener {
                event_type,
                decoder,
                capture,
            } => {
                fields.str(event_type);
                fields.decoder(decoder);
                fields.bool(*capture);
            }
            Instruction::EditTextData {
                start,
                end,
                prefix,
                suffix,
            } => {
                fields.u32(*start);
                fields.u32(*end);
                fields.opt_str(prefix);
                fields.opt_str(suffix);
            }
            Instruction::ShiftSiblings { count } => fields.u32(*count),
        }
        self.write_record(Opcode::of(instruction), fields);
    }

    /// Seal the buffer.
    pub fn finish(self) -> Patch {
        debug!(
            records = self.records,
            layouts = self.layouts.len(),
            bytes = self.buf.len(),
            "patch finished"
        );
        Patch {
            bytes: self.buf.freeze(),
            records: self.records,
        }
    }

    fn write_record(&mut self, opcode: Opcode, fields: Fields) {
        let mut layout = Vec::with_capacity(fields.slots.len());
        let mut present = 0usize;
        for slot in &fields.slots {
            match slot {
                Some(_) => {
                    layout.push((present * SLOT) as u16);
                    present += 1;
                }
                None => layout.push(ABSENT),
            }
        }
        let layout_at = self.layout(layout);

        let fixed = present * SLOT;
        let mut head = BytesMut::with_capacity(fixed);
        let mut tail = BytesMut::new();
        for slot in fields.slots.into_iter().flatten() {
            match slot {
                Slot::Inline(raw) => head.put_u32_le(raw),
                Slot::Data(data) => {
                    head.put_u32_le((fixed + tail.len()) as u32);
                    tail.put_u32_le(data.len() as u32);
                    tail.put_slice(&data);
                }
            }
        }

        self.buf.put_u8(opcode.byte());
        self.buf.put_u32_le(layout_at);
        self.buf.put_u32_le((head.len() + tail.len()) as u32);
        self.buf.put_slice(&head);
        self.buf.put_slice(&tail);
        self.records += 1;
    }

    /// Position of the layout item for `layout`, writing it on first use.
    fn layout(&mut self, layout: Vec<u16>) -> u32 {
        if let Some(&at) = self.layouts.get(&layout) {
            return at;
        }
        let at = self.buf.len() as u32;
        self.buf.put_u8(LAYOUT_TAG);
        self.buf.put_u8(layout.len() as u8);
        for offset in &layout {
            self.buf.put_u16_le(*offset);
        }
        self.layouts.insert(layout, at);
        at
    }
}

enum Slot {
    Inline(u32),
    Data(Vec<u8>),
}

#[derive(Default)]
struct Fields {
    slots: Vec<Option<Slot>>,
}

impl Fields {
    fn u32(&mut self, value: u32) {
        self.slots.push(Some(Slot::Inline(value)));
    }

    fn i32(&mut self, value: i32) {
        self.u32(value as u32);
    }

    fn bool(&mut self, value: bool) {
        self.u32(u32::from(value));
    }

    fn address(&mut self, address: Address) {
        self.u32(address.get());
    }

    fn str(&mut self, value: &str) {
        self.slots.push(Some(Slot::Data(value.as_bytes().to_vec())));
    }

    /// Empty strings are left out of the record.
    fn opt_str(&mut self, value: &str) {
        if value.is_empty() {
            self.slots.push(None);
        } else {
            self.str(value);
        }
    }

    fn json(&mut self, value: &Value) {
        self.str(&value.to_string());
    }

    fn decoder(&mut self, decoder: &DecoderSpec) {
        let mut data = Vec::new();
        encode_decoder(decoder, &mut data);
        self.slots.push(Some(Slot::Data(data)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_is_empty_patch() {
        let patch = encode(&ChangeLog::new());
        assert!(patch.is_empty());
        assert_eq!(patch.records(), 0);
    }

    #[test]
    fn fieldless_record_layout() {
        let patch = encode(&ChangeLog::from(vec![Instruction::SelectChildren]));
        assert_eq!(
            patch.as_bytes(),
            &[
                LAYOUT_TAG, 0, // layout at 0, no fields
                1, 0, 0, 0, 0, 0, 0, 0, 0, // SelectChildren, layout 0, empty body
            ]
        );
    }

    #[test]
    fn string_field_goes_to_the_tail() {
        let patch = encode(&ChangeLog::from(vec![Instruction::InsertText {
            data: "hi".into(),
        }]));
        assert_eq!(
            patch.as_bytes(),
            &[
                LAYOUT_TAG, 1, 0, 0, // one field at body offset 0
                4, 0, 0, 0, 0, 10, 0, 0, 0, // InsertText, layout 0, body of 10
                4, 0, 0, 0, // slot: tail data at body offset 4
                2, 0, 0, 0, b'h', b'i',
            ]
        );
    }

    #[test]
    fn same_shapes_share_one_layout() {
        let log = ChangeLog::from(vec![
            Instruction::InsertText { data: "a".into() },
            Instruction::SetTextData { data: "b".into() },
            Instruction::DeleteProperty { name: "c".into() },
            Instruction::ShiftSiblings { count: 2 },
        ]);
        let patch = encode(&log);
        // One layout item (4 bytes), three 18-byte string records and one
        // 13-byte inline record.
        assert_eq!(&patch.as_bytes()[..4], &[LAYOUT_TAG, 1, 0, 0]);
        assert_eq!(patch.len(), 4 + 3 * 18 + 13);
        assert_eq!(patch.records(), 4);
    }

    #[test]
    fn empty_edit_affixes_are_absent() {
        let mut encoder = PatchEncoder::new();
        encoder.push(&Instruction::EditTextData {
            start: 3,
            end: 1,
            prefix: String::new(),
            suffix: "!".into(),
        });
        assert_eq!(encoder.records(), 1);
        let bytes = encoder.finish().into_bytes();
        assert_eq!(&bytes[..10], &[LAYOUT_TAG, 4, 0, 0, 4, 0, 0xFF, 0xFF, 8, 0]);
    }
}
