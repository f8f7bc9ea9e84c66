//! Lazy patch reader.
//!
//! [`PatchReader`] walks the item stream of a finished patch. Records are
//! handed out as [`RecordView`]s that read each field straight from the
//! buffer when asked; nothing is deserialized up front.

use std::collections::HashSet;
use std::convert::Infallible;

use serde_json::Value;
use tracing::{debug, trace};

use vdelta_types::{Address, ChangeLog, DecoderSpec};

use crate::decoder_codec::decode_decoder;
use crate::encoder::{ABSENT, SLOT};
use crate::error::{ApplyError, PatchError, PatchResult};
use crate::executor::{Executor, NullExecutor, Recorder};
use crate::opcode::{Opcode, LAYOUT_TAG};

/// Read-only view over patch bytes.
#[derive(Clone, Copy, Debug)]
pub struct PatchReader<'a> {
    data: &'a [u8],
}

impl<'a> PatchReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Iterate the records in order. Stops after the first error.
    pub fn records(&self) -> Records<'a> {
        Records {
            data: self.data,
            pos: 0,
            layouts: HashSet::new(),
            failed: false,
        }
    }

    /// Decode every record without applying anything. Returns the record count.
    pub fn validate(&self) -> PatchResult<usize> {
        let mut null = NullExecutor;
        let mut count = 0;
        for record in self.records() {
            let record = record?;
            dispatch(&record, &mut null, ()).map_err(into_patch_error)?;
            count += 1;
        }
        Ok(count)
    }

    /// Apply the patch to `exec`.
    ///
    /// The whole patch is validated first, so a malformed patch is reported
    /// before the executor sees a single call.
    pub fn apply<E: Executor>(
        &self,
        exec: &mut E,
        mut cursor: E::Cursor,
    ) -> Result<E::Cursor, ApplyError<E::Error>> {
        let count = self.validate()?;
        for record in self.records() {
            let record = record?;
            trace!(op = record.opcode().name(), offset = record.offset(), "apply record");
            cursor = dispatch(&record, exec, cursor)?;
        }
        debug!(records = count, bytes = self.data.len(), "patch applied");
        Ok(cursor)
    }

    /// Rebuild the owned change log.
    pub fn decode(&self) -> PatchResult<ChangeLog> {
        let mut recorder = Recorder::new();
        self.apply(&mut recorder, ()).map_err(into_patch_error)?;
        Ok(recorder.into_change_log())
    }
}

/// Decode a patch into an owned change log.
pub fn decode(data: &[u8]) -> PatchResult<ChangeLog> {
    PatchReader::new(data).decode()
}

fn into_patch_error(err: ApplyError<Infallible>) -> PatchError {
    match err {
        ApplyError::Decode(err) => err,
        ApplyError::Executor(never) => match never {},
    }
}

/// Iterator over the records of a patch.
pub struct Records<'a> {
    data: &'a [u8],
    pos: usize,
    layouts: HashSet<usize>,
    failed: bool,
}

impl<'a> Records<'a> {
    fn slice(&self, at: usize, len: usize) -> PatchResult<&'a [u8]> {
        at.checked_add(len)
            .and_then(|end| self.data.get(at..end))
            .ok_or(PatchError::Truncated {
                offset: self.data.len(),
            })
    }

    fn u32_at(&self, at: usize) -> PatchResult<u32> {
        let raw = self.slice(at, 4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    /// Layout table (without the tag and count bytes) of the item at `at`.
    fn layout_at(&self, at: usize) -> PatchResult<&'a [u8]> {
        let count = self.slice(at + 1, 1)?[0] as usize;
        self.slice(at + 2, count * 2)
    }

    fn read_next(&mut self) -> PatchResult<Option<RecordView<'a>>> {
        while self.pos < self.data.len() {
            let at = self.pos;
            let tag = self.data[at];
            if tag == LAYOUT_TAG {
                let table = self.layout_at(at)?;
                self.layouts.insert(at);
                self.pos = at + 2 + table.len();
                continue;
            }

            let opcode = Opcode::from_byte(tag, at)?;
            let layout_ref = self.u32_at(at + 1)? as usize;
            let body_len = self.u32_at(at + 5)? as usize;
            if !self.layouts.contains(&layout_ref) {
                return Err(PatchError::InvalidLayout { offset: at });
            }
            let layout = self.layout_at(layout_ref)?;
            let body = self.slice(at + 9, body_len)?;
            self.pos = at + 9 + body_len;
            return Ok(Some(RecordView {
                opcode,
                offset: at,
                layout,
                body,
            }));
        }
        Ok(None)
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = PatchResult<RecordView<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_next() {
            Ok(record) => record.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// One record, read lazily.
#[derive(Clone, Copy, Debug)]
pub struct RecordView<'a> {
    opcode: Opcode,
    offset: usize,
    layout: &'a [u8],
    body: &'a [u8],
}

impl<'a> RecordView<'a> {
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Absolute offset of the record in the patch.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn body_offset(&self) -> usize {
        self.offset + 9
    }

    fn truncated(&self) -> PatchError {
        PatchError::Truncated {
            offset: self.body_offset() + self.body.len(),
        }
    }

    fn missing(&self, field: &'static str) -> PatchError {
        PatchError::MissingField {
            record: self.opcode.name(),
            field,
        }
    }

    fn body_u32(&self, at: usize) -> PatchResult<u32> {
        let raw = at
            .checked_add(SLOT)
            .and_then(|end| self.body.get(at..end))
            .ok_or_else(|| self.truncated())?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    /// Raw slot of field `index`, or `None` when the field is absent.
    fn slot(&self, index: usize) -> PatchResult<Option<u32>> {
        let Some(entry) = self.layout.get(index * 2..index * 2 + 2) else {
            return Ok(None);
        };
        match u16::from_le_bytes([entry[0], entry[1]]) {
            ABSENT => Ok(None),
            at => self.body_u32(usize::from(at)).map(Some),
        }
    }

    fn required(&self, index: usize, field: &'static str) -> PatchResult<u32> {
        self.slot(index)?.ok_or_else(|| self.missing(field))
    }

    pub fn u32(&self, index: usize, field: &'static str) -> PatchResult<u32> {
        self.required(index, field)
    }

    pub fn i32(&self, index: usize, field: &'static str) -> PatchResult<i32> {
        self.required(index, field).map(|raw| raw as i32)
    }

    pub fn bool(&self, index: usize, field: &'static str) -> PatchResult<bool> {
        self.required(index, field).map(|raw| raw != 0)
    }

    pub fn address(&self, index: usize, field: &'static str) -> PatchResult<Address> {
        self.required(index, field).map(Address::new)
    }

    /// Tail data of field `index` and its absolute offset.
    fn data(&self, index: usize) -> PatchResult<Option<(&'a [u8], usize)>> {
        let Some(at) = self.slot(index)? else {
            return Ok(None);
        };
        let at = at as usize;
        let len = self.body_u32(at)? as usize;
        let start = at + SLOT;
        let bytes = start
            .checked_add(len)
            .and_then(|end| self.body.get(start..end))
            .ok_or_else(|| self.truncated())?;
        Ok(Some((bytes, self.body_offset() + start)))
    }

    fn utf8(&self, bytes: &'a [u8], field: &'static str) -> PatchResult<&'a str> {
        std::str::from_utf8(bytes).map_err(|_| PatchError::InvalidUtf8 {
            record: self.opcode.name(),
            field,
        })
    }

    pub fn str(&self, index: usize, field: &'static str) -> PatchResult<&'a str> {
        let (bytes, _) = self.data(index)?.ok_or_else(|| self.missing(field))?;
        self.utf8(bytes, field)
    }

    /// Optional string: absent reads as empty.
    pub fn opt_str(&self, index: usize, field: &'static str) -> PatchResult<&'a str> {
        match self.data(index)? {
            Some((bytes, _)) => self.utf8(bytes, field),
            None => Ok(""),
        }
    }

    pub fn json(&self, index: usize, field: &'static str) -> PatchResult<Value> {
        let (bytes, _) = self.data(index)?.ok_or_else(|| self.missing(field))?;
        serde_json::from_slice(bytes).map_err(|e| PatchError::InvalidJson {
            record: self.opcode.name(),
            field,
            reason: e.to_string(),
        })
    }

    pub fn decoder(&self, index: usize, field: &'static str) -> PatchResult<DecoderSpec> {
        let (bytes, at) = self.data(index)?.ok_or_else(|| self.missing(field))?;
        decode_decoder(bytes, at, self.opcode.name())
    }
}

/// Read the fields of `record` and make the matching executor call.
pub(crate) fn dispatch<E: Executor>(
    record: &RecordView<'_>,
    exec: &mut E,
    c: E::Cursor,
) -> Result<E::Cursor, ApplyError<E::Error>> {
    let r = record;
    let result = match r.opcode() {
        Opcode::SelectChildren => exec.select_children(c),
        Opcode::SelectSibling => exec.select_sibling(c, r.i32(0, "offset")?),
        Opcode::SelectParent => exec.select_parent(c),
        Opcode::InsertText => exec.insert_text(c, r.str(0, "data")?),
        Opcode::InsertComment => exec.insert_comment(c, r.str(0, "data")?),
        Opcode::InsertElement => exec.insert_element(c, r.str(0, "local_name")?),
        Opcode::InsertElementNs => {
            exec.insert_element_ns(c, r.str(0, "namespace")?, r.str(1, "local_name")?)
        }
        Opcode::InsertStashedNode => exec.insert_stashed_node(c, r.address(0, "address")?),
        Opcode::ReplaceWithText => exec.replace_with_text(c, r.str(0, "data")?),
        Opcode::ReplaceWithComment => exec.replace_with_comment(c, r.str(0, "data")?),
        Opcode::ReplaceWithElement => exec.replace_with_element(c, r.str(0, "local_name")?),
        Opcode::ReplaceWithElementNs => {
            exec.replace_with_element_ns(c, r.str(0, "namespace")?, r.str(1, "local_name")?)
        }
        Opcode::ReplaceWithStashedNode => {
            exec.replace_with_stashed_node(c, r.address(0, "address")?)
        }
        Opcode::RemoveNextSibling => exec.remove_next_sibling(c),
        Opcode::SetAttribute => exec.set_attribute(c, r.str(0, "name")?, r.str(1, "value")?),
        Opcode::SetAttributeNs => exec.set_attribute_ns(
            c,
            r.str(0, "namespace")?,
            r.str(1, "name")?,
            r.str(2, "value")?,
        ),
        Opcode::RemoveAttribute => exec.remove_attribute(c, r.str(0, "name")?),
        Opcode::RemoveAttributeNs => {
            exec.remove_attribute_ns(c, r.str(0, "namespace")?, r.str(1, "name")?)
        }
        Opcode::AssignProperty => exec.assign_property(c, r.str(0, "name")?, &r.json(1, "value")?),
        Opcode::DeleteProperty => exec.delete_property(c, r.str(0, "name")?),
        Opcode::SetStyleRule => exec.set_style_rule(c, r.str(0, "name")?, r.str(1, "value")?),
        Opcode::RemoveStyleRule => exec.remove_style_rule(c, r.str(0, "name")?),
        Opcode::AddEventListener => exec.add_event_listener(
            c,
            r.str(0, "event_type")?,
            &r.decoder(1, "decoder")?,
            r.bool(2, "capture")?,
        ),
        Opcode::RemoveEventListener => exec.remove_event_listener(
            c,
            r.str(0, "event_type")?,
            &r.decoder(1, "decoder")?,
            r.bool(2, "capture")?,
        ),
        Opcode::SetTextData => exec.set_text_data(c, r.str(0, "data")?),
        Opcode::EditTextData => exec.edit_text_data(
            c,
            r.u32(0, "start")?,
            r.u32(1, "end")?,
            r.opt_str(2, "prefix")?,
            r.opt_str(3, "suffix")?,
        ),
        Opcode::StashNextSibling => exec.stash_next_sibling(c, r.address(0, "address")?),
        Opcode::DiscardStashedNode => exec.discard_stashed_node(c, r.address(0, "address")?),
        Opcode::ShiftSiblings => exec.shift_siblings(c, r.u32(0, "count")?),
    };
    result.map_err(ApplyError::Executor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use vdelta_types::Instruction;

    #[test]
    fn records_expose_fields_lazily() {
        let patch = encode(&ChangeLog::from(vec![
            Instruction::SelectSibling { offset: -3 },
            Instruction::SetAttribute {
                name: "id".into(),
                value: "main".into(),
            },
        ]));
        let reader = patch.reader();
        let records: Vec<RecordView<'_>> = reader.records().collect::<PatchResult<_>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].opcode(), Opcode::SelectSibling);
        assert_eq!(records[0].i32(0, "offset").unwrap(), -3);
        assert_eq!(records[1].str(1, "value").unwrap(), "main");
        assert_eq!(records[1].str(0, "name").unwrap(), "id");
    }

    #[test]
    fn empty_input_has_no_records() {
        assert_eq!(PatchReader::new(&[]).validate().unwrap(), 0);
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn unknown_opcode_is_reported_with_its_offset() {
        let mut bytes = encode(&ChangeLog::from(vec![Instruction::SelectParent]))
            .as_bytes()
            .to_vec();
        let at = bytes.len();
        bytes.push(0xEE);
        assert_eq!(
            decode(&bytes).unwrap_err(),
            PatchError::UnknownOpcode {
                opcode: 0xEE,
                offset: at
            }
        );
    }

    #[test]
    fn missing_required_field_names_record_and_field() {
        // SetTextData pointing at a layout with its only field absent.
        let bytes = [LAYOUT_TAG, 1, 0xFF, 0xFF, 25, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            decode(&bytes).unwrap_err(),
            PatchError::MissingField {
                record: "SetTextData",
                field: "data"
            }
        );
    }

    #[test]
    fn record_must_reference_a_preceding_layout() {
        let bytes = [3, 7, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            decode(&bytes).unwrap_err(),
            PatchError::InvalidLayout { offset: 0 }
        );
    }

    #[test]
    fn cut_patch_is_truncated() {
        let patch = encode(&ChangeLog::from(vec![Instruction::InsertText {
            data: "hello".into(),
        }]));
        let bytes = &patch.as_bytes()[..patch.len() - 1];
        assert!(matches!(decode(bytes), Err(PatchError::Truncated { .. })));
    }

    #[test]
    fn invalid_utf8_is_field_scoped() {
        let mut bytes = encode(&ChangeLog::from(vec![Instruction::InsertComment {
            data: "ok".into(),
        }]))
        .as_bytes()
        .to_vec();
        let last = bytes.len() - 1;
        bytes[last] = 0xFF;
        assert_eq!(
            decode(&bytes).unwrap_err(),
            PatchError::InvalidUtf8 {
                record: "InsertComment",
                field: "data"
            }
        );
    }

    #[test]
    fn invalid_json_property_is_rejected() {
        let mut bytes = encode(&ChangeLog::from(vec![Instruction::AssignProperty {
            name: "p".into(),
            value: serde_json::json!(12),
        }]))
        .as_bytes()
        .to_vec();
        let last = bytes.len() - 1;
        bytes[last] = b'}';
        assert!(matches!(
            decode(&bytes),
            Err(PatchError::InvalidJson { record: "AssignProperty", field: "value", .. })
        ));
    }
}
