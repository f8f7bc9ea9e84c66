//! Binary form of listener decoders.
//!
//! A [`DecoderSpec`] is written depth first as one tag byte per node,
//! followed by that node's payload. Strings are `u32` length-prefixed UTF-8,
//! literals are JSON text in the same framing, child lists carry a `u32`
//! count.

use bytes::BufMut;
use serde_json::Value;

use vdelta_types::DecoderSpec;

use crate::error::{PatchError, PatchResult};

/// Decoders nested deeper than this are rejected.
pub const MAX_DEPTH: usize = 128;

const BOOL: u8 = 0x01;
const INT: u8 = 0x02;
const FLOAT: u8 = 0x03;
const STRING: u8 = 0x04;
const VALUE: u8 = 0x05;
const FIELD: u8 = 0x06;
const INDEX: u8 = 0x07;
const RECORD: u8 = 0x08;
const FORM: u8 = 0x09;
const EITHER: u8 = 0x0A;
const MAYBE: u8 = 0x0B;
const OPTIONAL: u8 = 0x0C;
const MATCH: u8 = 0x0D;
const AND: u8 = 0x0E;
const OK: u8 = 0x0F;
const ERROR: u8 = 0x10;

pub fn encode_decoder<B: BufMut>(spec: &DecoderSpec, out: &mut B) {
    match spec {
        DecoderSpec::Bool => out.put_u8(BOOL),
        DecoderSpec::Int => out.put_u8(INT),
        DecoderSpec::Float => out.put_u8(FLOAT),
        DecoderSpec::String => out.put_u8(STRING),
        DecoderSpec::Value => out.put_u8(VALUE),
        DecoderSpec::Field { name, decoder } => {
            out.put_u8(FIELD);
            put_str(out, name);
            encode_decoder(decoder, out);
        }
        DecoderSpec::Index { index, decoder } => {
            out.put_u8(INDEX);
            out.put_u32_le(*index);
            encode_decoder(decoder, out);
        }
        DecoderSpec::Record { fields } | DecoderSpec::Form { fields } => {
            out.put_u8(if matches!(spec, DecoderSpec::Record { .. }) {
                RECORD
            } else {
                FORM
            });
            out.put_u32_le(fields.len() as u32);
            for (name, decoder) in fields {
                put_str(out, name);
                encode_decoder(decoder, out);
            }
        }
        DecoderSpec::Either { options } => {
            out.put_u8(EITHER);
            out.put_u32_le(options.len() as u32);
            for option in options {
                encode_decoder(option, out);
            }
        }
        DecoderSpec::Maybe { decoder } => {
            out.put_u8(MAYBE);
            encode_decoder(decoder, out);
        }
        DecoderSpec::Optional { name, decoder } => {
            out.put_u8(OPTIONAL);
            put_str(out, name);
            encode_decoder(decoder, out);
        }
        DecoderSpec::Match { literal } => {
            out.put_u8(MATCH);
            put_str(out, &literal.to_string());
        }
        DecoderSpec::And { first, second } => {
            out.put_u8(AND);
            encode_decoder(first, out);
            encode_decoder(second, out);
        }
        DecoderSpec::Ok { value } => {
            out.put_u8(OK);
            put_str(out, &value.to_string());
        }
        DecoderSpec::Error { message } => {
            out.put_u8(ERROR);
            put_str(out, message);
        }
    }
}

fn put_str<B: BufMut>(out: &mut B, s: &str) {
    out.put_u32_le(s.len() as u32);
    out.put_slice(s.as_bytes());
}

/// Decode a listener decoder that must fill `data` exactly.
///
/// `base` is the absolute offset of `data` in the patch and `record` the
/// owning record name; both only feed error values.
pub fn decode_decoder(data: &[u8], base: usize, record: &'static str) -> PatchResult<DecoderSpec> {
    let mut input = Input {
        data,
        pos: 0,
        base,
        record,
    };
    let spec = input.spec(0)?;
    if input.pos != data.len() {
        return Err(PatchError::InvalidVariant {
            record,
            tag: data[input.pos],
        });
    }
    Ok(spec)
}

struct Input<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
    record: &'static str,
}

impl<'a> Input<'a> {
    fn take(&mut self, n: usize) -> PatchResult<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.data.len());
        match end {
            Some(end) => {
                let slice = &self.data[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(PatchError::Truncated {
                offset: self.base + self.data.len(),
            }),
        }
    }

    fn byte(&mut self) -> PatchResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> PatchResult<u32> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn string(&mut self) -> PatchResult<String> {
        let len = self.u32()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| PatchError::InvalidUtf8 {
            record: self.record,
            field: "decoder",
        })
    }

    fn json(&mut self) -> PatchResult<Value> {
        let text = self.string()?;
        serde_json::from_str(&text).map_err(|e| PatchError::InvalidJson {
            record: self.record,
            field: "decoder",
            reason: e.to_string(),
        })
    }

    fn boxed(&mut self, depth: usize) -> PatchResult<Box<DecoderSpec>> {
        self.spec(depth + 1).map(Box::new)
    }

    fn spec(&mut self, depth: usize) -> PatchResult<DecoderSpec> {
        if depth > MAX_DEPTH {
            return Err(PatchError::NestingTooDeep { max: MAX_DEPTH });
        }

        let tag = self.byte()?;
        let spec = match tag {
            BOOL => DecoderSpec::Bool,
            INT => DecoderSpec::Int,
            FLOAT => DecoderSpec::Float,
            STRING => DecoderSpec::String,
            VALUE => DecoderSpec::Value,
            FIELD => DecoderSpec::Field {
                name: self.string()?,
                decoder: self.boxed(depth)?,
            },
            INDEX => DecoderSpec::Index {
                index: self.u32()?,
                decoder: self.boxed(depth)?,
            },
            RECORD | FORM => {
                let count = self.u32()? as usize;
                // Each entry needs at least five bytes.
                let mut fields = Vec::with_capacity(count.min(self.remaining() / 5));
                for _ in 0..count {
                    let name = self.string()?;
                    fields.push((name, self.spec(depth + 1)?));
                }
                if tag == RECORD {
                    DecoderSpec::Record { fields }
                } else {
                    DecoderSpec::Form { fields }
                }
            }
            EITHER => {
                let count = self.u32()? as usize;
                let mut options = Vec::with_capacity(count.min(self.remaining()));
                for _ in 0..count {
                    options.push(self.spec(depth + 1)?);
                }
                DecoderSpec::Either { options }
            }
            MAYBE => DecoderSpec::Maybe {
                decoder: self.boxed(depth)?,
            },
            OPTIONAL => DecoderSpec::Optional {
                name: self.string()?,
                decoder: self.boxed(depth)?,
            },
            MATCH => DecoderSpec::Match {
                literal: self.json()?,
            },
            AND => DecoderSpec::And {
                first: self.boxed(depth)?,
                second: self.boxed(depth)?,
            },
            OK => DecoderSpec::Ok {
                value: self.json()?,
            },
            ERROR => DecoderSpec::Error {
                message: self.string()?,
            },
            other => {
                return Err(PatchError::InvalidVariant {
                    record: self.record,
                    tag: other,
                })
            }
        };
        Ok(spec)
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}
