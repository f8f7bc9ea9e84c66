use thiserror::Error;

use vdelta_types::Address;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// A required field is absent from the record layout.
    #[error("{record} record is missing required field `{field}`")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    /// A nested variant tag is outside the known set.
    #[error("{record} record carries unknown variant tag {tag:#04x}")]
    InvalidVariant { record: &'static str, tag: u8 },

    /// The item tag byte is neither a layout nor a known opcode.
    #[error("unknown opcode {opcode:#04x} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },

    /// The input ends inside an item.
    #[error("patch truncated at offset {offset}")]
    Truncated { offset: usize },

    /// A string field is not valid UTF-8.
    #[error("invalid UTF-8 in {record}.{field}")]
    InvalidUtf8 {
        record: &'static str,
        field: &'static str,
    },

    /// The layout reference does not point at an earlier layout item.
    #[error("record at offset {offset} references an invalid layout")]
    InvalidLayout { offset: usize },

    /// A property value does not parse as JSON.
    #[error("invalid JSON in {record}.{field}: {reason}")]
    InvalidJson {
        record: &'static str,
        field: &'static str,
        reason: String,
    },

    /// A listener decoder exceeds the nesting limit.
    #[error("listener decoder nested deeper than {max} levels")]
    NestingTooDeep { max: usize },
}

pub type PatchResult<T> = Result<T, PatchError>;

/// Failure while applying a patch: either the bytes are bad or the host
/// rejected an instruction.
#[derive(Debug, Error)]
pub enum ApplyError<E> {
    /// The patch bytes are malformed.
    #[error("patch decode failed: {0}")]
    Decode(#[from] PatchError),

    /// The executor rejected an instruction.
    #[error("executor failed: {0}")]
    Executor(#[source] E),
}

/// Errors raised by the in-memory host.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The instruction needs a current node and the cursor is before the first child.
    #[error("no node under the cursor")]
    NoCurrentNode,

    /// There is no node after the cursor to remove, stash or shift.
    #[error("no sibling after the cursor")]
    NoNextSibling,

    /// A sibling move leaves the parent's child list.
    #[error("sibling offset {offset} from position {position} leaves the parent ({len} children)")]
    SiblingOutOfRange {
        position: isize,
        offset: i32,
        len: usize,
    },

    /// `SelectParent` at the top level.
    #[error("cursor is already at the root")]
    AtRoot,

    /// A settings or text instruction hit the wrong kind of node.
    #[error("{0} does not apply to this node kind")]
    WrongNodeKind(&'static str),

    /// Two stashes used the same address.
    #[error("stash address {0} is already occupied")]
    AddressInUse(Address),

    /// The address was never stashed or was already consumed.
    #[error("nothing stashed at address {0}")]
    EmptyAddress(Address),

    /// `EditTextData` bounds overlap or exceed the text.
    #[error("text edit [{start}, -{end}) does not fit {len} chars")]
    EditOutOfRange { start: u32, end: u32, len: usize },
}

pub type HostResult<T> = Result<T, HostError>;
