use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while constructing document values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// A thunk was built with more arguments than the cache compares.
    #[error("thunk accepts at most {max} arguments, got {actual}")]
    TooManyThunkArgs { max: usize, actual: usize },
}

pub type TypeResult<T> = Result<T, TypeError>;

/// Failure produced when a listener decoder runs against an event payload.
///
/// Returned to the event caller as a value; decoding never panics.
#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "failure", rename_all = "snake_case")]
pub enum DecodeFailure {
    /// The payload has the wrong JSON type or literal.
    #[error("expecting {expected} but found {found}")]
    Expecting { expected: String, found: String },

    /// A required object field is absent.
    #[error("missing field `{field}`")]
    MissingField { field: String },

    /// An array index is past the end.
    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: u32, len: usize },

    /// A nested decoder failed inside a field.
    #[error("in field `{field}`: {source}")]
    InField {
        field: String,
        source: Box<DecodeFailure>,
    },

    /// A nested decoder failed inside an array element.
    #[error("at index {index}: {source}")]
    AtIndex {
        index: u32,
        source: Box<DecodeFailure>,
    },

    /// Every alternative of an `Either` failed.
    #[error("none of {} alternatives matched", failures.len())]
    OneOf { failures: Vec<DecodeFailure> },

    /// Explicit failure from an `Error` decoder.
    #[error("{message}")]
    Failure { message: String },
}
