//! Foundation types for vdelta.
//!
//! This crate provides the document model that is diffed, and the
//! instruction vocabulary a diff pass produces. Every other vdelta crate
//! depends on `vdelta-types`.
//!
//! # Key Types
//!
//! - [`Node`] -- Immutable document tree (text, comment, element, fragment, thunk, tagged)
//! - [`Element`] / [`Children`] -- Element payload with keyed or unkeyed children
//! - [`Settings`] -- Attributes, properties, style rules, and event listeners
//! - [`DecoderSpec`] -- Listener payload decoder carried inside listener instructions
//! - [`Instruction`] -- One step of a patch, replayed by an executor
//! - [`ChangeLog`] -- The ordered instruction stream produced by one diff pass
//! - [`Address`] -- Pass-local handle correlating a stash with its reinsertion

pub mod address;
pub mod change_log;
pub mod decoder;
pub mod error;
pub mod instruction;
pub mod node;
pub mod settings;

pub use address::{Address, AddressCounter};
pub use change_log::ChangeLog;
pub use decoder::DecoderSpec;
pub use error::{DecodeFailure, TypeError, TypeResult};
pub use instruction::Instruction;
pub use node::{Children, Element, MapFn, Node, NodeKind, RenderFn, Tagged, Thunk, MAX_THUNK_ARGS};
pub use settings::{AttributeKey, ListenerKey, Settings};
