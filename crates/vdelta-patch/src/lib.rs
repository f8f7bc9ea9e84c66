//! Binary patch format for vdelta.
//!
//! A [`ChangeLog`] is encoded into one contiguous, immutable buffer and read
//! back record by record. Reading never deserializes the whole patch: each
//! record dispatches straight into an [`Executor`], the capability interface
//! of whatever structure the patch is applied to.
//!
//! # Key Types
//!
//! - [`PatchEncoder`] / [`Patch`] -- Write-once encoder and its finished buffer
//! - [`PatchReader`] / [`RecordView`] -- Lazy reader over patch bytes
//! - [`Executor`] -- Target-specific applier of instructions
//! - [`Recorder`] -- Executor that rebuilds owned instructions
//! - [`LiveTree`] -- In-memory reference host
//!
//! [`ChangeLog`]: vdelta_types::ChangeLog

pub mod decoder_codec;
pub mod encoder;
pub mod error;
pub mod executor;
pub mod live;
pub mod opcode;
pub mod reader;

pub use encoder::{encode, Patch, PatchEncoder};
pub use error::{ApplyError, HostError, HostResult, PatchError, PatchResult};
pub use executor::{apply_instruction, apply_log, Executor, NullExecutor, Recorder};
pub use live::{LiveCursor, LiveNode, LiveTree};
pub use opcode::Opcode;
pub use reader::{decode, PatchReader, RecordView, Records};
