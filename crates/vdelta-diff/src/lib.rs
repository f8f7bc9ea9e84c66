//! Diff engine for vdelta.
//!
//! Compares two document snapshots and produces the [`ChangeLog`] that turns
//! a live structure rendered from the first into one matching the second.
//!
//! # Key Types
//!
//! - [`Differ`] / [`diff`] -- Structural tree diff producing a [`ChangeLog`]
//! - [`EditTable`] / [`Edit`] -- Edit-distance table behind keyed list reconciliation
//! - [`NavigationLog`] -- Lazily materialized cursor moves
//! - [`diff_settings`] / [`diff_text`] -- Element settings and character data diffs
//! - [`DiffConfig`] -- Tunable heuristics
//!
//! [`ChangeLog`]: vdelta_types::ChangeLog

pub mod config;
pub mod cursor;
pub mod differ;
mod keyed;
pub mod settings_diff;
pub mod table;
pub mod text_diff;

pub use config::DiffConfig;
pub use cursor::{Level, Move, NavigationLog};
pub use differ::{diff, diff_from_empty, Differ};
pub use settings_diff::diff_settings;
pub use table::{Edit, EditTable};
pub use text_diff::diff_text;
