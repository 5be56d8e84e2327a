//! Diff engine for the personal finance ledger.
//!
//! Computes fine-grained structural diffs between two financial state
//! trees, producing per-field and per-item change records a user can
//! approve individually before a merge.
//!
//! # Key Types
//!
//! - [`DiffSet`] / [`DiffRecord`] -- The change set and its records
//! - [`DiffAction`] -- add / remove / modify
//! - [`DiffPath`] -- Unique key of one mergeable unit
//! - [`compute`] -- Compare two states
//! - [`canonical_eq`] -- Deep equality with empty-value canonicalization

pub mod canonical;
pub mod engine;
pub mod record;

pub use canonical::canonical_eq;
pub use engine::compute;
pub use record::{DiffAction, DiffPath, DiffRecord, DiffSet};
