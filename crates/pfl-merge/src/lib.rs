//! Selective merge for the personal finance ledger.
//!
//! Sits between the diff engine and persistence: the user reviews a
//! [`DiffSet`](pfl_diff::DiffSet), approves a subset of it through a
//! [`SelectionModel`], and [`apply`] folds exactly the approved records
//! onto a baseline state, leaving everything else untouched.
//!
//! # Key Types
//!
//! - [`SelectionModel`] / [`SelectionState`] / [`GroupKey`] -- Per-record
//!   approval flags with tri-state group rollups
//! - [`apply`] -- Pure copy-on-write application of the approved subset

pub mod merge;
pub mod selection;

pub use merge::apply;
pub use selection::{GroupKey, SelectionModel, SelectionState};
