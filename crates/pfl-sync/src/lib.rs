//! Sync router for the personal finance ledger.
//!
//! A generated cashflow entry is a projection of the schedule that
//! produced it. When the user edits the entry, the change has to reach
//! both places: the schedule embedded in the owning asset (so future
//! occurrences pick it up) and the materialized entry itself. This crate
//! routes such edits, tolerating moved or vanished targets.
//!
//! # Key Types
//!
//! - [`EntryEdit`] -- An edit plus the routing metadata to deliver it
//! - [`propagate`] -- Apply an edit to schedule and entry
//! - [`PropagateOutcome`] -- What was reached, and the orphan warning if not
//! - [`audit::find_orphans`] -- Sweep for entries whose schedule is gone

pub mod audit;
pub mod router;

pub use router::{propagate, EntryEdit, OrphanWarning, PropagateOutcome};
