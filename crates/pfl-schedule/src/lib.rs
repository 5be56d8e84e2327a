//! Cashflow scheduler for the personal finance ledger.
//!
//! Scans the asset collections for embedded recurring-cashflow schedules
//! whose next occurrence has arrived and materializes each one as a
//! generated ledger entry, advancing the schedule by one period. The
//! transition itself is pure; a small worker-thread host drives it on a
//! cadence.
//!
//! # Key Types
//!
//! - [`generate`] -- Realize due occurrences against a state
//! - [`GenerationRun`] -- Resulting state, entries, and skips
//! - [`SkippedSchedule`] / [`SkipReason`] -- Per-schedule failure records
//! - [`GenerationScheduler`] -- run-once / interval / stop host

pub mod generate;
pub mod host;

pub use generate::{generate, GenerationRun, SkipReason, SkippedSchedule};
pub use host::GenerationScheduler;
