//! High-level facade for the personal finance ledger.
//!
//! Ties the subsystem crates together behind one per-user handle:
//! loading and saving state, reconciling a proposed state onto a
//! historical snapshot, scheduled cashflow generation, and routing
//! entry edits back to their source schedules.
//!
//! # Key Types
//!
//! - [`Ledger`] -- Per-user entry point over a [`PersistentStore`]
//! - [`ReconcileSession`] -- Selective merge with preview and commit
//! - [`LedgerSettings`] / [`SharedSettings`] -- Tunables with observers
//! - [`SdkError`] / [`SdkResult`] -- Failure surface

pub mod error;
pub mod ledger;
pub mod session;
pub mod settings;

pub use error::{SdkError, SdkResult};
pub use ledger::Ledger;
pub use session::ReconcileSession;
pub use settings::{LedgerSettings, SharedSettings, SubscriptionId};

// Re-export key types
pub use pfl_diff::{DiffAction, DiffPath, DiffRecord, DiffSet};
pub use pfl_merge::{GroupKey, SelectionModel, SelectionState};
pub use pfl_schedule::{GenerationRun, GenerationScheduler, SkipReason, SkippedSchedule};
pub use pfl_state::{FinancialState, Snapshot};
pub use pfl_store::{DebouncedWriter, InMemoryStore, PersistentStore};
pub use pfl_sync::{EntryEdit, OrphanWarning, PropagateOutcome};
pub use pfl_types::{AssetKind, CanonicalDate, CashflowKind, Frequency, ItemId, UserId};
