//! Persistence boundary for the personal finance ledger.
//!
//! Storage is per user and split into three independent slots: the
//! persisted current state, a best-effort draft, and a dated snapshot
//! history holding at most one snapshot per canonical date. The ledger
//! core treats all of it as eventually consistent: failures are
//! reported, retried where sensible, and never crash the caller.
//!
//! # Key Types
//!
//! - [`PersistentStore`] -- The storage trait backends implement
//! - [`InMemoryStore`] -- `HashMap`-based backend for tests and embedding
//! - [`DebouncedWriter`] -- Coalesces draft writes over a quiet window
//! - [`StoreError`] / [`StoreResult`] -- Failure reporting

pub mod debounce;
pub mod error;
pub mod memory;
pub mod traits;

pub use debounce::{DebouncedWriter, DEFAULT_QUIET_WINDOW};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use traits::PersistentStore;
