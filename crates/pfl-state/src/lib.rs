//! Financial state tree for the personal finance ledger (PFL).
//!
//! The ledger state is a two-level JSON tree: named sections at the top
//! (income, assets, liquidity, expenses, side projects), each holding
//! scalar fields and/or collections of line items. This crate owns that
//! tree ([`FinancialState`]), the typed wire records embedded in it
//! ([`CashflowSchedule`], [`GeneratedCashflowEntry`]), dated snapshots
//! of it ([`Snapshot`]), and structural validation over it.
//!
//! The tree is open: engines interpret only the section and field names
//! in [`section`] and [`field`], and everything else passes through
//! untouched.

pub mod error;
pub mod records;
pub mod snapshot;
pub mod state;
pub mod validation;

pub use error::{StateError, StateResult};
pub use records::{CashflowSchedule, GeneratedCashflowEntry};
pub use snapshot::{hash_state, Snapshot};
pub use state::{field, find_by_id, find_by_id_mut, item_id, position_of_id, section, FinancialState};
pub use validation::{check_state, ensure_valid, StateReport, StateViolation, StateViolationKind};
