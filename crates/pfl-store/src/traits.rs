use pfl_state::{FinancialState, Snapshot};
use pfl_types::{CanonicalDate, UserId};

use crate::error::StoreResult;

/// Per-user persistence boundary of the ledger.
///
/// All implementations must satisfy these invariants:
/// - Current state, draft, and history are independent slots; touching
///   one never changes the others.
/// - History holds at most one snapshot per canonical date and stays
///   sorted by date ascending.
/// - Reads of missing slots return `Ok(None)` (or an empty history),
///   never an error.
/// - Failures are reported as `StoreError` values; they must never
///   panic through to the caller.
pub trait PersistentStore: Send + Sync {
    /// The persisted current state. `Ok(None)` when the user has none.
    fn get(&self, user: &UserId) -> StoreResult<Option<FinancialState>>;

    fn set(&self, user: &UserId, state: &FinancialState) -> StoreResult<()>;

    /// The work-in-progress draft, independent of the persisted state.
    fn get_draft(&self, user: &UserId) -> StoreResult<Option<FinancialState>>;

    fn set_draft(&self, user: &UserId, state: &FinancialState) -> StoreResult<()>;

    fn clear_draft(&self, user: &UserId) -> StoreResult<()>;

    /// All snapshots for `user`, sorted by date ascending.
    fn get_history(&self, user: &UserId) -> StoreResult<Vec<Snapshot>>;

    /// Insert `snapshot`, replacing any existing snapshot carrying the
    /// same canonical date.
    fn append_or_replace_snapshot(&self, user: &UserId, snapshot: &Snapshot) -> StoreResult<()>;

    fn clear_history(&self, user: &UserId) -> StoreResult<()>;

    /// The snapshot on `date`, if any.
    ///
    /// Default implementation filters `get_history`. Backends with a
    /// date index may override.
    fn snapshot_on(&self, user: &UserId, date: CanonicalDate) -> StoreResult<Option<Snapshot>> {
        Ok(self
            .get_history(user)?
            .into_iter()
            .find(|snapshot| snapshot.date == date))
    }
}
