use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use pfl_state::{FinancialState, Snapshot};
use pfl_types::UserId;

use crate::error::{StoreError, StoreResult};
use crate::traits::PersistentStore;

#[derive(Clone, Debug, Default)]
struct UserSlot {
    current: Option<FinancialState>,
    draft: Option<FinancialState>,
    history: Vec<Snapshot>,
}

/// In-memory, HashMap-based store.
///
/// Intended for tests and embedding. Everything is held behind an
/// `RwLock` and cloned on read, so concurrent readers never observe a
/// half-written slot.
pub struct InMemoryStore {
    users: RwLock<HashMap<UserId, UserSlot>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Number of users with any stored data.
    pub fn user_count(&self) -> StoreResult<usize> {
        Ok(self.read_users()?.len())
    }

    /// Drop every user's data.
    pub fn clear(&self) -> StoreResult<()> {
        self.write_users()?.clear();
        Ok(())
    }

    fn read_users(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<UserId, UserSlot>>> {
        self.users.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write_users(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<UserId, UserSlot>>> {
        self.users.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistentStore for InMemoryStore {
    fn get(&self, user: &UserId) -> StoreResult<Option<FinancialState>> {
        Ok(self
            .read_users()?
            .get(user)
            .and_then(|slot| slot.current.clone()))
    }

    fn set(&self, user: &UserId, state: &FinancialState) -> StoreResult<()> {
        self.write_users()?
            .entry(user.clone())
            .or_default()
            .current = Some(state.clone());
        Ok(())
    }

    fn get_draft(&self, user: &UserId) -> StoreResult<Option<FinancialState>> {
        Ok(self
            .read_users()?
            .get(user)
            .and_then(|slot| slot.draft.clone()))
    }

    fn set_draft(&self, user: &UserId, state: &FinancialState) -> StoreResult<()> {
        self.write_users()?.entry(user.clone()).or_default().draft = Some(state.clone());
        Ok(())
    }

    fn clear_draft(&self, user: &UserId) -> StoreResult<()> {
        if let Some(slot) = self.write_users()?.get_mut(user) {
            slot.draft = None;
        }
        Ok(())
    }

    fn get_history(&self, user: &UserId) -> StoreResult<Vec<Snapshot>> {
        Ok(self
            .read_users()?
            .get(user)
            .map(|slot| slot.history.clone())
            .unwrap_or_default())
    }

    fn append_or_replace_snapshot(&self, user: &UserId, snapshot: &Snapshot) -> StoreResult<()> {
        let mut users = self.write_users()?;
        let history = &mut users.entry(user.clone()).or_default().history;
        match history.iter_mut().find(|s| s.date == snapshot.date) {
            Some(existing) => *existing = snapshot.clone(),
            None => {
                history.push(snapshot.clone());
                history.sort_by_key(|s| s.date);
            }
        }
        Ok(())
    }

    fn clear_history(&self, user: &UserId) -> StoreResult<()> {
        if let Some(slot) = self.write_users()?.get_mut(user) {
            slot.history.clear();
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let users = match self.user_count() {
            Ok(count) => count.to_string(),
            Err(_) => "poisoned".to_string(),
        };
        f.debug_struct("InMemoryStore").field("users", &users).finish()
    }
}
