use serde::{Deserialize, Serialize};

use pfl_types::CanonicalDate;

use crate::error::{StateError, StateResult};
use crate::state::FinancialState;

/// A dated capture of the full financial state.
///
/// Wire form is exactly `{"date": "YYYY-MM-DD", "state": { ... }}`.
/// History holds at most one snapshot per canonical date per user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub date: CanonicalDate,
    pub state: FinancialState,
}

impl Snapshot {
    pub fn new(date: CanonicalDate, state: FinancialState) -> Self {
        Self { date, state }
    }

    /// BLAKE3 fingerprint of the state, for cheap change detection.
    pub fn state_hash(&self) -> StateResult<[u8; 32]> {
        hash_state(&self.state)
    }

    pub fn state_hash_hex(&self) -> StateResult<String> {
        Ok(hex::encode(self.state_hash()?))
    }
}

/// BLAKE3 over the canonical JSON encoding of the state. The section map
/// is ordered, so equal states hash equal regardless of how they were
/// assembled.
pub fn hash_state(state: &FinancialState) -> StateResult<[u8; 32]> {
    let encoded =
        serde_json::to_vec(state).map_err(|e| StateError::Serialization(e.to_string()))?;
    Ok(*blake3::hash(&encoded).as_bytes())
}
