use thiserror::Error;

use pfl_types::CanonicalDate;

#[derive(Debug, Error)]
pub enum SdkError {
    /// No snapshot exists on the requested baseline date.
    #[error("no snapshot on {0}")]
    NoSnapshot(CanonicalDate),

    /// The user has no persisted state to operate on.
    #[error("no persisted state for this user")]
    NoState,

    #[error("state error: {0}")]
    State(#[from] pfl_state::StateError),

    #[error("store error: {0}")]
    Store(#[from] pfl_store::StoreError),
}

pub type SdkResult<T> = Result<T, SdkError>;
