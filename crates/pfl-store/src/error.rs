/// Errors from persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Serialization or hashing of a state or snapshot failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The storage backend rejected or lost the write. Transient: the
    /// debounced writer retries on its next window.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A lock guarding the backend was poisoned by a panicked writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
