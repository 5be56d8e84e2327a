use pfl_types::TypeError;

/// Errors from state-tree operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// A structural invariant does not hold at the given path.
    #[error("validation failed at {path}: {message}")]
    Validation { path: String, message: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The value is not an object and cannot be treated as state.
    #[error("state root must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for state operations.
pub type StateResult<T> = Result<T, StateError>;
