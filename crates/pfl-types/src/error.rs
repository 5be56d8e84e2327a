use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid canonical date: {0}")]
    InvalidDate(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("unknown asset kind: {0}")]
    UnknownAssetKind(String),
}
