//! Ledger error types.

/// Ledger persistence errors
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Reading or writing the snapshot file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot is not a flat object of user id to integer
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
