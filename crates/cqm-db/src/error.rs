//! Error types for cqm-db

use thiserror::Error;

/// Session and driver-boundary errors
#[derive(Error, Debug)]
pub enum DbError {
    /// D001: Could not reach or authenticate with the cluster
    #[error("[D001] Cluster connection failed: {message}")]
    ConnectionFailed { message: String },

    /// D002: A statement failed at the store
    #[error("[D002] Statement failed: {cause} (statement: {statement})")]
    StoreFailure { statement: String, cause: String },

    /// D003: A statement exceeded the configured timeout
    #[error("[D003] Statement timed out after {seconds}s: {statement}")]
    StatementTimeout { statement: String, seconds: u64 },

    /// D004: The requested backend was not compiled in
    #[error("[D004] Backend unavailable: rebuild with the '{feature}' feature")]
    BackendUnavailable { feature: String },
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;
