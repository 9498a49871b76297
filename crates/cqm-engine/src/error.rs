//! Error types for cqm-engine

use thiserror::Error;

/// Migration engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// G001: A filename matched the migration grammar but is unusable
    #[error("[G001] Invalid migration name '{path}': {reason}")]
    InvalidMigrationName { path: String, reason: String },

    /// G002: Two resolved migrations share a version
    #[error("[G002] Duplicate migration version {version}: {first} and {second}")]
    DuplicateVersion {
        version: String,
        first: String,
        second: String,
    },

    /// G003: Baseline refused because the ledger is already past it
    #[error("[G003] Baseline to {version} not allowed: ledger already contains {blocking}")]
    BaselineNotAllowed { version: String, blocking: String },

    /// G004: The merged view failed validation
    #[error("[G004] Validation failed: {detail}")]
    ValidationFailed { detail: String },

    /// G005: A migration aborted the Migrate command
    #[error("[G005] Migration to version {version} failed: {cause}")]
    MigrationFailed {
        version: String,
        #[source]
        cause: Box<EngineError>,
    },

    /// G006: A resource's bytes could not be decoded
    #[error("[G006] Failed to decode '{path}': {detail}")]
    ResourceDecode { path: String, detail: String },

    /// G007: IO error while scanning resources
    #[error("[G007] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Core(#[from] cqm_core::CoreError),

    #[error("{0}")]
    Cql(#[from] cqm_cql::CqlError),

    #[error("{0}")]
    Db(#[from] cqm_db::DbError),

    #[error("{0}")]
    Ledger(#[from] cqm_ledger::LedgerError),
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;
