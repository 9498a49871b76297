//! Error types for cqm-ledger

use thiserror::Error;

/// Ledger persistence errors
#[derive(Error, Debug)]
pub enum LedgerError {
    /// L001: Store-level failure from the session
    #[error("[L001] {0}")]
    Db(#[from] cqm_db::DbError),

    /// L002: A ledger row already exists at this version
    #[error("[L002] Duplicate ledger entry for version {version}")]
    DuplicateVersion { version: String },

    /// L003: The advisory lock could not be acquired
    #[error("[L003] Migration lock unavailable after {attempts} attempts")]
    LockUnavailable { attempts: u32 },

    /// L004: A ledger row could not be decoded
    #[error("[L004] Ledger row decode failed at column '{column}': {detail}")]
    RowDecode { column: String, detail: String },

    /// L005: A version or type tag read from the ledger is invalid
    #[error("[L005] {0}")]
    Core(#[from] cqm_core::CoreError),
}

/// Result type alias for LedgerError
pub type LedgerResult<T> = Result<T, LedgerError>;
