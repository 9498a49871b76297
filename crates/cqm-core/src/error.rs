//! Error types for cqm-core

use thiserror::Error;

/// Core error type for cqlmigrate
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Version string could not be parsed
    #[error("[E001] Invalid migration version '{raw}': {reason}")]
    InvalidVersion { raw: String, reason: String },

    /// E002: Configuration file not found
    #[error("[E002] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config field '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    /// E004: Migration description constraint violated
    #[error("[E004] Invalid description for '{script}': {reason}")]
    InvalidDescription { script: String, reason: String },

    /// E005: Unknown migration type tag read from the ledger
    #[error("[E005] Unknown migration type: {raw}")]
    UnknownMigrationType { raw: String },

    /// E006: IO error with file path context
    #[error("[E006] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E007: IO error
    #[error("[E007] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E008: YAML parse error
    #[error("[E008] Failed to parse config: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
