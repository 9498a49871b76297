//! Error types for cqm-cql

use thiserror::Error;

/// CQL script parsing errors
#[derive(Error, Debug)]
pub enum CqlError {
    /// Q001: A quoted literal was opened but never closed
    #[error("[Q001] Unterminated {quote}-quoted literal starting on line {line}")]
    UnterminatedLiteral { line: usize, quote: char },

    /// Q002: A block comment was opened but never closed
    #[error("[Q002] Unterminated block comment starting on line {line}")]
    UnterminatedBlockComment { line: usize },
}

/// Result type alias for CqlError
pub type CqlResult<T> = Result<T, CqlError>;
