//! Value model for rows returned by a session.

use chrono::{DateTime, Utc};

/// A single column value in a result row.
///
/// Only the types the ledger schema uses are modelled; anything else a
/// backend returns maps to `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    Int(i32),
    BigInt(i64),
    Text(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Null,
}

/// A result row: column values in select order.
pub type Row = Vec<CqlValue>;

impl CqlValue {
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            CqlValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Read an integer column, widening `int` to `bigint`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CqlValue::BigInt(n) => Some(*n),
            CqlValue::Int(n) => Some(i64::from(*n)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CqlValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            CqlValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CqlValue::Null)
    }
}
