//! Decoding ledger rows into [`AppliedMigration`] records.

use crate::error::{LedgerError, LedgerResult};
use cqm_core::migration::MigrationType;
use cqm_core::{AppliedMigration, MigrationVersion};
use cqm_db::{CqlValue, Row};

/// Column order every ledger SELECT uses.
pub const LEDGER_COLUMNS: &str = "version_rank, installed_rank, version, description, \
     type, script, checksum, installed_on, installed_by, execution_time, success";

/// Number of columns in [`LEDGER_COLUMNS`].
pub const LEDGER_COLUMN_COUNT: usize = 11;

fn decode_error(column: &str, detail: impl Into<String>) -> LedgerError {
    LedgerError::RowDecode {
        column: column.to_string(),
        detail: detail.into(),
    }
}

fn get<'a>(row: &'a Row, idx: usize, column: &str) -> LedgerResult<&'a CqlValue> {
    row.get(idx)
        .ok_or_else(|| decode_error(column, format!("missing column at index {idx}")))
}

fn required_i32(row: &Row, idx: usize, column: &str) -> LedgerResult<i32> {
    get(row, idx, column)?
        .as_i32()
        .ok_or_else(|| decode_error(column, "expected int"))
}

fn required_text(row: &Row, idx: usize, column: &str) -> LedgerResult<String> {
    Ok(get(row, idx, column)?
        .as_str()
        .ok_or_else(|| decode_error(column, "expected text"))?
        .to_string())
}

/// Whether a raw row is the advisory lock row rather than a real entry.
pub fn is_lock_row(row: &Row) -> bool {
    let rank = row.get(1).and_then(|v| v.as_i32());
    let version = row.get(2).and_then(|v| v.as_str());
    rank == Some(0) || version == Some("?")
}

/// Decode one ledger row in [`LEDGER_COLUMNS`] order.
pub fn decode_applied(row: &Row) -> LedgerResult<AppliedMigration> {
    let version_text = required_text(row, 2, "version")?;
    let type_text = required_text(row, 4, "type")?;

    Ok(AppliedMigration {
        // A row inserted as pending has no version rank yet; treat null as 0
        version_rank: get(row, 0, "version_rank")?.as_i32().unwrap_or(0),
        installed_rank: required_i32(row, 1, "installed_rank")?,
        version: MigrationVersion::parse(&version_text)?,
        description: required_text(row, 3, "description")?,
        migration_type: MigrationType::parse(&type_text)?,
        script: required_text(row, 5, "script")?,
        checksum: get(row, 6, "checksum")?.as_i32(),
        installed_on: get(row, 7, "installed_on")?
            .as_timestamp()
            .ok_or_else(|| decode_error("installed_on", "expected timestamp"))?,
        installed_by: required_text(row, 8, "installed_by")?,
        execution_time_ms: get(row, 9, "execution_time")?.as_i64().unwrap_or(0),
        success: get(row, 10, "success")?
            .as_bool()
            .ok_or_else(|| decode_error("success", "expected boolean"))?,
    })
}
