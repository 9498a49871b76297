//! Migration data model: type tags, resolved records, applied ledger rows.

use crate::error::{CoreError, CoreResult};
use crate::version::MigrationVersion;
use chrono::{DateTime, Utc};
use std::fmt;

/// Longest description the ledger accepts.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// How a migration is executed.
///
/// The `Display`/`parse` strings are the exact tags stored in the ledger's
/// `type` column and round-trip with existing deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationType {
    /// A CQL script split into statements and executed one by one.
    Cql,
    /// A code unit whose execution is delegated to the host runtime.
    JavaDriver,
    /// Internal marker inserted by the Initialize command.
    Schema,
    /// Marker inserted by the Baseline command.
    Baseline,
}

impl MigrationType {
    /// Parse a ledger `type` column value.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        match raw {
            "CQL" => Ok(MigrationType::Cql),
            "JAVA_DRIVER" => Ok(MigrationType::JavaDriver),
            "SCHEMA" => Ok(MigrationType::Schema),
            "BASELINE" => Ok(MigrationType::Baseline),
            _ => Err(CoreError::UnknownMigrationType {
                raw: raw.to_string(),
            }),
        }
    }

    /// Whether this is one of the synthetic marker types the resolver never
    /// produces.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, MigrationType::Schema | MigrationType::Baseline)
    }
}

impl fmt::Display for MigrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            MigrationType::Cql => "CQL",
            MigrationType::JavaDriver => "JAVA_DRIVER",
            MigrationType::Schema => "SCHEMA",
            MigrationType::Baseline => "BASELINE",
        };
        f.write_str(tag)
    }
}

/// A migration discovered by a resolver, not yet paired with an executor.
///
/// `(version, description, type, checksum)` is the identity tuple used by
/// validation against the applied ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMigration {
    /// Migration version; unique across all resolved migrations.
    pub version: MigrationVersion,

    /// Human-readable description (non-empty, at most 1000 chars).
    pub description: String,

    /// Execution type tag.
    pub migration_type: MigrationType,

    /// Logical script name used in error messages.
    pub script: String,

    /// Content digest; `None` only for driver-code units that do not
    /// implement the checksum capability.
    pub checksum: Option<i32>,

    /// Opaque origin string (filesystem path, type name, ...).
    pub physical_location: String,
}

impl ResolvedMigration {
    /// Construct a resolved migration, enforcing the description constraints.
    pub fn new(
        version: MigrationVersion,
        description: impl Into<String>,
        migration_type: MigrationType,
        script: impl Into<String>,
        checksum: Option<i32>,
        physical_location: impl Into<String>,
    ) -> CoreResult<Self> {
        let script = script.into();
        let description = description.into();
        if description.is_empty() {
            return Err(CoreError::InvalidDescription {
                script,
                reason: "description is empty".to_string(),
            });
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(CoreError::InvalidDescription {
                script,
                reason: format!("description exceeds {MAX_DESCRIPTION_LEN} characters"),
            });
        }
        Ok(Self {
            version,
            description,
            migration_type,
            script,
            checksum,
            physical_location: physical_location.into(),
        })
    }
}

/// A row of the schema-version ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    /// Dense position among successful rows sorted by version ascending.
    pub version_rank: i32,

    /// Strictly monotonic insertion order, allocated from the counter table.
    pub installed_rank: i32,

    /// Migration version.
    pub version: MigrationVersion,

    /// Description recorded at apply time.
    pub description: String,

    /// Execution type tag recorded at apply time.
    pub migration_type: MigrationType,

    /// Logical script name recorded at apply time.
    pub script: String,

    /// Content digest recorded at apply time, if any.
    pub checksum: Option<i32>,

    /// When the row was inserted.
    pub installed_on: DateTime<Utc>,

    /// Identity of the migrator.
    pub installed_by: String,

    /// Wall-clock execution time in milliseconds.
    pub execution_time_ms: i64,

    /// Whether the migration completed successfully.
    pub success: bool,
}
