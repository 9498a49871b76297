//! Initialize command: create the ledger tables and seed the schema marker.

use crate::commands::installed_by;
use crate::error::EngineResult;
use chrono::Utc;
use cqm_core::migration::MigrationType;
use cqm_core::{AppliedMigration, MigrationConfig, MigrationVersion};
use cqm_ledger::SchemaVersionDao;

/// Description recorded on the schema marker row.
const SCHEMA_MARKER_DESCRIPTION: &str = "<< Schema Creation >>";

/// Ensure the ledger exists and, if it is empty, insert the `SCHEMA` marker
/// row at version `0`. Idempotent; takes no lock.
pub async fn initialize(
    dao: &dyn SchemaVersionDao,
    config: &MigrationConfig,
) -> EngineResult<()> {
    dao.ensure_tables().await?;

    if !dao.find_applied_migrations().await?.is_empty() {
        log::debug!("ledger already initialized, nothing to do");
        return Ok(());
    }

    let rank = dao.allocate_installed_rank().await?;
    dao.add_applied_migration(&AppliedMigration {
        version_rank: 0,
        installed_rank: rank,
        version: MigrationVersion::parse("0")?,
        description: SCHEMA_MARKER_DESCRIPTION.to_string(),
        migration_type: MigrationType::Schema,
        script: config.keyspace.clone(),
        checksum: None,
        installed_on: Utc::now(),
        installed_by: installed_by(config),
        execution_time_ms: 0,
        success: true,
    })
    .await?;
    Ok(())
}
