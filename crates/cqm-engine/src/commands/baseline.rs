//! Baseline command: mark a version below which migrations are assumed
//! already applied.

use crate::commands::{installed_by, release_quietly};
use crate::error::{EngineError, EngineResult};
use chrono::Utc;
use cqm_core::migration::MigrationType;
use cqm_core::{AppliedMigration, MigrationConfig, MigrationVersion};
use cqm_ledger::SchemaVersionDao;

/// Insert a `BASELINE` row at the configured baseline version.
///
/// Refuses with `BaselineNotAllowed` when the ledger already contains a row
/// above the baseline version (successful or not), or a baseline at a
/// different version. Re-baselining to the same version is a no-op.
pub async fn baseline(
    dao: &dyn SchemaVersionDao,
    config: &MigrationConfig,
) -> EngineResult<MigrationVersion> {
    let baseline_version = config.baseline()?;

    dao.ensure_tables().await?;
    dao.acquire_lock(&installed_by(config)).await?;
    let result = baseline_locked(dao, config, &baseline_version).await;
    release_quietly(dao).await;

    result?;
    Ok(baseline_version)
}

async fn baseline_locked(
    dao: &dyn SchemaVersionDao,
    config: &MigrationConfig,
    baseline_version: &MigrationVersion,
) -> EngineResult<()> {
    let applied = dao.find_applied_migrations().await?;

    if let Some(existing) = applied
        .iter()
        .find(|a| a.migration_type == MigrationType::Baseline)
    {
        if existing.version == *baseline_version {
            log::debug!("keyspace already baselined at {baseline_version}");
            return Ok(());
        }
        return Err(EngineError::BaselineNotAllowed {
            version: baseline_version.to_string(),
            blocking: format!("a baseline at version {}", existing.version),
        });
    }

    if let Some(higher) = applied
        .iter()
        .filter(|a| a.migration_type != MigrationType::Schema)
        .find(|a| a.version > *baseline_version)
    {
        return Err(EngineError::BaselineNotAllowed {
            version: baseline_version.to_string(),
            blocking: format!("version {}", higher.version),
        });
    }

    let rank = dao.allocate_installed_rank().await?;
    dao.add_applied_migration(&AppliedMigration {
        version_rank: 0,
        installed_rank: rank,
        version: baseline_version.clone(),
        description: config.baseline_description.clone(),
        migration_type: MigrationType::Baseline,
        script: config.baseline_description.clone(),
        checksum: None,
        installed_on: Utc::now(),
        installed_by: installed_by(config),
        execution_time_ms: 0,
        success: true,
    })
    .await?;
    Ok(())
}
