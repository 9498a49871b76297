//! Migrate command: apply pending migrations up to the target version.

use crate::commands::validate::validation_error;
use crate::commands::{installed_by, release_quietly};
use crate::error::{EngineError, EngineResult};
use crate::info::{MigrationInfoService, MigrationState};
use crate::resolver::{ExecutableMigration, MigrationResolver};
use chrono::Utc;
use cqm_core::{AppliedMigration, MigrationConfig, MigrationVersion};
use cqm_db::Session;
use cqm_ledger::SchemaVersionDao;
use std::collections::HashMap;
use std::time::Instant;

/// Apply every pending migration with version at or below the target, in
/// ascending version order. Returns the number of migrations applied.
///
/// The first failing migration aborts the run with `MigrationFailed`,
/// leaving its `success=false` ledger row in place; later migrations are
/// not attempted. Re-running against such a ledger reports the same failure
/// until the operator deletes or repairs the row.
pub async fn migrate(
    session: &dyn Session,
    dao: &dyn SchemaVersionDao,
    resolver: &dyn MigrationResolver,
    config: &MigrationConfig,
) -> EngineResult<usize> {
    let target = config.target_version()?;
    // Resolver and parser failures abort before any ledger write
    let resolved = resolver.resolve()?;

    dao.ensure_tables().await?;
    dao.acquire_lock(&installed_by(config)).await?;
    let result = migrate_locked(session, dao, &resolved, config, target).await;
    release_quietly(dao).await;
    result
}

async fn migrate_locked(
    session: &dyn Session,
    dao: &dyn SchemaVersionDao,
    resolved: &[ExecutableMigration],
    config: &MigrationConfig,
    target: MigrationVersion,
) -> EngineResult<usize> {
    let applied = dao.find_applied_migrations().await?;

    let records: Vec<_> = resolved.iter().map(|m| m.resolved.clone()).collect();
    let mut service = MigrationInfoService::new(target, config.allow_out_of_order);
    service.refresh(&records, &applied);

    // A failed row blocks progress until an operator removes or repairs it
    if let Some(failed) = service
        .all()
        .iter()
        .find(|i| i.state == MigrationState::Failed)
    {
        return Err(EngineError::MigrationFailed {
            version: failed.version.to_string(),
            cause: Box::new(EngineError::ValidationFailed {
                detail: format!(
                    "version {} failed on a previous run; delete its ledger row or repair it before retrying",
                    failed.version
                ),
            }),
        });
    }

    if let Some(detail) = validation_error(&service, true) {
        return Err(EngineError::ValidationFailed { detail });
    }

    let by_version: HashMap<&MigrationVersion, &ExecutableMigration> = resolved
        .iter()
        .map(|m| (&m.resolved.version, m))
        .collect();

    let pending: Vec<_> = service
        .pending()
        .iter()
        .map(|i| i.version.clone())
        .collect();
    let installed_by = installed_by(config);
    let mut count = 0usize;

    for version in pending {
        let migration = by_version
            .get(&version)
            .expect("pending entry is always resolved");

        let rank = dao.allocate_installed_rank().await?;
        dao.add_applied_migration(&AppliedMigration {
            version_rank: 0,
            installed_rank: rank,
            version: version.clone(),
            description: migration.resolved.description.clone(),
            migration_type: migration.resolved.migration_type,
            script: migration.resolved.script.clone(),
            checksum: migration.resolved.checksum,
            installed_on: Utc::now(),
            installed_by: installed_by.clone(),
            execution_time_ms: 0,
            success: false,
        })
        .await?;

        let started = Instant::now();
        match migration.executor.execute(session, config.timeout()).await {
            Ok(()) => {
                let elapsed_ms = started.elapsed().as_millis() as i64;
                dao.mark_success(rank, elapsed_ms).await?;
                log::debug!(
                    "applied migration {} ({}) in {elapsed_ms}ms",
                    version,
                    migration.resolved.script
                );
                count += 1;
            }
            Err(cause) => {
                return Err(EngineError::MigrationFailed {
                    version: version.to_string(),
                    cause: Box::new(cause),
                });
            }
        }
    }

    Ok(count)
}
