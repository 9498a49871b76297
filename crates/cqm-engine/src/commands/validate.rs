//! Validate command: check the applied ledger against locally resolved
//! migrations.

use crate::commands::{installed_by, release_quietly};
use crate::error::EngineResult;
use crate::info::{MigrationInfoService, MigrationState};
use crate::resolver::MigrationResolver;
use cqm_core::MigrationConfig;
use cqm_ledger::SchemaVersionDao;

/// Compare resolved migrations with the applied ledger.
///
/// Returns `None` when the two agree, or the first discrepancy in
/// version-ascending order. Discrepancies are reported, not thrown, so
/// callers may inspect or escalate.
pub async fn validate(
    dao: &dyn SchemaVersionDao,
    resolver: &dyn MigrationResolver,
    config: &MigrationConfig,
) -> EngineResult<Option<String>> {
    let target = config.target_version()?;
    let resolved: Vec<_> = resolver
        .resolve()?
        .into_iter()
        .map(|m| m.resolved)
        .collect();

    dao.ensure_tables().await?;
    dao.acquire_lock(&installed_by(config)).await?;
    let result = dao.find_applied_migrations().await;
    release_quietly(dao).await;

    let mut service = MigrationInfoService::new(target, config.allow_out_of_order);
    service.refresh(&resolved, &result?);
    Ok(validation_error(&service, false))
}

/// First discrepancy between the merged view's two halves, if any.
///
/// With `pending_or_future` set (the Migrate pre-check), entries that the
/// current run is about to apply are tolerated; entries that cannot run
/// because out-of-order execution is disabled still fail.
pub(crate) fn validation_error(
    service: &MigrationInfoService,
    pending_or_future: bool,
) -> Option<String> {
    let target = service.target();

    for info in service.all() {
        match (&info.resolved, &info.applied) {
            (None, Some(applied)) => {
                if !applied.migration_type.is_synthetic() {
                    return Some(format!(
                        "Detected applied migration not resolved locally: {}",
                        info.version
                    ));
                }
            }
            (Some(_), None) => {
                if info.version <= *target
                    && (!pending_or_future || info.state == MigrationState::Ignored)
                {
                    return Some(format!(
                        "Detected resolved migration not applied: {}",
                        info.version
                    ));
                }
            }
            (Some(resolved), Some(applied)) => {
                if applied.migration_type.is_synthetic() {
                    continue;
                }
                if let (Some(a), Some(r)) = (applied.checksum, resolved.checksum) {
                    if a != r {
                        return Some(format!(
                            "Migration checksum mismatch for version {}: applied={a}, resolved={r}",
                            info.version
                        ));
                    }
                }
                if applied.description != resolved.description {
                    return Some(format!(
                        "Migration description mismatch for version {}: applied={}, resolved={}",
                        info.version, applied.description, resolved.description
                    ));
                }
                if applied.migration_type != resolved.migration_type {
                    return Some(format!(
                        "Migration type mismatch for version {}: applied={}, resolved={}",
                        info.version, applied.migration_type, resolved.migration_type
                    ));
                }
            }
            (None, None) => {}
        }
    }
    None
}
