//! The four engine commands: Initialize, Baseline, Migrate, Validate.

use cqm_core::MigrationConfig;
use cqm_ledger::SchemaVersionDao;

pub mod baseline;
pub mod initialize;
pub mod migrate;
pub mod validate;

pub use baseline::baseline;
pub use initialize::initialize;
pub use migrate::migrate;
pub use validate::validate;

/// Identity recorded in the ledger's `installed_by` column.
pub(crate) fn installed_by(config: &MigrationConfig) -> String {
    config
        .installed_by
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_else(|_| "cqlmigrate".to_string())
        })
}

/// Release the advisory lock without masking the command's own result.
pub(crate) async fn release_quietly(dao: &dyn SchemaVersionDao) {
    if let Err(e) = dao.release_lock().await {
        log::warn!("failed to release migration lock: {e}");
    }
}
