//! Schema-version DAO: the durable ledger of applied migrations.

use crate::ddl;
use crate::error::{LedgerError, LedgerResult};
use crate::lock::LockPolicy;
use crate::row::{decode_applied, is_lock_row, LEDGER_COLUMNS};
use async_trait::async_trait;
use cqm_core::{AppliedMigration, MigrationConfig, MigrationVersion};
use cqm_db::session::{
    execute_conditional_with_timeout, execute_with_timeout, query_with_timeout,
};
use cqm_db::util::quote_literal;
use cqm_db::Session;
use std::sync::Arc;
use std::time::Duration;

/// Name of the counter row that issues installed ranks.
const INSTALLED_RANK_COUNTER: &str = "installed_rank";

/// Durable ledger operations.
///
/// Implemented over a live session by [`CqlSchemaVersionDao`] and in memory
/// by [`crate::MemoryDao`] for tests and dry runs.
#[async_trait]
pub trait SchemaVersionDao: Send + Sync {
    /// Create the ledger and counter tables if missing. Idempotent.
    async fn ensure_tables(&self) -> LedgerResult<()>;

    /// Increment the rank counter and return the new value.
    async fn allocate_installed_rank(&self) -> LedgerResult<i32>;

    /// All real ledger rows (lock row excluded), sorted by version ascending.
    async fn find_applied_migrations(&self) -> LedgerResult<Vec<AppliedMigration>>;

    /// Whether a row exists at this version.
    async fn has_applied_migration(&self, version: &MigrationVersion) -> LedgerResult<bool>;

    /// Insert a new ledger row. Fails with `DuplicateVersion` if a row at
    /// the same version already exists. Successful rows trigger a dense
    /// version-rank recompute.
    async fn add_applied_migration(&self, applied: &AppliedMigration) -> LedgerResult<()>;

    /// Flip a pending row to success, record its execution time, and
    /// recompute version ranks.
    async fn mark_success(
        &self,
        installed_rank: i32,
        execution_time_ms: i64,
    ) -> LedgerResult<()>;

    /// Remove the row at `version` (operator repair of a failed attempt).
    /// Returns whether a row was removed.
    async fn delete_applied(&self, version: &MigrationVersion) -> LedgerResult<bool>;

    /// Acquire the advisory lock, retrying per the lock policy.
    async fn acquire_lock(&self, owner: &str) -> LedgerResult<()>;

    /// Release the advisory lock.
    async fn release_lock(&self) -> LedgerResult<()>;
}

/// DAO over a live cluster session.
pub struct CqlSchemaVersionDao {
    session: Arc<dyn Session>,
    keyspace: String,
    table: String,
    counts_table: String,
    timeout: Duration,
    lock_policy: LockPolicy,
}

impl CqlSchemaVersionDao {
    pub fn new(session: Arc<dyn Session>, config: &MigrationConfig) -> Self {
        Self {
            session,
            keyspace: config.keyspace.clone(),
            table: config.table_name(),
            counts_table: config.counts_table_name(),
            timeout: config.timeout(),
            lock_policy: LockPolicy::default(),
        }
    }

    pub fn with_lock_policy(mut self, policy: LockPolicy) -> Self {
        self.lock_policy = policy;
        self
    }

    fn ledger(&self) -> String {
        format!("{}.{}", self.keyspace, self.table)
    }

    fn counts(&self) -> String {
        format!("{}.{}", self.keyspace, self.counts_table)
    }

    async fn execute(&self, cql: &str) -> LedgerResult<()> {
        execute_with_timeout(self.session.as_ref(), cql, self.timeout).await?;
        Ok(())
    }

    async fn query(&self, cql: &str) -> LedgerResult<Vec<cqm_db::Row>> {
        Ok(query_with_timeout(self.session.as_ref(), cql, self.timeout).await?)
    }

    /// Assign `1..n` to all successful rows in ascending version order,
    /// rewriting only ranks that changed.
    async fn update_version_ranks(&self) -> LedgerResult<()> {
        let mut successful: Vec<AppliedMigration> = self
            .find_applied_migrations()
            .await?
            .into_iter()
            .filter(|a| a.success)
            .collect();
        successful.sort_by(|a, b| a.version.cmp(&b.version));

        for (position, row) in successful.iter().enumerate() {
            let rank = (position + 1) as i32;
            if row.version_rank != rank {
                self.execute(&format!(
                    "UPDATE {} SET version_rank = {} WHERE installed_rank = {}",
                    self.ledger(),
                    rank,
                    row.installed_rank
                ))
                .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SchemaVersionDao for CqlSchemaVersionDao {
    async fn ensure_tables(&self) -> LedgerResult<()> {
        self.execute(&ddl::create_ledger_table(&self.keyspace, &self.table))
            .await?;
        self.execute(&ddl::create_version_rank_index(&self.keyspace, &self.table))
            .await?;
        self.execute(&ddl::create_counts_table(&self.keyspace, &self.counts_table))
            .await?;
        Ok(())
    }

    async fn allocate_installed_rank(&self) -> LedgerResult<i32> {
        self.execute(&format!(
            "UPDATE {} SET count = count + 1 WHERE name = {}",
            self.counts(),
            quote_literal(INSTALLED_RANK_COUNTER)
        ))
        .await?;

        let rows = self
            .query(&format!(
                "SELECT count FROM {} WHERE name = {}",
                self.counts(),
                quote_literal(INSTALLED_RANK_COUNTER)
            ))
            .await?;

        let value = rows
            .first()
            .and_then(|row| row.first())
            .and_then(|v| v.as_i64())
            .ok_or_else(|| LedgerError::RowDecode {
                column: "count".to_string(),
                detail: "counter read returned no value".to_string(),
            })?;
        Ok(value as i32)
    }

    async fn find_applied_migrations(&self) -> LedgerResult<Vec<AppliedMigration>> {
        let rows = self
            .query(&format!(
                "SELECT {} FROM {}",
                LEDGER_COLUMNS,
                self.ledger()
            ))
            .await?;

        let mut applied = Vec::with_capacity(rows.len());
        for row in &rows {
            if is_lock_row(row) {
                continue;
            }
            applied.push(decode_applied(row)?);
        }
        applied.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(applied)
    }

    async fn has_applied_migration(&self, version: &MigrationVersion) -> LedgerResult<bool> {
        let applied = self.find_applied_migrations().await?;
        Ok(applied.iter().any(|a| &a.version == version))
    }

    async fn add_applied_migration(&self, applied: &AppliedMigration) -> LedgerResult<()> {
        if self.has_applied_migration(&applied.version).await? {
            return Err(LedgerError::DuplicateVersion {
                version: applied.version.to_string(),
            });
        }

        let checksum = match applied.checksum {
            Some(c) => c.to_string(),
            None => "null".to_string(),
        };
        self.execute(&format!(
            "INSERT INTO {} (version_rank, installed_rank, version, description, type, \
             script, checksum, installed_on, installed_by, execution_time, success) \
             VALUES ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {})",
            self.ledger(),
            applied.version_rank,
            applied.installed_rank,
            quote_literal(&applied.version.table_value()),
            quote_literal(&applied.description),
            quote_literal(&applied.migration_type.to_string()),
            quote_literal(&applied.script),
            checksum,
            applied.installed_on.timestamp_millis(),
            quote_literal(&applied.installed_by),
            applied.execution_time_ms,
            applied.success
        ))
        .await?;

        if applied.success {
            self.update_version_ranks().await?;
        }
        Ok(())
    }

    async fn mark_success(
        &self,
        installed_rank: i32,
        execution_time_ms: i64,
    ) -> LedgerResult<()> {
        self.execute(&format!(
            "UPDATE {} SET success = true, execution_time = {} WHERE installed_rank = {}",
            self.ledger(),
            execution_time_ms,
            installed_rank
        ))
        .await?;
        self.update_version_ranks().await
    }

    async fn delete_applied(&self, version: &MigrationVersion) -> LedgerResult<bool> {
        let applied = self.find_applied_migrations().await?;
        let Some(row) = applied.iter().find(|a| &a.version == version) else {
            return Ok(false);
        };

        self.execute(&format!(
            "DELETE FROM {} WHERE installed_rank = {}",
            self.ledger(),
            row.installed_rank
        ))
        .await?;
        self.update_version_ranks().await?;
        Ok(true)
    }

    async fn acquire_lock(&self, owner: &str) -> LedgerResult<()> {
        let insert = format!(
            "INSERT INTO {} (installed_rank, version, description, installed_by, success) \
             VALUES (0, '?', 'lock', {}, false) IF NOT EXISTS",
            self.ledger(),
            quote_literal(owner)
        );

        for attempt in 0..self.lock_policy.max_attempts {
            let won = execute_conditional_with_timeout(
                self.session.as_ref(),
                &insert,
                self.timeout,
            )
            .await?;
            if won {
                return Ok(());
            }
            log::debug!(
                "migration lock busy, attempt {}/{}",
                attempt + 1,
                self.lock_policy.max_attempts
            );
            tokio::time::sleep(self.lock_policy.delay_for(attempt)).await;
        }

        Err(LedgerError::LockUnavailable {
            attempts: self.lock_policy.max_attempts,
        })
    }

    async fn release_lock(&self) -> LedgerResult<()> {
        self.execute(&format!(
            "DELETE FROM {} WHERE installed_rank = 0",
            self.ledger()
        ))
        .await
    }
}

#[cfg(test)]
#[path = "dao_test.rs"]
mod tests;
