//! In-memory ledger used by unit tests and dry runs.

use crate::dao::SchemaVersionDao;
use crate::error::{LedgerError, LedgerResult};
use crate::lock::LockPolicy;
use async_trait::async_trait;
use cqm_core::{AppliedMigration, MigrationVersion};
use std::sync::Mutex;

/// A [`SchemaVersionDao`] backed by process memory.
///
/// Mirrors the observable behavior of the CQL DAO: version-ascending reads,
/// duplicate detection, dense version-rank recomputation, monotonic
/// installed ranks, and the advisory lock.
#[derive(Default)]
pub struct MemoryDao {
    state: Mutex<MemoryState>,
    lock_policy: LockPolicy,
}

#[derive(Default)]
struct MemoryState {
    rows: Vec<AppliedMigration>,
    next_rank: i32,
    locked: bool,
}

impl MemoryDao {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lock_policy(mut self, policy: LockPolicy) -> Self {
        self.lock_policy = policy;
        self
    }

    /// Snapshot of the current rows in insertion order, for assertions.
    pub fn rows(&self) -> Vec<AppliedMigration> {
        self.state.lock().expect("memory ledger poisoned").rows.clone()
    }

    /// Whether the advisory lock is currently held.
    pub fn is_locked(&self) -> bool {
        self.state.lock().expect("memory ledger poisoned").locked
    }

    fn recompute_version_ranks(rows: &mut [AppliedMigration]) {
        let mut order: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.success)
            .map(|(i, _)| i)
            .collect();
        order.sort_by(|&a, &b| rows[a].version.cmp(&rows[b].version));
        for (position, idx) in order.into_iter().enumerate() {
            rows[idx].version_rank = (position + 1) as i32;
        }
    }
}

#[async_trait]
impl SchemaVersionDao for MemoryDao {
    async fn ensure_tables(&self) -> LedgerResult<()> {
        Ok(())
    }

    async fn allocate_installed_rank(&self) -> LedgerResult<i32> {
        let mut state = self.state.lock().expect("memory ledger poisoned");
        state.next_rank += 1;
        Ok(state.next_rank)
    }

    async fn find_applied_migrations(&self) -> LedgerResult<Vec<AppliedMigration>> {
        let state = self.state.lock().expect("memory ledger poisoned");
        let mut rows = state.rows.clone();
        rows.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(rows)
    }

    async fn has_applied_migration(&self, version: &MigrationVersion) -> LedgerResult<bool> {
        let state = self.state.lock().expect("memory ledger poisoned");
        Ok(state.rows.iter().any(|r| &r.version == version))
    }

    async fn add_applied_migration(&self, applied: &AppliedMigration) -> LedgerResult<()> {
        let mut state = self.state.lock().expect("memory ledger poisoned");
        if state.rows.iter().any(|r| r.version == applied.version) {
            return Err(LedgerError::DuplicateVersion {
                version: applied.version.to_string(),
            });
        }
        state.rows.push(applied.clone());
        if applied.success {
            Self::recompute_version_ranks(&mut state.rows);
        }
        Ok(())
    }

    async fn mark_success(
        &self,
        installed_rank: i32,
        execution_time_ms: i64,
    ) -> LedgerResult<()> {
        let mut state = self.state.lock().expect("memory ledger poisoned");
        let Some(row) = state
            .rows
            .iter_mut()
            .find(|r| r.installed_rank == installed_rank)
        else {
            return Err(LedgerError::RowDecode {
                column: "installed_rank".to_string(),
                detail: format!("no row with installed_rank {installed_rank}"),
            });
        };
        row.success = true;
        row.execution_time_ms = execution_time_ms;
        Self::recompute_version_ranks(&mut state.rows);
        Ok(())
    }

    async fn delete_applied(&self, version: &MigrationVersion) -> LedgerResult<bool> {
        let mut state = self.state.lock().expect("memory ledger poisoned");
        let before = state.rows.len();
        state.rows.retain(|r| &r.version != version);
        let removed = state.rows.len() < before;
        if removed {
            Self::recompute_version_ranks(&mut state.rows);
        }
        Ok(removed)
    }

    async fn acquire_lock(&self, _owner: &str) -> LedgerResult<()> {
        for attempt in 0..self.lock_policy.max_attempts {
            {
                let mut state = self.state.lock().expect("memory ledger poisoned");
                if !state.locked {
                    state.locked = true;
                    return Ok(());
                }
            }
            tokio::time::sleep(self.lock_policy.delay_for(attempt)).await;
        }
        Err(LedgerError::LockUnavailable {
            attempts: self.lock_policy.max_attempts,
        })
    }

    async fn release_lock(&self) -> LedgerResult<()> {
        let mut state = self.state.lock().expect("memory ledger poisoned");
        state.locked = false;
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
