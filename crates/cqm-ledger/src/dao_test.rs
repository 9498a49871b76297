use super::*;
use chrono::{TimeZone, Utc};
use cqm_core::migration::MigrationType;
use cqm_db::{CqlValue, DbResult, Row};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Session double that records statements and serves canned rows keyed by a
/// substring of the query text.
#[derive(Default)]
struct FakeSession {
    executed: Mutex<Vec<String>>,
    canned_rows: Mutex<Vec<(String, Vec<Row>)>>,
    conditional: Mutex<VecDeque<bool>>,
}

impl FakeSession {
    fn statements(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    fn serve(&self, needle: &str, rows: Vec<Row>) {
        self.canned_rows
            .lock()
            .unwrap()
            .push((needle.to_string(), rows));
    }

    fn push_conditional(&self, applied: bool) {
        self.conditional.lock().unwrap().push_back(applied);
    }
}

#[async_trait]
impl cqm_db::Session for FakeSession {
    async fn execute(&self, cql: &str) -> DbResult<()> {
        self.executed.lock().unwrap().push(cql.to_string());
        Ok(())
    }

    async fn query(&self, cql: &str) -> DbResult<Vec<Row>> {
        self.executed.lock().unwrap().push(cql.to_string());
        let canned = self.canned_rows.lock().unwrap();
        for (needle, rows) in canned.iter() {
            if cql.contains(needle) {
                return Ok(rows.clone());
            }
        }
        Ok(Vec::new())
    }

    async fn execute_conditional(&self, cql: &str) -> DbResult<bool> {
        self.executed.lock().unwrap().push(cql.to_string());
        Ok(self.conditional.lock().unwrap().pop_front().unwrap_or(true))
    }

    fn keyspace(&self) -> Option<&str> {
        Some("ks")
    }
}

fn config() -> cqm_core::MigrationConfig {
    cqm_core::MigrationConfig {
        keyspace: "ks".to_string(),
        ..Default::default()
    }
}

fn dao_with(session: Arc<FakeSession>) -> CqlSchemaVersionDao {
    CqlSchemaVersionDao::new(session, &config())
}

fn ledger_row(v: &str, installed_rank: i32, success: bool) -> Row {
    vec![
        CqlValue::Int(0),
        CqlValue::Int(installed_rank),
        CqlValue::Text(v.to_string()),
        CqlValue::Text(format!("migration {v}")),
        CqlValue::Text("CQL".to_string()),
        CqlValue::Text(format!("V{v}__migration.cql")),
        CqlValue::Int(99),
        CqlValue::Timestamp(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()),
        CqlValue::Text("test".to_string()),
        CqlValue::Int(10),
        CqlValue::Boolean(success),
    ]
}

fn lock_row() -> Row {
    vec![
        CqlValue::Null,
        CqlValue::Int(0),
        CqlValue::Text("?".to_string()),
        CqlValue::Text("lock".to_string()),
        CqlValue::Null,
        CqlValue::Null,
        CqlValue::Null,
        CqlValue::Null,
        CqlValue::Text("other".to_string()),
        CqlValue::Null,
        CqlValue::Boolean(false),
    ]
}

fn sample_applied(v: &str, installed_rank: i32, success: bool) -> AppliedMigration {
    AppliedMigration {
        version_rank: 0,
        installed_rank,
        version: MigrationVersion::parse(v).unwrap(),
        description: format!("migration {v}"),
        migration_type: MigrationType::Cql,
        script: format!("V{v}__migration.cql"),
        checksum: Some(99),
        installed_on: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        installed_by: "test".to_string(),
        execution_time_ms: 0,
        success,
    }
}

#[tokio::test]
async fn test_ensure_tables_is_idempotent_ddl() {
    let session = Arc::new(FakeSession::default());
    let dao = dao_with(session.clone());
    dao.ensure_tables().await.unwrap();

    let statements = session.statements();
    assert_eq!(statements.len(), 3);
    assert!(statements[0].contains("CREATE TABLE IF NOT EXISTS ks.cassandra_migration_version "));
    assert!(statements[1].contains("CREATE INDEX IF NOT EXISTS"));
    assert!(statements[2].contains("ks.cassandra_migration_version_counts"));
}

#[tokio::test]
async fn test_allocate_installed_rank_increments_then_reads() {
    let session = Arc::new(FakeSession::default());
    session.serve("SELECT count FROM", vec![vec![CqlValue::BigInt(7)]]);
    let dao = dao_with(session.clone());

    let rank = dao.allocate_installed_rank().await.unwrap();
    assert_eq!(rank, 7);

    let statements = session.statements();
    assert!(statements[0].contains("SET count = count + 1"));
    assert!(statements[0].contains("name = 'installed_rank'"));
}

#[tokio::test]
async fn test_find_applied_excludes_lock_and_sorts() {
    let session = Arc::new(FakeSession::default());
    session.serve(
        "SELECT version_rank",
        vec![ledger_row("2", 2, true), lock_row(), ledger_row("1.5", 3, true)],
    );
    let dao = dao_with(session);

    let applied = dao.find_applied_migrations().await.unwrap();
    let versions: Vec<String> = applied.iter().map(|a| a.version.to_string()).collect();
    assert_eq!(versions, vec!["1.5", "2"]);
}

#[tokio::test]
async fn test_add_applied_builds_insert_with_literals() {
    let session = Arc::new(FakeSession::default());
    let dao = dao_with(session.clone());

    dao.add_applied_migration(&sample_applied("1.2", 4, false))
        .await
        .unwrap();

    let insert = session
        .statements()
        .into_iter()
        .find(|s| s.starts_with("INSERT INTO ks.cassandra_migration_version "))
        .expect("no insert issued");
    assert!(insert.contains("'1.2'"));
    assert!(insert.contains("'CQL'"));
    assert!(insert.contains("'V1.2__migration.cql'"));
    assert!(insert.contains("99"));
    assert!(insert.ends_with("false)"));
}

#[tokio::test]
async fn test_add_applied_null_checksum() {
    let session = Arc::new(FakeSession::default());
    let dao = dao_with(session.clone());

    let mut applied = sample_applied("1", 1, false);
    applied.checksum = None;
    dao.add_applied_migration(&applied).await.unwrap();

    let insert = session
        .statements()
        .into_iter()
        .find(|s| s.starts_with("INSERT INTO"))
        .unwrap();
    assert!(insert.contains("null"));
}

#[tokio::test]
async fn test_add_applied_rejects_existing_version() {
    let session = Arc::new(FakeSession::default());
    session.serve("SELECT version_rank", vec![ledger_row("1", 1, true)]);
    let dao = dao_with(session);

    let err = dao
        .add_applied_migration(&sample_applied("1", 2, true))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateVersion { .. }));
}

#[tokio::test]
async fn test_mark_success_updates_row_and_ranks() {
    let session = Arc::new(FakeSession::default());
    // After the update the ledger holds two successful rows, ranks stale at 0
    session.serve(
        "SELECT version_rank",
        vec![ledger_row("1", 1, true), ledger_row("2", 2, true)],
    );
    let dao = dao_with(session.clone());

    dao.mark_success(2, 321).await.unwrap();

    let statements = session.statements();
    assert!(statements[0]
        .contains("SET success = true, execution_time = 321 WHERE installed_rank = 2"));
    // Dense recompute touches both stale ranks
    assert!(statements
        .iter()
        .any(|s| s.contains("SET version_rank = 1 WHERE installed_rank = 1")));
    assert!(statements
        .iter()
        .any(|s| s.contains("SET version_rank = 2 WHERE installed_rank = 2")));
}

#[tokio::test(start_paused = true)]
async fn test_acquire_lock_retries_until_won() {
    let session = Arc::new(FakeSession::default());
    session.push_conditional(false);
    session.push_conditional(false);
    session.push_conditional(true);
    let dao = dao_with(session.clone());

    dao.acquire_lock("me").await.unwrap();

    let inserts: Vec<String> = session
        .statements()
        .into_iter()
        .filter(|s| s.contains("IF NOT EXISTS"))
        .collect();
    assert_eq!(inserts.len(), 3);
    assert!(inserts[0].contains("VALUES (0, '?', 'lock', 'me', false)"));
}

#[tokio::test(start_paused = true)]
async fn test_acquire_lock_gives_up() {
    let session = Arc::new(FakeSession::default());
    for _ in 0..5 {
        session.push_conditional(false);
    }
    let dao = dao_with(session).with_lock_policy(LockPolicy {
        max_attempts: 4,
        ..Default::default()
    });

    let err = dao.acquire_lock("me").await.unwrap_err();
    assert!(matches!(err, LedgerError::LockUnavailable { attempts: 4 }));
}

#[tokio::test]
async fn test_release_lock_deletes_lock_row() {
    let session = Arc::new(FakeSession::default());
    let dao = dao_with(session.clone());
    dao.release_lock().await.unwrap();

    let statements = session.statements();
    assert_eq!(
        statements[0],
        "DELETE FROM ks.cassandra_migration_version WHERE installed_rank = 0"
    );
}
