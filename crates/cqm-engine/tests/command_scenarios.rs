//! End-to-end command scenarios against the in-memory ledger and a
//! recording session.

use async_trait::async_trait;
use cqm_core::checksum::compute_checksum;
use cqm_core::migration::MigrationType;
use cqm_core::{AppliedMigration, MigrationConfig, MigrationVersion};
use cqm_db::{DbError, DbResult, Row, Session};
use cqm_engine::commands::{baseline, initialize, migrate, validate};
use cqm_engine::resolver::code::{CodeMigration, CodeMigrationResolver};
use cqm_engine::{CqlMigrationResolver, EngineError, FileSystemScanner};
use cqm_ledger::{MemoryDao, SchemaVersionDao};
use chrono::Utc;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Session double: records every statement, optionally failing those that
/// contain a marker string.
#[derive(Default)]
struct RecordingSession {
    statements: Mutex<Vec<String>>,
    fail_marker: Option<String>,
}

impl RecordingSession {
    fn failing_on(marker: &str) -> Self {
        Self {
            statements: Mutex::new(Vec::new()),
            fail_marker: Some(marker.to_string()),
        }
    }

    fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl Session for RecordingSession {
    async fn execute(&self, cql: &str) -> DbResult<()> {
        self.statements.lock().unwrap().push(cql.to_string());
        if let Some(marker) = &self.fail_marker {
            if cql.contains(marker) {
                return Err(DbError::StoreFailure {
                    statement: cql.to_string(),
                    cause: "injected failure".to_string(),
                });
            }
        }
        Ok(())
    }

    async fn query(&self, _cql: &str) -> DbResult<Vec<Row>> {
        Ok(Vec::new())
    }

    async fn execute_conditional(&self, _cql: &str) -> DbResult<bool> {
        Ok(true)
    }

    fn keyspace(&self) -> Option<&str> {
        Some("ks")
    }
}

fn write(dir: &Path, name: &str, content: &str) {
    let root = dir.join("db/migration");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join(name), content).unwrap();
}

fn config() -> MigrationConfig {
    MigrationConfig {
        keyspace: "ks".to_string(),
        installed_by: Some("tester".to_string()),
        ..Default::default()
    }
}

fn resolver_for(dir: &Path) -> CqlMigrationResolver {
    CqlMigrationResolver::new(
        Arc::new(FileSystemScanner::new(dir)),
        vec!["db/migration".to_string()],
        "utf-8".to_string(),
    )
}

fn version(s: &str) -> MigrationVersion {
    MigrationVersion::parse(s).unwrap()
}

#[tokio::test]
async fn test_fresh_apply() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "V1__init.cql", "CREATE TABLE t (id int PRIMARY KEY);");
    write(dir.path(), "V2__add_col.cql", "ALTER TABLE t ADD v text;");

    let session = RecordingSession::default();
    let dao = MemoryDao::new();
    let resolver = resolver_for(dir.path());
    let config = config();

    let count = migrate(&session, &dao, &resolver, &config).await.unwrap();
    assert_eq!(count, 2);

    let rows = dao.find_applied_migrations().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.success));
    assert_eq!(rows[0].version, version("1"));
    assert_eq!(rows[1].version, version("2"));
    assert_eq!(rows[0].installed_by, "tester");
    assert!(rows[0].installed_rank < rows[1].installed_rank);
    assert_eq!(rows[0].version_rank, 1);
    assert_eq!(rows[1].version_rank, 2);
    assert!(!dao.is_locked());

    // The user statements reached the session in script order
    let statements = session.statements();
    assert_eq!(
        statements,
        vec![
            "CREATE TABLE t (id int PRIMARY KEY)",
            "ALTER TABLE t ADD v text"
        ]
    );

    // Migrate is idempotent and leaves nothing for validate
    let again = migrate(&session, &dao, &resolver, &config).await.unwrap();
    assert_eq!(again, 0);
    assert_eq!(
        validate(&dao, &resolver, &config).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_empty_ledger_and_empty_resolved_set() {
    let dir = tempfile::tempdir().unwrap();
    let session = RecordingSession::default();
    let dao = MemoryDao::new();
    let resolver = resolver_for(dir.path());
    let config = config();

    assert_eq!(migrate(&session, &dao, &resolver, &config).await.unwrap(), 0);
    assert_eq!(validate(&dao, &resolver, &config).await.unwrap(), None);
}

#[tokio::test]
async fn test_target_empty_applies_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "V1__init.cql", "SELECT 1;");

    let session = RecordingSession::default();
    let dao = MemoryDao::new();
    let resolver = resolver_for(dir.path());
    let config = MigrationConfig {
        target: "empty".to_string(),
        ..config()
    };

    assert_eq!(migrate(&session, &dao, &resolver, &config).await.unwrap(), 0);
    assert!(dao.find_applied_migrations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_target_bounds_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "V1__a.cql", "SELECT 1;");
    write(dir.path(), "V2__b.cql", "SELECT 2;");
    write(dir.path(), "V3__c.cql", "SELECT 3;");

    let session = RecordingSession::default();
    let dao = MemoryDao::new();
    let resolver = resolver_for(dir.path());
    let config = MigrationConfig {
        target: "2".to_string(),
        ..config()
    };

    assert_eq!(migrate(&session, &dao, &resolver, &config).await.unwrap(), 2);
    assert!(!dao.has_applied_migration(&version("3")).await.unwrap());
}

#[tokio::test]
async fn test_out_of_order_blocked_then_allowed() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "V1__a.cql", "SELECT 1;");
    write(dir.path(), "V3__c.cql", "SELECT 3;");

    let session = RecordingSession::default();
    let dao = MemoryDao::new();
    let config = config();

    assert_eq!(
        migrate(&session, &dao, &resolver_for(dir.path()), &config)
            .await
            .unwrap(),
        2
    );

    // Version 2 arrives late
    write(dir.path(), "V2__b.cql", "SELECT 2;");
    let resolver = resolver_for(dir.path());

    let err = migrate(&session, &dao, &resolver, &config).await.unwrap_err();
    match err {
        EngineError::ValidationFailed { detail } => {
            assert_eq!(detail, "Detected resolved migration not applied: 2");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        validate(&dao, &resolver, &config).await.unwrap(),
        Some("Detected resolved migration not applied: 2".to_string())
    );

    let relaxed = MigrationConfig {
        allow_out_of_order: true,
        ..config
    };
    assert_eq!(migrate(&session, &dao, &resolver, &relaxed).await.unwrap(), 1);

    let rows = dao.find_applied_migrations().await.unwrap();
    let ranks: Vec<(String, i32)> = rows
        .iter()
        .map(|r| (r.version.to_string(), r.version_rank))
        .collect();
    assert_eq!(
        ranks,
        vec![
            ("1".to_string(), 1),
            ("2".to_string(), 2),
            ("3".to_string(), 3)
        ]
    );
    assert_eq!(validate(&dao, &resolver, &relaxed).await.unwrap(), None);
}

#[tokio::test]
async fn test_checksum_drift_detected() {
    let dir = tempfile::tempdir().unwrap();
    let content = "CREATE TABLE t (id int PRIMARY KEY);";
    write(dir.path(), "V1__init.cql", content);

    let resolved_checksum = compute_checksum(content);
    assert_ne!(resolved_checksum, 42);

    let dao = MemoryDao::new();
    dao.add_applied_migration(&AppliedMigration {
        version_rank: 1,
        installed_rank: 1,
        version: version("1"),
        description: "init".to_string(),
        migration_type: MigrationType::Cql,
        script: "V1__init.cql".to_string(),
        checksum: Some(42),
        installed_on: Utc::now(),
        installed_by: "tester".to_string(),
        execution_time_ms: 3,
        success: true,
    })
    .await
    .unwrap();

    let resolver = resolver_for(dir.path());
    let config = config();
    assert_eq!(
        validate(&dao, &resolver, &config).await.unwrap(),
        Some(format!(
            "Migration checksum mismatch for version 1: applied=42, resolved={resolved_checksum}"
        ))
    );
}

#[tokio::test]
async fn test_applied_but_not_resolved_detected() {
    let dir = tempfile::tempdir().unwrap();
    let dao = MemoryDao::new();
    dao.add_applied_migration(&AppliedMigration {
        version_rank: 1,
        installed_rank: 1,
        version: version("7"),
        description: "gone".to_string(),
        migration_type: MigrationType::Cql,
        script: "V7__gone.cql".to_string(),
        checksum: Some(1),
        installed_on: Utc::now(),
        installed_by: "tester".to_string(),
        execution_time_ms: 3,
        success: true,
    })
    .await
    .unwrap();

    let resolver = resolver_for(dir.path());
    assert_eq!(
        validate(&dao, &resolver, &config()).await.unwrap(),
        Some("Detected applied migration not resolved locally: 7".to_string())
    );
}

#[tokio::test]
async fn test_one_sided_null_checksum_tolerated() {
    struct Unit;

    #[async_trait]
    impl CodeMigration for Unit {
        fn version(&self) -> &str {
            "1"
        }
        fn description(&self) -> &str {
            "seed accounts"
        }
        fn name(&self) -> &str {
            "migrations.SeedAccounts"
        }
        async fn execute(&self, _session: &dyn Session) -> Result<(), EngineError> {
            Ok(())
        }
    }

    let dao = MemoryDao::new();
    dao.add_applied_migration(&AppliedMigration {
        version_rank: 1,
        installed_rank: 1,
        version: version("1"),
        description: "seed accounts".to_string(),
        migration_type: MigrationType::JavaDriver,
        script: "migrations.SeedAccounts".to_string(),
        checksum: Some(5),
        installed_on: Utc::now(),
        installed_by: "tester".to_string(),
        execution_time_ms: 3,
        success: true,
    })
    .await
    .unwrap();

    let resolver = CodeMigrationResolver::new(vec![Arc::new(Unit)]);
    assert_eq!(validate(&dao, &resolver, &config()).await.unwrap(), None);
}

#[tokio::test]
async fn test_baseline_fresh_then_refused_above() {
    let dao = MemoryDao::new();
    let config = MigrationConfig {
        baseline_version: "3".to_string(),
        ..config()
    };

    let baselined = baseline(&dao, &config).await.unwrap();
    assert_eq!(baselined, version("3"));

    let rows = dao.find_applied_migrations().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].migration_type, MigrationType::Baseline);
    assert_eq!(rows[0].description, "<< Cassandra Baseline >>");
    assert!(rows[0].success);

    // Same version again is a no-op
    assert_eq!(baseline(&dao, &config).await.unwrap(), version("3"));
    assert_eq!(dao.find_applied_migrations().await.unwrap().len(), 1);
    assert!(!dao.is_locked());
}

#[tokio::test]
async fn test_baseline_refused_when_ledger_is_past_it() {
    let dao = MemoryDao::new();
    dao.add_applied_migration(&AppliedMigration {
        version_rank: 1,
        installed_rank: 1,
        version: version("5"),
        description: "five".to_string(),
        migration_type: MigrationType::Cql,
        script: "V5__five.cql".to_string(),
        checksum: Some(1),
        installed_on: Utc::now(),
        installed_by: "tester".to_string(),
        execution_time_ms: 3,
        success: true,
    })
    .await
    .unwrap();

    let config = MigrationConfig {
        baseline_version: "3".to_string(),
        ..config()
    };
    let err = baseline(&dao, &config).await.unwrap_err();
    assert!(matches!(err, EngineError::BaselineNotAllowed { .. }));
    assert!(!dao.is_locked());
}

#[tokio::test]
async fn test_baseline_hides_older_migrations_from_migrate() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "V1__old.cql", "SELECT 1;");
    write(dir.path(), "V2__new.cql", "SELECT 2;");

    let dao = MemoryDao::new();
    let config = config();
    baseline(&dao, &config).await.unwrap();

    let session = RecordingSession::default();
    let count = migrate(&session, &dao, &resolver_for(dir.path()), &config)
        .await
        .unwrap();
    // Version 1 sits at the baseline and is assumed applied externally
    assert_eq!(count, 1);
    assert_eq!(session.statements(), vec!["SELECT 2"]);
}

#[tokio::test]
async fn test_failure_halts_progress_and_rerun_repeats() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "V1__ok.cql", "CREATE TABLE a (id int PRIMARY KEY);");
    write(dir.path(), "V2__bad.cql", "CREATE BOOM;");
    write(dir.path(), "V3__never.cql", "CREATE TABLE c (id int PRIMARY KEY);");

    let session = RecordingSession::failing_on("BOOM");
    let dao = MemoryDao::new();
    let resolver = resolver_for(dir.path());
    let config = config();

    let err = migrate(&session, &dao, &resolver, &config).await.unwrap_err();
    match &err {
        EngineError::MigrationFailed { version, .. } => assert_eq!(version, "2"),
        other => panic!("unexpected error: {other}"),
    }

    let rows = dao.find_applied_migrations().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].success);
    assert!(!rows[1].success);
    assert!(!dao.has_applied_migration(&version("3")).await.unwrap());
    assert!(!dao.is_locked());

    // Re-running without edits reports the same failing version
    let again = migrate(&session, &dao, &resolver, &config).await.unwrap_err();
    match again {
        EngineError::MigrationFailed { version, .. } => assert_eq!(version, "2"),
        other => panic!("unexpected error: {other}"),
    }

    // Operator repair: drop the failed row, then the run completes
    assert!(dao.delete_applied(&version("2")).await.unwrap());
    let session_ok = RecordingSession::default();
    write(dir.path(), "V2__bad.cql", "CREATE TABLE b (id int PRIMARY KEY);");
    let count = migrate(&session_ok, &dao, &resolver_for(dir.path()), &config)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_initialize_seeds_schema_marker_once() {
    let dao = MemoryDao::new();
    let config = config();

    initialize(&dao, &config).await.unwrap();
    initialize(&dao, &config).await.unwrap();

    let rows = dao.find_applied_migrations().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].version, version("0"));
    assert_eq!(rows[0].migration_type, MigrationType::Schema);
    assert_eq!(rows[0].script, "ks");
    assert!(rows[0].success);
}

#[tokio::test]
async fn test_initialized_ledger_validates_and_migrates_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "V1__init.cql", "SELECT 1;");

    let dao = MemoryDao::new();
    let config = config();
    initialize(&dao, &config).await.unwrap();

    let session = RecordingSession::default();
    let resolver = resolver_for(dir.path());
    assert_eq!(migrate(&session, &dao, &resolver, &config).await.unwrap(), 1);
    assert_eq!(validate(&dao, &resolver, &config).await.unwrap(), None);
}
