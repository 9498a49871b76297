//! Session trait: the boundary between the engine and the cluster driver.

use crate::error::{DbError, DbResult};
use crate::value::Row;
use async_trait::async_trait;
use std::time::Duration;

/// A live connection to the target cluster.
///
/// The engine only ever issues synchronous-looking request/response calls;
/// connection management, load balancing and retries below this line belong
/// to the driver. Implementations must be Send + Sync.
#[async_trait]
pub trait Session: Send + Sync {
    /// Execute a statement, discarding any result rows.
    async fn execute(&self, cql: &str) -> DbResult<()>;

    /// Execute a statement and return its result rows.
    async fn query(&self, cql: &str) -> DbResult<Vec<Row>>;

    /// Execute a lightweight-transaction statement (`... IF NOT EXISTS` /
    /// `IF EXISTS`), returning whether it was applied.
    async fn execute_conditional(&self, cql: &str) -> DbResult<bool>;

    /// Keyspace this session is logged into, if any.
    fn keyspace(&self) -> Option<&str>;
}

/// Run `session.execute` under a wall-clock cap.
pub async fn execute_with_timeout(
    session: &dyn Session,
    cql: &str,
    timeout: Duration,
) -> DbResult<()> {
    match tokio::time::timeout(timeout, session.execute(cql)).await {
        Ok(result) => result,
        Err(_) => Err(timeout_error(cql, timeout)),
    }
}

/// Run `session.query` under a wall-clock cap.
pub async fn query_with_timeout(
    session: &dyn Session,
    cql: &str,
    timeout: Duration,
) -> DbResult<Vec<Row>> {
    match tokio::time::timeout(timeout, session.query(cql)).await {
        Ok(result) => result,
        Err(_) => Err(timeout_error(cql, timeout)),
    }
}

/// Run `session.execute_conditional` under a wall-clock cap.
pub async fn execute_conditional_with_timeout(
    session: &dyn Session,
    cql: &str,
    timeout: Duration,
) -> DbResult<bool> {
    match tokio::time::timeout(timeout, session.execute_conditional(cql)).await {
        Ok(result) => result,
        Err(_) => Err(timeout_error(cql, timeout)),
    }
}

fn timeout_error(cql: &str, timeout: Duration) -> DbError {
    DbError::StatementTimeout {
        statement: crate::util::truncate_statement(cql),
        seconds: timeout.as_secs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Row;

    struct SlowSession;

    #[async_trait]
    impl Session for SlowSession {
        async fn execute(&self, _cql: &str) -> DbResult<()> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }

        async fn query(&self, _cql: &str) -> DbResult<Vec<Row>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }

        async fn execute_conditional(&self, _cql: &str) -> DbResult<bool> {
            Ok(true)
        }

        fn keyspace(&self) -> Option<&str> {
            None
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_times_out() {
        let session = SlowSession;
        let err = execute_with_timeout(&session, "SELECT 1", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::StatementTimeout { seconds: 2, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_times_out() {
        let session = SlowSession;
        let err = query_with_timeout(&session, "SELECT 1", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::StatementTimeout { seconds: 5, .. }
        ));
    }
}
