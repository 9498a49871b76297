//! Session backend over the scylla driver.

use crate::error::{DbError, DbResult};
use crate::session::Session;
use crate::util::truncate_statement;
use crate::value::{CqlValue, Row};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use scylla::client::session::Session as DriverSession;
use scylla::client::session_builder::SessionBuilder;
use scylla::value::CqlValue as DriverValue;
use scylla::value::Row as DriverRow;

/// Connection parameters for [`connect`].
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub contact_points: Vec<String>,
    pub port: u16,
    pub keyspace: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// A [`Session`] backed by a scylla driver session.
///
/// The wrapper owns the driver session; dropping it releases the connection
/// pool. Callers embedding an externally owned session should keep ownership
/// on their side and pass `&dyn Session` into the engine instead.
pub struct ScyllaSession {
    inner: DriverSession,
    keyspace: Option<String>,
}

/// Build a driver session from connection options.
pub async fn connect(options: &ConnectOptions) -> DbResult<ScyllaSession> {
    let mut builder = SessionBuilder::new();
    for point in &options.contact_points {
        builder = builder.known_node(format!("{}:{}", point, options.port));
    }
    if let (Some(user), Some(pass)) = (&options.username, &options.password) {
        builder = builder.user(user, pass);
    }

    let session = builder.build().await.map_err(|e| DbError::ConnectionFailed {
        message: e.to_string(),
    })?;

    if let Some(ks) = &options.keyspace {
        session
            .use_keyspace(ks, false)
            .await
            .map_err(|e| DbError::ConnectionFailed {
                message: format!("use_keyspace {ks}: {e}"),
            })?;
    }

    Ok(ScyllaSession {
        inner: session,
        keyspace: options.keyspace.clone(),
    })
}

impl ScyllaSession {
    async fn run(&self, cql: &str) -> DbResult<scylla::response::query_result::QueryResult> {
        self.inner
            .query_unpaged(cql, ())
            .await
            .map_err(|e| DbError::StoreFailure {
                statement: truncate_statement(cql),
                cause: e.to_string(),
            })
    }

    fn decode_rows(
        cql: &str,
        result: scylla::response::query_result::QueryResult,
    ) -> DbResult<Vec<Row>> {
        let rows_result = result
            .into_rows_result()
            .map_err(|e| DbError::StoreFailure {
                statement: truncate_statement(cql),
                cause: e.to_string(),
            })?;

        let mut out = Vec::new();
        let iter = rows_result
            .rows::<DriverRow>()
            .map_err(|e| DbError::StoreFailure {
                statement: truncate_statement(cql),
                cause: e.to_string(),
            })?;
        for row in iter {
            let row = row.map_err(|e| DbError::StoreFailure {
                statement: truncate_statement(cql),
                cause: e.to_string(),
            })?;
            out.push(row.columns.into_iter().map(convert_value).collect());
        }
        Ok(out)
    }
}

#[async_trait]
impl Session for ScyllaSession {
    async fn execute(&self, cql: &str) -> DbResult<()> {
        self.run(cql).await?;
        Ok(())
    }

    async fn query(&self, cql: &str) -> DbResult<Vec<Row>> {
        let result = self.run(cql).await?;
        Self::decode_rows(cql, result)
    }

    async fn execute_conditional(&self, cql: &str) -> DbResult<bool> {
        let result = self.run(cql).await?;
        let rows = Self::decode_rows(cql, result)?;
        // LWT results carry an `[applied]` boolean as the first column
        let applied = rows
            .first()
            .and_then(|row| row.first())
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        Ok(applied)
    }

    fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }
}

/// Map a driver value into the engine's value model.
fn convert_value(value: Option<DriverValue>) -> CqlValue {
    match value {
        Some(DriverValue::Int(n)) => CqlValue::Int(n),
        Some(DriverValue::BigInt(n)) => CqlValue::BigInt(n),
        Some(DriverValue::Counter(c)) => CqlValue::BigInt(c.0),
        Some(DriverValue::Text(s)) => CqlValue::Text(s),
        Some(DriverValue::Ascii(s)) => CqlValue::Text(s),
        Some(DriverValue::Boolean(b)) => CqlValue::Boolean(b),
        Some(DriverValue::Timestamp(ts)) => match Utc.timestamp_millis_opt(ts.0).single() {
            Some(dt) => CqlValue::Timestamp(dt),
            None => CqlValue::Null,
        },
        _ => CqlValue::Null,
    }
}
