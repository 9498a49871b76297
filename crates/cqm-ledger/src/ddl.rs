//! CQL DDL for the ledger and counter tables.
//!
//! The column set and types are wire-level: existing deployments read and
//! write these tables, so any change here is a breaking change.

/// `CREATE TABLE IF NOT EXISTS` for the schema-version ledger.
pub fn create_ledger_table(keyspace: &str, table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {keyspace}.{table} (\
         version_rank int, \
         installed_rank int, \
         version text, \
         description text, \
         type text, \
         script text, \
         checksum int, \
         installed_on timestamp, \
         installed_by text, \
         execution_time int, \
         success boolean, \
         PRIMARY KEY (installed_rank))"
    )
}

/// Secondary index supporting ordered reads by version rank.
pub fn create_version_rank_index(keyspace: &str, table: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {table}_version_rank_idx \
         ON {keyspace}.{table} (version_rank)"
    )
}

/// `CREATE TABLE IF NOT EXISTS` for the companion counter table that issues
/// monotonically increasing installed ranks.
pub fn create_counts_table(keyspace: &str, counts_table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {keyspace}.{counts_table} (\
         name text, \
         count counter, \
         PRIMARY KEY (name))"
    )
}
