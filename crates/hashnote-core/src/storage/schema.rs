//! SQLite schema for the record store
//!
//! One flat key/value table holds every record as a JSON blob. The
//! engine never queries by field; all structure lives in the key lists
//! carried by the records themselves.

use rusqlite::{Connection, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- All records, keyed by "<kind>/<id>"
        CREATE TABLE IF NOT EXISTS records (
            key TEXT PRIMARY KEY,
            value BLOB NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Check if the schema needs to be initialized
pub fn needs_init(conn: &Connection) -> bool {
    let result: Result<String> = conn.query_row(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='records'",
        [],
        |row| row.get(0),
    );
    result.is_err()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(needs_init(&conn));

        init_schema(&conn).unwrap();
        assert!(!needs_init(&conn));

        let version: String = conn
            .query_row(
                "SELECT value FROM schema_info WHERE key = 'version'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION.to_string());
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert!(!needs_init(&conn));
    }
}
