//! Database connection utilities.

use std::path::Path;

use duckdb::Connection;

use crate::{DbError, Namespace};

/// Opens a `DuckDB` connection with the namespace catalog attached.
///
/// When `path` is `Some`, the database file is created if missing and
/// attached under the catalog name. When `None`, an in-memory database is
/// attached instead. The schema is created if it does not exist.
///
/// # Errors
///
/// Returns [`DbError`] if the connection, attach, or schema creation fails.
pub fn open(path: Option<&Path>, namespace: &Namespace) -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;

    let target = match path {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                crate::paths::ensure_dir(parent)?;
            }
            path.to_string_lossy().into_owned()
        }
        None => ":memory:".to_string(),
    };

    conn.execute_batch(&format!(
        "ATTACH '{}' AS {};
         CREATE SCHEMA IF NOT EXISTS {};",
        target.replace('\'', "''"),
        namespace.catalog(),
        namespace,
    ))?;

    log::debug!("Attached {target} as catalog {}", namespace.catalog());

    Ok(conn)
}

/// Runs `f` inside a transaction, committing on success and rolling back
/// on error.
///
/// # Errors
///
/// Returns the error from `f`, or [`DbError`] if the transaction cannot be
/// started or committed.
pub fn with_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T, DbError>,
) -> Result<T, DbError> {
    conn.execute_batch("BEGIN TRANSACTION")?;

    match f(conn) {
        Ok(value) => {
            conn.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                log::error!("Rollback failed after error '{e}': {rollback}");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attaches_in_memory_catalog_and_schema() {
        let ns = Namespace::new("parks", "nps").unwrap();
        let conn = open(None, &ns).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.schemata
                 WHERE catalog_name = 'parks' AND schema_name = 'nps'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn reopens_file_database_under_new_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("parks.duckdb");

        let ns = Namespace::new("parks", "nps").unwrap();
        {
            let conn = open(Some(&path), &ns).unwrap();
            conn.execute_batch("CREATE TABLE parks.nps.marker (id INTEGER); INSERT INTO parks.nps.marker VALUES (7);")
                .unwrap();
        }

        assert!(path.exists());

        let renamed = Namespace::new("lake", "nps").unwrap();
        let conn = open(Some(&path), &renamed).unwrap();
        let id: i32 = conn
            .query_row("SELECT id FROM lake.nps.marker", [], |row| row.get(0))
            .unwrap();
        assert_eq!(id, 7);
    }

    #[test]
    fn rolls_back_on_error() {
        let ns = Namespace::new("parks", "nps").unwrap();
        let conn = open(None, &ns).unwrap();
        conn.execute_batch("CREATE TABLE parks.nps.t (id INTEGER)")
            .unwrap();

        let result: Result<(), DbError> = with_transaction(&conn, |conn| {
            conn.execute_batch("INSERT INTO parks.nps.t VALUES (1)")?;
            Err(DbError::Conversion {
                message: "boom".to_string(),
            })
        });
        assert!(result.is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM parks.nps.t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
