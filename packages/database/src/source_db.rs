//! Source relation storage.
//!
//! The `parks` and `thingstodo` tables are normally populated by the
//! external connector. This module owns their DDL so a local database can
//! be seeded from connector export files, plus a `_meta` key/value table
//! that records build state.

use std::collections::BTreeMap;

use duckdb::Connection;
use parks_dash_park_models::{Park, ThingToDo};

use crate::{DbError, Namespace, db};

/// Number of rows per INSERT chunk.
const CHUNK_SIZE: usize = 1_000;

/// Source table holding parks.
pub const PARKS_TABLE: &str = "parks";

/// Source table holding things to do.
pub const THINGS_TO_DO_TABLE: &str = "thingstodo";

/// Key/value metadata table.
pub const META_TABLE: &str = "_meta";

fn parks_ddl(ns: &Namespace, create: &str) -> String {
    format!(
        "{create} {} (
            name TEXT NOT NULL,
            state TEXT,
            latitude DOUBLE,
            longitude DOUBLE,
            description TEXT,
            designation TEXT,
            activities TEXT
        );",
        ns.table(PARKS_TABLE)
    )
}

fn things_to_do_ddl(ns: &Namespace, create: &str) -> String {
    format!(
        "{create} {} (
            activity_id TEXT NOT NULL,
            park_id TEXT,
            park_name TEXT NOT NULL,
            park_state TEXT,
            title TEXT,
            short_description TEXT,
            accessibility_information TEXT,
            location TEXT,
            url TEXT,
            duration TEXT,
            tags TEXT
        );",
        ns.table(THINGS_TO_DO_TABLE)
    )
}

/// Creates the source and metadata tables if they do not exist.
///
/// # Errors
///
/// Returns [`DbError`] if any DDL statement fails.
pub fn ensure_schema(conn: &Connection, ns: &Namespace) -> Result<(), DbError> {
    conn.execute_batch(&parks_ddl(ns, "CREATE TABLE IF NOT EXISTS"))?;
    conn.execute_batch(&things_to_do_ddl(ns, "CREATE TABLE IF NOT EXISTS"))?;
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
        ns.table(META_TABLE)
    ))?;
    Ok(())
}

/// Keeps the last occurrence of each key, preserving input order.
fn dedupe_by<'a, T>(items: &'a [T], key: impl Fn(&T) -> &str) -> Vec<&'a T> {
    let mut last_seen: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, item) in items.iter().enumerate() {
        last_seen.insert(key(item), i);
    }
    items
        .iter()
        .enumerate()
        .filter(|(i, item)| last_seen.get(key(item)) == Some(i))
        .map(|(_, item)| item)
        .collect()
}

fn placeholders(columns: usize, rows: usize) -> String {
    let row = format!("({})", vec!["?"; columns].join(", "));
    vec![row; rows].join(", ")
}

/// Replaces the contents of the `parks` table.
///
/// Parks are keyed by name; when the input repeats a name the last
/// occurrence wins. Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails. The previous
/// contents are kept on failure.
pub fn replace_parks(conn: &Connection, ns: &Namespace, parks: &[Park]) -> Result<u64, DbError> {
    let deduped = dedupe_by(parks, |p| p.name.as_str());
    if deduped.len() < parks.len() {
        log::warn!(
            "Deduplicated parks by name: {} -> {} rows",
            parks.len(),
            deduped.len()
        );
    }

    db::with_transaction(conn, |conn| {
        conn.execute_batch(&parks_ddl(ns, "CREATE OR REPLACE TABLE"))?;

        let mut total = 0u64;
        for chunk in deduped.chunks(CHUNK_SIZE) {
            let sql = format!(
                "INSERT INTO {} (
                    name, state, latitude, longitude,
                    description, designation, activities
                ) VALUES {}",
                ns.table(PARKS_TABLE),
                placeholders(7, chunk.len())
            );

            let mut stmt = conn.prepare(&sql)?;
            let mut idx = 1usize;

            for park in chunk {
                stmt.raw_bind_parameter(idx, &park.name)?;
                stmt.raw_bind_parameter(idx + 1, park.state.as_deref())?;
                stmt.raw_bind_parameter(idx + 2, park.latitude)?;
                stmt.raw_bind_parameter(idx + 3, park.longitude)?;
                stmt.raw_bind_parameter(idx + 4, park.description.as_deref())?;
                stmt.raw_bind_parameter(idx + 5, park.designation.as_deref())?;
                stmt.raw_bind_parameter(idx + 6, park.activities.as_deref())?;
                idx += 7;
            }

            let rows = stmt.raw_execute()?;
            total += u64::try_from(rows).unwrap_or(0);
        }

        log::info!("Loaded {total} parks into {}", ns.table(PARKS_TABLE));
        Ok(total)
    })
}

/// Replaces the contents of the `thingstodo` table.
///
/// Activities are keyed by `activity_id`; when the input repeats an id the
/// last occurrence wins. Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails. The previous
/// contents are kept on failure.
pub fn replace_things_to_do(
    conn: &Connection,
    ns: &Namespace,
    things: &[ThingToDo],
) -> Result<u64, DbError> {
    let deduped = dedupe_by(things, |t| t.activity_id.as_str());
    if deduped.len() < things.len() {
        log::warn!(
            "Deduplicated things to do by activity_id: {} -> {} rows",
            things.len(),
            deduped.len()
        );
    }

    db::with_transaction(conn, |conn| {
        conn.execute_batch(&things_to_do_ddl(ns, "CREATE OR REPLACE TABLE"))?;

        let mut total = 0u64;
        for chunk in deduped.chunks(CHUNK_SIZE) {
            let sql = format!(
                "INSERT INTO {} (
                    activity_id, park_id, park_name, park_state, title,
                    short_description, accessibility_information, location,
                    url, duration, tags
                ) VALUES {}",
                ns.table(THINGS_TO_DO_TABLE),
                placeholders(11, chunk.len())
            );

            let mut stmt = conn.prepare(&sql)?;
            let mut idx = 1usize;

            for thing in chunk {
                stmt.raw_bind_parameter(idx, &thing.activity_id)?;
                stmt.raw_bind_parameter(idx + 1, thing.park_id.as_deref())?;
                stmt.raw_bind_parameter(idx + 2, &thing.park_name)?;
                stmt.raw_bind_parameter(idx + 3, thing.park_state.as_deref())?;
                stmt.raw_bind_parameter(idx + 4, thing.title.as_deref())?;
                stmt.raw_bind_parameter(idx + 5, thing.short_description.as_deref())?;
                stmt.raw_bind_parameter(idx + 6, thing.accessibility_information.as_deref())?;
                stmt.raw_bind_parameter(idx + 7, thing.location.as_deref())?;
                stmt.raw_bind_parameter(idx + 8, thing.url.as_deref())?;
                stmt.raw_bind_parameter(idx + 9, thing.duration.as_deref())?;
                stmt.raw_bind_parameter(idx + 10, thing.tags.as_deref())?;
                idx += 11;
            }

            let rows = stmt.raw_execute()?;
            total += u64::try_from(rows).unwrap_or(0);
        }

        log::info!(
            "Loaded {total} things to do into {}",
            ns.table(THINGS_TO_DO_TABLE)
        );
        Ok(total)
    })
}

/// Returns the number of rows in `table` within the namespace.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails (including when the table does
/// not exist).
pub fn row_count(conn: &Connection, ns: &Namespace, table: &str) -> Result<u64, DbError> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", ns.table(table)),
        [],
        |row| row.get(0),
    )?;
    u64::try_from(count).map_err(|e| DbError::Conversion {
        message: format!("negative row count for {table}: {e}"),
    })
}

/// Gets a metadata value from the `_meta` table.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn get_meta(conn: &Connection, ns: &Namespace, key: &str) -> Result<Option<String>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT value FROM {} WHERE key = ?",
        ns.table(META_TABLE)
    ))?;
    match stmt.query_row([key], |row| row.get(0)) {
        Ok(v) => Ok(Some(v)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DbError::DuckDb(e)),
    }
}

/// Sets a metadata value in the `_meta` table.
///
/// # Errors
///
/// Returns [`DbError`] if the upsert fails.
pub fn set_meta(conn: &Connection, ns: &Namespace, key: &str, value: &str) -> Result<(), DbError> {
    conn.execute(
        &format!(
            "INSERT INTO {} (key, value) VALUES (?, ?)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
            ns.table(META_TABLE)
        ),
        duckdb::params![key, value],
    )?;
    Ok(())
}
