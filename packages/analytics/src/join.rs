//! Builds and verifies the `park_activities` relation.
//!
//! The build is a full overwrite: every run replaces the relation with the
//! inner join of the current source tables, inside a transaction, so
//! readers never see a partially written table. Activities whose
//! `park_name` matches no park are dropped by the join; they are counted
//! and sampled into the [`BuildReport`] so the loss is visible.
//!
//! Concurrent rebuilds against the same database are not coordinated.

use duckdb::Connection;
use parks_dash_analytics_models::{
    BuildReport, JoinSummary, UNMATCHED_SAMPLE_LIMIT, UnmatchedActivities,
};
use parks_dash_database::source_db::{self, THINGS_TO_DO_TABLE};
use parks_dash_database::{Namespace, db};
use parks_dash_park_models::{JoinKeyMode, ParkActivity};

use crate::queries::{self, PARK_ACTIVITIES_TABLE};
use crate::{AnalyticsError, count_to_u64};

/// Rebuilds `park_activities` from `parks` and `thingstodo`.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if either source table is missing or any
/// statement fails. On failure the previous `park_activities` and its
/// `_meta` stamps are kept.
pub fn build_park_activities(
    conn: &Connection,
    ns: &Namespace,
    join_key: JoinKeyMode,
) -> Result<BuildReport, AnalyticsError> {
    let source_activities = source_db::row_count(conn, ns, THINGS_TO_DO_TABLE)?;
    let unmatched = unmatched_activities(conn, ns, join_key)?;
    let built_at = chrono::Utc::now().to_rfc3339();

    log::info!(
        "Building {} from {source_activities} activities (join key: {join_key})",
        ns.table(PARK_ACTIVITIES_TABLE)
    );

    db::with_transaction(conn, |conn| {
        conn.execute_batch(&queries::build_park_activities(ns, join_key))?;
        let rows = source_db::row_count(conn, ns, PARK_ACTIVITIES_TABLE)?;
        source_db::set_meta(conn, ns, "last_built_at", &built_at)?;
        source_db::set_meta(conn, ns, "park_activity_rows", &rows.to_string())?;
        source_db::set_meta(conn, ns, "join_key", join_key.as_ref())
    })?;

    let summary = verify_park_activities(conn, ns)?;

    if unmatched.count > 0 {
        log::warn!(
            "{} activities matched no park and were dropped (e.g. {})",
            unmatched.count,
            unmatched.sample_park_names.join(", ")
        );
    }

    log::info!(
        "Built {} rows across {} parks ({} distinct activities)",
        summary.total_rows,
        summary.distinct_parks,
        summary.distinct_activities
    );

    Ok(BuildReport {
        source_activities,
        summary,
        unmatched,
        join_key,
        built_at,
    })
}

/// Counts rows, distinct parks, and distinct activities in
/// `park_activities`. Read-only.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the relation does not exist or the query
/// fails.
pub fn verify_park_activities(
    conn: &Connection,
    ns: &Namespace,
) -> Result<JoinSummary, AnalyticsError> {
    let (total_rows, distinct_parks, distinct_activities): (i64, i64, i64) = conn.query_row(
        &queries::verify_park_activities(ns),
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    Ok(JoinSummary {
        total_rows: count_to_u64(total_rows, "total_rows")?,
        distinct_parks: count_to_u64(distinct_parks, "distinct_parks")?,
        distinct_activities: count_to_u64(distinct_activities, "distinct_activities")?,
    })
}

/// Counts `thingstodo` rows whose `park_name` matches no park under
/// `join_key`, with a sorted sample of the unmatched names.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the query fails.
pub fn unmatched_activities(
    conn: &Connection,
    ns: &Namespace,
    join_key: JoinKeyMode,
) -> Result<UnmatchedActivities, AnalyticsError> {
    let count: i64 = conn.query_row(
        &queries::unmatched_activity_count(ns, join_key),
        [],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&queries::unmatched_park_names(
        ns,
        join_key,
        UNMATCHED_SAMPLE_LIMIT,
    ))?;
    let sample_park_names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(UnmatchedActivities {
        count: count_to_u64(count, "unmatched")?,
        sample_park_names,
    })
}

/// Reads every `park_activities` row, ordered by activity and park.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the relation does not exist or the query
/// fails.
pub fn read_park_activities(
    conn: &Connection,
    ns: &Namespace,
) -> Result<Vec<ParkActivity>, AnalyticsError> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY activity_id, park_name",
        queries::PARK_ACTIVITY_COLUMNS.join(", "),
        ns.table(PARK_ACTIVITIES_TABLE)
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ParkActivity {
                activity_id: row.get(0)?,
                park_id: row.get(1)?,
                park_name: row.get(2)?,
                park_state: row.get(3)?,
                title: row.get(4)?,
                short_description: row.get(5)?,
                accessibility_information: row.get(6)?,
                location: row.get(7)?,
                url: row.get(8)?,
                duration: row.get(9)?,
                tags: row.get(10)?,
                description: row.get(11)?,
                latitude: row.get(12)?,
                longitude: row.get(13)?,
                activities: row.get(14)?,
                designation: row.get(15)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}
