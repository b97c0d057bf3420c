//! Activity hub and power rankings aggregates.
//!
//! Both are pure reads over `park_activities`, recomputed on every call.

use duckdb::Connection;
use parks_dash_analytics_models::{ActivityHub, PowerRanking};
use parks_dash_database::Namespace;

use crate::{AnalyticsError, count_to_u64, queries};

/// Per-park activity counts with coordinates, ordered by activity count
/// descending. Parks without both coordinates are excluded.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the query fails.
pub fn activity_hub(conn: &Connection, ns: &Namespace) -> Result<Vec<ActivityHub>, AnalyticsError> {
    let mut stmt = conn.prepare(&queries::activity_hub(ns))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let hubs = rows
        .into_iter()
        .map(
            |(park_name, park_state, latitude, longitude, num_activities, activities)| {
                Ok(ActivityHub {
                    park_name,
                    park_state,
                    latitude,
                    longitude,
                    num_activities: count_to_u64(num_activities, "num_activities")?,
                    activities,
                })
            },
        )
        .collect::<Result<Vec<_>, AnalyticsError>>()?;

    log::info!("Activity hub: {} parks with coordinates", hubs.len());
    Ok(hubs)
}

/// Top parks by distinct activity count, ties broken by park name.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the query fails.
pub fn power_rankings(
    conn: &Connection,
    ns: &Namespace,
) -> Result<Vec<PowerRanking>, AnalyticsError> {
    let mut stmt = conn.prepare(&queries::power_rankings(ns))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let rankings = rows
        .into_iter()
        .map(|(park_name, num_activities, durations)| {
            Ok(PowerRanking {
                park_name,
                num_activities: count_to_u64(num_activities, "num_activities")?,
                durations,
            })
        })
        .collect::<Result<Vec<_>, AnalyticsError>>()?;

    log::info!("Power rankings: {} parks", rankings.len());
    Ok(rankings)
}
