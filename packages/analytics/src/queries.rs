//! SQL texts for every dashboard query.
//!
//! Each function renders one query against a [`Namespace`]. The texts use
//! `DuckDB` syntax and fully qualified `catalog.schema.table` names, so the
//! output of [`render`] can be executed locally or pasted into a hosted SQL
//! editor that exposes the same catalog and schema.

use parks_dash_analytics_models::{CATEGORY_LIMIT, QueryKind, RANKING_LIMIT};
use parks_dash_database::Namespace;
use parks_dash_database::source_db::{PARKS_TABLE, THINGS_TO_DO_TABLE};
use parks_dash_park_models::JoinKeyMode;

/// Derived relation produced by the join builder.
pub const PARK_ACTIVITIES_TABLE: &str = "park_activities";

/// Separator used for every comma-joined list column.
pub const LIST_SEPARATOR: &str = ", ";

/// Columns of `park_activities`, in table order.
pub const PARK_ACTIVITY_COLUMNS: &[&str] = &[
    "activity_id",
    "park_id",
    "park_name",
    "park_state",
    "title",
    "short_description",
    "accessibility_information",
    "location",
    "url",
    "duration",
    "tags",
    "description",
    "latitude",
    "longitude",
    "activities",
    "designation",
];

/// Aggregates the distinct non-null values of `expr` into a sorted,
/// comma-joined string, or `NULL` when there are none.
fn distinct_list(expr: &str) -> String {
    format!(
        "NULLIF(array_to_string(list_sort(list_distinct(list({expr}))), '{LIST_SEPARATOR}'), '')"
    )
}

/// Renders the query text for `kind`.
#[must_use]
pub fn render(kind: QueryKind, ns: &Namespace, join_key: JoinKeyMode) -> String {
    match kind {
        QueryKind::Build => build_park_activities(ns, join_key),
        QueryKind::Verify => verify_park_activities(ns),
        QueryKind::Hub => activity_hub(ns),
        QueryKind::Rankings => power_rankings(ns),
        QueryKind::Categories => adventure_categories(ns),
    }
}

/// Create-or-replace of `park_activities` as an inner join of
/// `thingstodo` onto `parks`.
///
/// Under [`JoinKeyMode::Normalized`] the matched park's canonical name is
/// projected as `park_name`, so spelling variants of one park group
/// together downstream.
#[must_use]
pub fn build_park_activities(ns: &Namespace, join_key: JoinKeyMode) -> String {
    let park_name = match join_key {
        JoinKeyMode::Exact => "t.park_name",
        JoinKeyMode::Normalized => "p.name AS park_name",
    };
    format!(
        "CREATE OR REPLACE TABLE {target} AS
SELECT
    t.activity_id,
    t.park_id,
    {park_name},
    t.park_state,
    t.title,
    t.short_description,
    t.accessibility_information,
    t.location,
    t.url,
    t.duration,
    t.tags,
    p.description,
    p.latitude,
    p.longitude,
    p.activities,
    p.designation
FROM {things} t
INNER JOIN {parks} p
    ON {thing_key} = {park_key}
ORDER BY t.activity_id, p.name",
        target = ns.table(PARK_ACTIVITIES_TABLE),
        things = ns.table(THINGS_TO_DO_TABLE),
        parks = ns.table(PARKS_TABLE),
        thing_key = join_key.key_expr("t.park_name"),
        park_key = join_key.key_expr("p.name"),
    )
}

/// Row, park, and activity counts over `park_activities`.
#[must_use]
pub fn verify_park_activities(ns: &Namespace) -> String {
    format!(
        "SELECT
    COUNT(*) AS total_rows,
    COUNT(DISTINCT park_name) AS distinct_parks,
    COUNT(DISTINCT activity_id) AS distinct_activities
FROM {}",
        ns.table(PARK_ACTIVITIES_TABLE)
    )
}

/// `thingstodo` rows with no matching park.
#[must_use]
pub fn unmatched_activity_count(ns: &Namespace, join_key: JoinKeyMode) -> String {
    format!(
        "SELECT COUNT(*) AS unmatched
FROM {things} t
WHERE NOT EXISTS (
    SELECT 1 FROM {parks} p WHERE {park_key} = {thing_key}
)",
        things = ns.table(THINGS_TO_DO_TABLE),
        parks = ns.table(PARKS_TABLE),
        thing_key = join_key.key_expr("t.park_name"),
        park_key = join_key.key_expr("p.name"),
    )
}

/// Distinct unmatched park names, sorted, limited to `limit`. Rows with
/// a `NULL` name are counted by [`unmatched_activity_count`] but left out
/// of the sample.
#[must_use]
pub fn unmatched_park_names(ns: &Namespace, join_key: JoinKeyMode, limit: usize) -> String {
    format!(
        "SELECT DISTINCT t.park_name
FROM {things} t
WHERE t.park_name IS NOT NULL
  AND NOT EXISTS (
    SELECT 1 FROM {parks} p WHERE {park_key} = {thing_key}
)
ORDER BY t.park_name
LIMIT {limit}",
        things = ns.table(THINGS_TO_DO_TABLE),
        parks = ns.table(PARKS_TABLE),
        thing_key = join_key.key_expr("t.park_name"),
        park_key = join_key.key_expr("p.name"),
    )
}

/// Per-park activity counts with coordinates for the map widget.
#[must_use]
pub fn activity_hub(ns: &Namespace) -> String {
    format!(
        "SELECT
    park_name,
    park_state,
    latitude,
    longitude,
    COUNT(DISTINCT activity_id) AS num_activities,
    {titles} AS activities
FROM {source}
WHERE latitude IS NOT NULL
  AND longitude IS NOT NULL
GROUP BY park_name, park_state, latitude, longitude
ORDER BY num_activities DESC, park_name ASC",
        titles = distinct_list("trim(title)"),
        source = ns.table(PARK_ACTIVITIES_TABLE),
    )
}

/// Top parks by distinct activity count.
#[must_use]
pub fn power_rankings(ns: &Namespace) -> String {
    format!(
        "SELECT
    park_name,
    COUNT(DISTINCT activity_id) AS num_activities,
    {durations} AS durations
FROM {source}
GROUP BY park_name
ORDER BY num_activities DESC, park_name ASC
LIMIT {RANKING_LIMIT}",
        durations = distinct_list("trim(duration)"),
        source = ns.table(PARK_ACTIVITIES_TABLE),
    )
}

/// Rows the local category breakdown reads before exploding tags.
#[must_use]
pub fn category_source_rows(ns: &Namespace) -> String {
    format!(
        "SELECT activity_id, park_name, tags
FROM {}
ORDER BY activity_id, park_name",
        ns.table(PARK_ACTIVITIES_TABLE)
    )
}

/// Top activity types by distinct park count, exploding `tags` with the
/// `json` extension. The local executor performs the same explode in Rust
/// so malformed tags can be skipped instead of failing the query.
#[must_use]
pub fn adventure_categories(ns: &Namespace) -> String {
    format!(
        "WITH exploded AS (
    SELECT
        park_name,
        activity_id,
        unnest(from_json(tags, '[\"VARCHAR\"]')) AS tag
    FROM {source}
    WHERE tags IS NOT NULL
      AND tags <> '[]'
),
expanded AS (
    SELECT park_name, activity_id, trim(tag) AS activity_type
    FROM exploded
    WHERE tag IS NOT NULL
)
SELECT
    activity_type,
    COUNT(DISTINCT park_name) AS num_parks,
    COUNT(*) AS total_activities,
    {parks} AS parks
FROM expanded
WHERE activity_type <> ''
GROUP BY activity_type
ORDER BY num_parks DESC, activity_type ASC
LIMIT {CATEGORY_LIMIT}",
        parks = distinct_list("park_name"),
        source = ns.table(PARK_ACTIVITIES_TABLE),
    )
}

#[cfg(test)]
mod tests {
    use duckdb::Connection;
    use parks_dash_analytics_models::AdventureCategory;

    use super::*;
    use crate::test_support::{open, park, seed, thing};
    use crate::{aggregates, categories, join};

    fn seeded() -> (Connection, Namespace) {
        let (conn, ns) = open();
        seed(
            &conn,
            &ns,
            &[
                park("Zion", "UT", Some((37.3, -113.0))),
                park("Arches", "UT", Some((38.7, -109.6))),
                park("Bryce", "UT", None),
            ],
            &[
                thing("a1", "Zion", "Angels Landing", r#"["Hiking", "Scenic Views"]"#),
                thing("a2", "Zion", "Canyon Ride", r#"["Biking"]"#),
                thing("a3", "Zion", "The Narrows", r#"[" Hiking "]"#),
                thing("a4", "Arches", "Delicate Arch", r#"["Hiking"]"#),
                thing("a5", "Arches", "Visitor Center", "[]"),
                thing("a6", "Bryce", "Rim Trail", r#"["Hiking","Biking"]"#),
            ],
        );
        (conn, ns)
    }

    fn ns() -> Namespace {
        Namespace::new("lakehouse", "nps_data").unwrap()
    }

    #[test]
    fn every_query_is_fully_qualified() {
        for kind in QueryKind::ALL {
            let sql = render(*kind, &ns(), JoinKeyMode::Exact);
            assert!(
                sql.contains("lakehouse.nps_data.park_activities"),
                "{kind} query does not reference the namespace: {sql}"
            );
        }
    }

    #[test]
    fn build_selects_every_park_activity_column() {
        let sql = build_park_activities(&ns(), JoinKeyMode::Exact);
        for column in PARK_ACTIVITY_COLUMNS {
            assert!(sql.contains(&format!(".{column}")), "missing {column}");
        }
        assert!(sql.starts_with("CREATE OR REPLACE TABLE"));
        assert!(sql.contains("ON t.park_name = p.name"));
    }

    #[test]
    fn build_uses_normalized_join_key() {
        let sql = build_park_activities(&ns(), JoinKeyMode::Normalized);
        assert!(sql.contains("ON lower(trim(t.park_name)) = lower(trim(p.name))"));
    }

    #[test]
    fn hub_filters_null_coordinates() {
        let sql = activity_hub(&ns());
        assert!(sql.contains("latitude IS NOT NULL"));
        assert!(sql.contains("longitude IS NOT NULL"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn leaderboards_are_limited() {
        assert!(power_rankings(&ns()).ends_with(&format!("LIMIT {RANKING_LIMIT}")));
        assert!(adventure_categories(&ns()).ends_with(&format!("LIMIT {CATEGORY_LIMIT}")));
    }

    #[test]
    fn categories_skip_empty_tag_arrays() {
        assert!(adventure_categories(&ns()).contains("tags <> '[]'"));
    }

    #[test]
    fn rendered_build_and_verify_match_library_build() {
        let (conn, ns) = seeded();
        conn.execute_batch(&render(QueryKind::Build, &ns, JoinKeyMode::Exact))
            .unwrap();
        let counts: (i64, i64, i64) = conn
            .query_row(&render(QueryKind::Verify, &ns, JoinKeyMode::Exact), [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .unwrap();

        let report = join::build_park_activities(&conn, &ns, JoinKeyMode::Exact).unwrap();
        assert_eq!(counts, (6, 3, 6));
        assert_eq!(report.summary.total_rows, 6);
        assert_eq!(report.summary.distinct_parks, 3);
    }

    #[test]
    fn rendered_hub_and_rankings_match_aggregates() {
        let (conn, ns) = seeded();
        join::build_park_activities(&conn, &ns, JoinKeyMode::Exact).unwrap();

        let mut stmt = conn
            .prepare(&render(QueryKind::Hub, &ns, JoinKeyMode::Exact))
            .unwrap();
        let hub: Vec<(String, i64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(4)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let expected: Vec<(String, i64)> = aggregates::activity_hub(&conn, &ns)
            .unwrap()
            .into_iter()
            .map(|h| (h.park_name, i64::try_from(h.num_activities).unwrap()))
            .collect();
        assert_eq!(hub, expected);
        assert_eq!(hub, [("Zion".to_string(), 3), ("Arches".to_string(), 2)]);

        let mut stmt = conn
            .prepare(&render(QueryKind::Rankings, &ns, JoinKeyMode::Exact))
            .unwrap();
        let rankings: Vec<(String, i64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let expected: Vec<(String, i64)> = aggregates::power_rankings(&conn, &ns)
            .unwrap()
            .into_iter()
            .map(|r| (r.park_name, i64::try_from(r.num_activities).unwrap()))
            .collect();
        assert_eq!(rankings, expected);
        assert_eq!(rankings.len(), 3);
    }

    #[test]
    fn rendered_categories_match_local_explode() {
        let (conn, ns) = seeded();
        join::build_park_activities(&conn, &ns, JoinKeyMode::Exact).unwrap();

        let mut stmt = conn
            .prepare(&render(QueryKind::Categories, &ns, JoinKeyMode::Exact))
            .unwrap();
        let rendered: Vec<AdventureCategory> = stmt
            .query_map([], |row| {
                Ok(AdventureCategory {
                    activity_type: row.get(0)?,
                    num_parks: row.get::<_, i64>(1)?.unsigned_abs(),
                    total_activities: row.get::<_, i64>(2)?.unsigned_abs(),
                    parks: row.get(3)?,
                })
            })
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        let local = categories::adventure_categories(&conn, &ns).unwrap();
        assert_eq!(rendered, local.categories);
        assert_eq!(rendered[0].activity_type, "Hiking");
        assert_eq!(rendered[0].num_parks, 3);
        assert_eq!(rendered[0].total_activities, 4);
        assert_eq!(rendered[0].parks, "Arches, Bryce, Zion");
    }

    #[test]
    fn normalized_build_projects_canonical_park_name() {
        let sql = build_park_activities(&ns(), JoinKeyMode::Normalized);
        assert!(sql.contains("p.name AS park_name"));
        assert!(!build_park_activities(&ns(), JoinKeyMode::Exact).contains("p.name AS"));
    }

    #[test]
    fn unmatched_sample_skips_null_names() {
        assert!(
            unmatched_park_names(&ns(), JoinKeyMode::Exact, 10).contains("t.park_name IS NOT NULL")
        );
    }
}
