#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types for the parks dashboard queries.
//!
//! Field names match the SQL output columns that the dashboard widgets bind
//! to, so serializing a result to JSON yields exactly the column set each
//! visualization expects.

use parks_dash_park_models::JoinKeyMode;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Maximum rows returned by the power rankings leaderboard.
pub const RANKING_LIMIT: usize = 15;

/// Maximum rows returned by the adventure categories breakdown.
pub const CATEGORY_LIMIT: usize = 15;

/// Maximum number of unmatched park names sampled into a build report.
pub const UNMATCHED_SAMPLE_LIMIT: usize = 10;

/// The named queries that make up the dashboard's query surface.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum QueryKind {
    /// Create-or-replace of `park_activities`.
    Build,
    /// Row/park/activity counts over `park_activities`.
    Verify,
    /// Per-park activity counts with coordinates, for the map widget.
    Hub,
    /// Top parks by activity count.
    Rankings,
    /// Top activity types by number of parks.
    Categories,
}

impl QueryKind {
    /// Every query, in execution order.
    pub const ALL: &[Self] = &[
        Self::Build,
        Self::Verify,
        Self::Hub,
        Self::Rankings,
        Self::Categories,
    ];

    /// Dashboard-facing title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Build => "Park Activities",
            Self::Verify => "Join Verification",
            Self::Hub => "Activity Hub",
            Self::Rankings => "Power Rankings",
            Self::Categories => "Adventure Categories",
        }
    }
}

/// Counts over the built `park_activities` relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSummary {
    /// Total rows.
    pub total_rows: u64,
    /// Distinct `park_name` values.
    pub distinct_parks: u64,
    /// Distinct `activity_id` values.
    pub distinct_activities: u64,
}

/// Activities whose `park_name` matched no park.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedActivities {
    /// Number of unmatched `thingstodo` rows.
    pub count: u64,
    /// Up to [`UNMATCHED_SAMPLE_LIMIT`] distinct unmatched park names,
    /// sorted ascending.
    pub sample_park_names: Vec<String>,
}

/// Outcome of a `park_activities` rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Rows in `thingstodo` at build time.
    pub source_activities: u64,
    /// Counts over the rebuilt relation.
    pub summary: JoinSummary,
    /// Rows dropped by the inner join.
    pub unmatched: UnmatchedActivities,
    /// Join key comparison used.
    pub join_key: JoinKeyMode,
    /// RFC 3339 timestamp of the rebuild.
    pub built_at: String,
}

/// One marker on the activity hub map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityHub {
    /// Park name.
    pub park_name: String,
    /// Park state.
    pub park_state: Option<String>,
    /// Marker latitude.
    pub latitude: f64,
    /// Marker longitude.
    pub longitude: f64,
    /// Distinct activities at this park. Drives marker size.
    pub num_activities: u64,
    /// Distinct trimmed activity titles, comma-joined.
    pub activities: Option<String>,
}

/// One bar of the power rankings chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerRanking {
    /// Park name.
    pub park_name: String,
    /// Distinct activities at this park.
    pub num_activities: u64,
    /// Distinct trimmed durations, comma-joined.
    pub durations: Option<String>,
}

/// One bar of the adventure categories chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdventureCategory {
    /// Individual tag value.
    pub activity_type: String,
    /// Distinct parks offering this activity type.
    pub num_parks: u64,
    /// Expanded rows carrying this tag.
    pub total_activities: u64,
    /// Distinct park names, comma-joined.
    pub parks: String,
}

/// Adventure categories plus diagnostics from the tag explode stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdventureCategoriesResult {
    /// Top categories by distinct park count.
    pub categories: Vec<AdventureCategory>,
    /// `park_activities` rows read.
    pub rows_scanned: u64,
    /// Rows expanded into at least one tag.
    pub rows_expanded: u64,
    /// Rows skipped because `tags` was `NULL` or `'[]'`.
    pub rows_without_tags: u64,
    /// Rows skipped because `tags` was not a JSON array of strings.
    pub rows_malformed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_kind_round_trips_through_str() {
        for kind in QueryKind::ALL {
            let parsed: QueryKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, *kind);
        }
    }

    #[test]
    fn query_kind_titles_are_distinct() {
        let titles: std::collections::BTreeSet<&str> =
            QueryKind::ALL.iter().map(|k| k.title()).collect();
        assert_eq!(titles.len(), QueryKind::ALL.len());
    }

    #[test]
    fn hub_serializes_with_column_names() {
        let hub = ActivityHub {
            park_name: "Zion".to_string(),
            park_state: Some("UT".to_string()),
            latitude: 37.3,
            longitude: -113.0,
            num_activities: 2,
            activities: Some("Angels Landing, The Narrows".to_string()),
        };
        let value = serde_json::to_value(&hub).unwrap();
        for column in [
            "park_name",
            "park_state",
            "latitude",
            "longitude",
            "num_activities",
            "activities",
        ] {
            assert!(value.get(column).is_some(), "missing column {column}");
        }
    }
}
