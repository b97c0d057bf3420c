//! Adventure categories: explode `tags` and aggregate by tag.
//!
//! The explode stage runs in Rust rather than SQL so that parsing is total.
//! Each row's `tags` goes through [`parse_tags`]; `NULL` and `'[]'` rows
//! contribute nothing, and malformed rows are skipped with a warning and
//! counted in the result instead of failing the whole query.

use std::collections::{BTreeMap, BTreeSet};

use duckdb::Connection;
use parks_dash_analytics_models::{AdventureCategoriesResult, AdventureCategory, CATEGORY_LIMIT};
use parks_dash_database::Namespace;
use parks_dash_park_models::{Tags, parse_tags};

use crate::AnalyticsError;
use crate::queries::{self, LIST_SEPARATOR};

/// One row after the explode stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedTag {
    /// Activity the tag came from.
    pub activity_id: String,
    /// Park the activity belongs to.
    pub park_name: String,
    /// The individual tag.
    pub activity_type: String,
}

/// A `park_activities` row as read by the explode stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedRow {
    /// Activity identifier.
    pub activity_id: String,
    /// Park name.
    pub park_name: String,
    /// Raw `tags` column.
    pub tags: Option<String>,
}

/// Counters collected while exploding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExplodeStats {
    /// Rows read.
    pub rows_scanned: u64,
    /// Rows that produced at least one tag.
    pub rows_expanded: u64,
    /// Rows with `NULL` or empty tags.
    pub rows_without_tags: u64,
    /// Rows whose tags could not be parsed.
    pub rows_malformed: u64,
}

/// Expands each row into one [`ExpandedTag`] per tag value.
#[must_use]
pub fn explode(rows: &[TaggedRow]) -> (Vec<ExpandedTag>, ExplodeStats) {
    let mut expanded = Vec::new();
    let mut stats = ExplodeStats::default();

    for row in rows {
        stats.rows_scanned += 1;

        match parse_tags(row.tags.as_deref()) {
            Tags::Parsed(values) => {
                stats.rows_expanded += 1;
                expanded.extend(values.into_iter().map(|activity_type| ExpandedTag {
                    activity_id: row.activity_id.clone(),
                    park_name: row.park_name.clone(),
                    activity_type,
                }));
            }
            Tags::Missing | Tags::Empty => stats.rows_without_tags += 1,
            Tags::Malformed { reason } => {
                stats.rows_malformed += 1;
                log::warn!(
                    "Skipping malformed tags on activity {} ({}): {reason}",
                    row.activity_id,
                    row.park_name
                );
            }
        }
    }

    (expanded, stats)
}

/// Groups expanded rows by tag and keeps the top `limit` by distinct park
/// count, ties broken by tag ascending.
#[must_use]
pub fn aggregate(expanded: &[ExpandedTag], limit: usize) -> Vec<AdventureCategory> {
    let mut groups: BTreeMap<&str, (BTreeSet<&str>, u64)> = BTreeMap::new();

    for tag in expanded {
        let entry = groups.entry(tag.activity_type.as_str()).or_default();
        entry.0.insert(tag.park_name.as_str());
        entry.1 += 1;
    }

    let mut categories: Vec<AdventureCategory> = groups
        .into_iter()
        .map(|(activity_type, (parks, total))| AdventureCategory {
            activity_type: activity_type.to_string(),
            num_parks: parks.len() as u64,
            total_activities: total,
            parks: parks.into_iter().collect::<Vec<_>>().join(LIST_SEPARATOR),
        })
        .collect();

    categories.sort_by(|a, b| {
        b.num_parks
            .cmp(&a.num_parks)
            .then_with(|| a.activity_type.cmp(&b.activity_type))
    });
    categories.truncate(limit);
    categories
}

/// Reads the rows the explode stage works on.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the query fails.
pub fn read_tagged_rows(
    conn: &Connection,
    ns: &Namespace,
) -> Result<Vec<TaggedRow>, AnalyticsError> {
    let mut stmt = conn.prepare(&queries::category_source_rows(ns))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(TaggedRow {
                activity_id: row.get(0)?,
                park_name: row.get(1)?,
                tags: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Top activity types by number of distinct parks.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if reading `park_activities` fails. Malformed
/// tags never cause an error.
pub fn adventure_categories(
    conn: &Connection,
    ns: &Namespace,
) -> Result<AdventureCategoriesResult, AnalyticsError> {
    let rows = read_tagged_rows(conn, ns)?;
    let (expanded, stats) = explode(&rows);
    let categories = aggregate(&expanded, CATEGORY_LIMIT);

    if stats.rows_malformed > 0 {
        log::warn!(
            "{} of {} rows had malformed tags and were skipped",
            stats.rows_malformed,
            stats.rows_scanned
        );
    }
    log::info!(
        "Adventure categories: {} expanded tags from {} rows",
        expanded.len(),
        stats.rows_expanded
    );

    Ok(AdventureCategoriesResult {
        categories,
        rows_scanned: stats.rows_scanned,
        rows_expanded: stats.rows_expanded,
        rows_without_tags: stats.rows_without_tags,
        rows_malformed: stats.rows_malformed,
    })
}
