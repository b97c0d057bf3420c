//! Text and JSON rendering of query results.
//!
//! Text tables use the SQL output column names as headings so they line up
//! with the dashboard bindings.

use std::fmt::Write as _;

use parks_dash_analytics_models::{
    ActivityHub, AdventureCategoriesResult, BuildReport, JoinSummary, PowerRanking,
};
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OutputFormat {
    /// Aligned text tables.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// A simple left-aligned text table.
struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let header: Vec<String> = self.headers.iter().map(ToString::to_string).collect();
        write_row(&mut out, &widths, &header);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_row(&mut out, &widths, &rule);
        for row in &self.rows {
            write_row(&mut out, &widths, row);
        }
        out
    }
}

fn write_row(out: &mut String, widths: &[usize], cells: &[String]) {
    let line = widths
        .iter()
        .zip(cells)
        .map(|(width, cell)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{}", line.trim_end());
}

fn opt(value: Option<&str>) -> String {
    value.unwrap_or("").to_string()
}

/// Serializes any result as pretty JSON.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if serialization fails.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Renders the verification counts.
#[must_use]
pub fn summary_text(summary: &JoinSummary) -> String {
    let mut table = Table::new(&["total_rows", "distinct_parks", "distinct_activities"]);
    table.push(vec![
        summary.total_rows.to_string(),
        summary.distinct_parks.to_string(),
        summary.distinct_activities.to_string(),
    ]);
    table.render()
}

/// Renders a build report.
#[must_use]
pub fn build_report_text(report: &BuildReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Built park_activities at {}", report.built_at);
    let _ = writeln!(out, "join_key: {}", report.join_key);
    let _ = writeln!(out, "source_activities: {}", report.source_activities);
    let _ = writeln!(out, "unmatched_activities: {}", report.unmatched.count);
    if !report.unmatched.sample_park_names.is_empty() {
        let _ = writeln!(
            out,
            "unmatched_park_names: {}",
            report.unmatched.sample_park_names.join(", ")
        );
    }
    out.push('\n');
    out.push_str(&summary_text(&report.summary));
    out
}

/// Renders the activity hub.
#[must_use]
pub fn activity_hub_text(hubs: &[ActivityHub]) -> String {
    let mut table = Table::new(&[
        "park_name",
        "park_state",
        "latitude",
        "longitude",
        "num_activities",
        "activities",
    ]);
    for hub in hubs {
        table.push(vec![
            hub.park_name.clone(),
            opt(hub.park_state.as_deref()),
            hub.latitude.to_string(),
            hub.longitude.to_string(),
            hub.num_activities.to_string(),
            opt(hub.activities.as_deref()),
        ]);
    }
    table.render()
}

/// Renders the power rankings.
#[must_use]
pub fn power_rankings_text(rankings: &[PowerRanking]) -> String {
    let mut table = Table::new(&["park_name", "num_activities", "durations"]);
    for ranking in rankings {
        table.push(vec![
            ranking.park_name.clone(),
            ranking.num_activities.to_string(),
            opt(ranking.durations.as_deref()),
        ]);
    }
    table.render()
}

/// Renders the adventure categories and their explode counters.
#[must_use]
pub fn adventure_categories_text(result: &AdventureCategoriesResult) -> String {
    let mut table = Table::new(&["activity_type", "num_parks", "total_activities", "parks"]);
    for category in &result.categories {
        table.push(vec![
            category.activity_type.clone(),
            category.num_parks.to_string(),
            category.total_activities.to_string(),
            category.parks.clone(),
        ]);
    }

    let mut out = table.render();
    let _ = writeln!(
        out,
        "\nrows_scanned: {}, rows_expanded: {}, rows_without_tags: {}, rows_malformed: {}",
        result.rows_scanned, result.rows_expanded, result.rows_without_tags, result.rows_malformed
    );
    out
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use parks_dash_analytics_models::AdventureCategory;

    use super::*;

    #[test]
    fn parses_output_format() {
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::default().to_string(), "text");
        assert!(OutputFormat::from_str("yaml").is_err());
    }

    #[test]
    fn summary_table_has_column_headings() {
        let text = summary_text(&JoinSummary {
            total_rows: 3,
            distinct_parks: 2,
            distinct_activities: 3,
        });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "total_rows  distinct_parks  distinct_activities");
        assert_eq!(lines[2], "3           2               3");
    }

    #[test]
    fn columns_widen_to_fit_values() {
        let text = power_rankings_text(&[PowerRanking {
            park_name: "Great Smoky Mountains".to_string(),
            num_activities: 12,
            durations: None,
        }]);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("park_name              num_activities"));
        assert_eq!(lines[2], "Great Smoky Mountains  12");
    }

    #[test]
    fn categories_text_includes_counters() {
        let text = adventure_categories_text(&AdventureCategoriesResult {
            categories: vec![AdventureCategory {
                activity_type: "Hiking".to_string(),
                num_parks: 1,
                total_activities: 2,
                parks: "Zion".to_string(),
            }],
            rows_scanned: 3,
            rows_expanded: 2,
            rows_without_tags: 0,
            rows_malformed: 1,
        });
        assert!(text.contains("Hiking"));
        assert!(text.contains("rows_malformed: 1"));
    }

    #[test]
    fn json_uses_sql_column_names() {
        let json = to_json(&[ActivityHub {
            park_name: "Zion".to_string(),
            park_state: Some("UT".to_string()),
            latitude: 37.3,
            longitude: -113.0,
            num_activities: 2,
            activities: Some("Angels Landing, The Narrows".to_string()),
        }])
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["park_name"], "Zion");
        assert_eq!(value[0]["num_activities"], 2);
    }
}
