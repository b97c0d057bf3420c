#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Park and things-to-do source types.
//!
//! These are the shapes of the two upstream relations (`parks` and
//! `thingstodo`) as delivered by the ingestion connector, plus the
//! denormalized [`ParkActivity`] row produced by joining them. Field names
//! match the SQL column names so the same types serialize straight into
//! dashboard bindings.

pub mod lenient;
pub mod tags;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use tags::{Tags, parse_tags};

/// A national park as delivered in the `parks` relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Park {
    /// Park name. Things-to-do rows reference parks by this value.
    pub name: String,
    /// State abbreviation(s), e.g. `"UT"` or `"CA,NV"`.
    #[serde(default, alias = "states", deserialize_with = "lenient::optional_text")]
    pub state: Option<String>,
    /// WGS84 latitude.
    #[serde(default, deserialize_with = "lenient::optional_f64")]
    pub latitude: Option<f64>,
    /// WGS84 longitude.
    #[serde(default, deserialize_with = "lenient::optional_f64")]
    pub longitude: Option<f64>,
    /// Free-text park description.
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description: Option<String>,
    /// Designation such as `"National Park"` or `"National Monument"`.
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub designation: Option<String>,
    /// Activity categories offered by the park, as a comma-joined list.
    #[serde(default, deserialize_with = "lenient::optional_text_list")]
    pub activities: Option<String>,
}

/// A single activity from the `thingstodo` relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThingToDo {
    /// Unique activity identifier.
    #[serde(alias = "id")]
    pub activity_id: String,
    /// Upstream park code.
    #[serde(default, alias = "parkId", deserialize_with = "lenient::optional_text")]
    pub park_id: Option<String>,
    /// Name of the park this activity belongs to. Joined against
    /// [`Park::name`].
    #[serde(alias = "parkName")]
    pub park_name: String,
    /// State of the park this activity belongs to.
    #[serde(default, alias = "parkState", deserialize_with = "lenient::optional_text")]
    pub park_state: Option<String>,
    /// Activity title.
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub title: Option<String>,
    /// One-paragraph summary.
    #[serde(
        default,
        alias = "shortDescription",
        deserialize_with = "lenient::optional_text"
    )]
    pub short_description: Option<String>,
    /// Accessibility notes.
    #[serde(
        default,
        alias = "accessibilityInformation",
        deserialize_with = "lenient::optional_text"
    )]
    pub accessibility_information: Option<String>,
    /// Where in the park the activity takes place.
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub location: Option<String>,
    /// Detail page URL.
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub url: Option<String>,
    /// Human-readable duration, e.g. `"1-2 Hours"`.
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub duration: Option<String>,
    /// Category tags as JSON array text, e.g. `["Hiking","Camping"]`.
    #[serde(default, deserialize_with = "lenient::optional_json_text")]
    pub tags: Option<String>,
}

/// One row of the denormalized `park_activities` relation: every
/// [`ThingToDo`] field plus the matched park's descriptive columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkActivity {
    /// Unique activity identifier.
    pub activity_id: String,
    /// Upstream park code.
    pub park_id: Option<String>,
    /// Park name (the join key).
    pub park_name: String,
    /// Park state as carried on the activity.
    pub park_state: Option<String>,
    /// Activity title.
    pub title: Option<String>,
    /// One-paragraph summary.
    pub short_description: Option<String>,
    /// Accessibility notes.
    pub accessibility_information: Option<String>,
    /// Where in the park the activity takes place.
    pub location: Option<String>,
    /// Detail page URL.
    pub url: Option<String>,
    /// Human-readable duration.
    pub duration: Option<String>,
    /// Category tags as JSON array text.
    pub tags: Option<String>,
    /// Park description.
    pub description: Option<String>,
    /// Park latitude.
    pub latitude: Option<f64>,
    /// Park longitude.
    pub longitude: Option<f64>,
    /// Activity categories offered by the park.
    pub activities: Option<String>,
    /// Park designation.
    pub designation: Option<String>,
}

/// How `thingstodo.park_name` is compared against `parks.name` when
/// building `park_activities`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum JoinKeyMode {
    /// Byte-for-byte string equality. Names that differ in casing or
    /// surrounding whitespace do not match.
    #[default]
    Exact,
    /// Compare trimmed, lower-cased names.
    Normalized,
}

impl JoinKeyMode {
    /// Returns the SQL expression used as the join key for `column`.
    #[must_use]
    pub fn key_expr(self, column: &str) -> String {
        match self {
            Self::Exact => column.to_string(),
            Self::Normalized => format!("lower(trim({column}))"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_key_mode_parses_case_insensitively() {
        assert_eq!("exact".parse::<JoinKeyMode>().unwrap(), JoinKeyMode::Exact);
        assert_eq!(
            "Normalized".parse::<JoinKeyMode>().unwrap(),
            JoinKeyMode::Normalized
        );
        assert!("fuzzy".parse::<JoinKeyMode>().is_err());
    }

    #[test]
    fn join_key_mode_displays_snake_case() {
        assert_eq!(JoinKeyMode::Normalized.to_string(), "normalized");
        assert_eq!(JoinKeyMode::default(), JoinKeyMode::Exact);
    }

    #[test]
    fn normalized_key_expr_trims_and_lowercases() {
        assert_eq!(JoinKeyMode::Exact.key_expr("p.name"), "p.name");
        assert_eq!(
            JoinKeyMode::Normalized.key_expr("p.name"),
            "lower(trim(p.name))"
        );
    }

    #[test]
    fn deserializes_park_from_api_shaped_json() {
        let json = r#"{
            "name": "Zion National Park",
            "states": "UT",
            "latitude": "37.29839254",
            "longitude": "-113.0265138",
            "designation": "National Park",
            "activities": ["Hiking", "Camping"]
        }"#;
        let park: Park = serde_json::from_str(json).unwrap();
        assert_eq!(park.name, "Zion National Park");
        assert_eq!(park.state.as_deref(), Some("UT"));
        assert!((park.latitude.unwrap() - 37.298_392_54).abs() < 1e-9);
        assert_eq!(park.activities.as_deref(), Some("Hiking, Camping"));
        assert_eq!(park.description, None);
    }

    #[test]
    fn deserializes_thing_to_do_with_array_tags() {
        let json = r#"{
            "id": "a1",
            "parkName": "Zion",
            "title": " Angels Landing ",
            "tags": ["Hiking", "Scenic Views"]
        }"#;
        let thing: ThingToDo = serde_json::from_str(json).unwrap();
        assert_eq!(thing.activity_id, "a1");
        assert_eq!(thing.park_name, "Zion");
        assert_eq!(thing.tags.as_deref(), Some(r#"["Hiking","Scenic Views"]"#));
    }

    #[test]
    fn deserializes_thing_to_do_with_text_tags() {
        let json = r#"{"activity_id": "a2", "park_name": "Zion", "tags": "[\"Biking\"]"}"#;
        let thing: ThingToDo = serde_json::from_str(json).unwrap();
        assert_eq!(thing.tags.as_deref(), Some(r#"["Biking"]"#));
        assert_eq!(thing.duration, None);
    }
}
