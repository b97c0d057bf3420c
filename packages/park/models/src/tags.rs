//! Parsing of the `tags` column.
//!
//! `tags` is stored as JSON array text. Parsing is total: every input maps
//! to a [`Tags`] value, and malformed text is reported through
//! [`Tags::Malformed`] instead of failing the whole aggregate.

/// The literal value the connector writes for "no tags".
pub const EMPTY_TAGS: &str = "[]";

/// Parsed form of a `tags` column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tags {
    /// The column was `NULL`.
    Missing,
    /// The column held an empty array.
    Empty,
    /// The column held a JSON array of strings.
    Parsed(Vec<String>),
    /// The column held something other than a JSON array of strings.
    Malformed {
        /// Parser error message.
        reason: String,
    },
}

/// Parses a raw `tags` column value.
///
/// Whitespace around each tag is trimmed and blank tags are dropped. An
/// array that contains only blank tags is [`Tags::Empty`].
#[must_use]
pub fn parse_tags(raw: Option<&str>) -> Tags {
    let Some(raw) = raw else {
        return Tags::Missing;
    };

    let raw = raw.trim();
    if raw == EMPTY_TAGS {
        return Tags::Empty;
    }

    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(values) => {
            let values: Vec<String> = values
                .into_iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            if values.is_empty() {
                Tags::Empty
            } else {
                Tags::Parsed(values)
            }
        }
        Err(e) => Tags::Malformed {
            reason: e.to_string(),
        },
    }
}
