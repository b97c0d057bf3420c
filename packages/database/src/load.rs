//! Reads connector export files into source rows.
//!
//! The format is chosen by file extension:
//!
//! * `.csv`: header row plus one record per line
//! * `.json`: a JSON array, or an API envelope `{"data": [...]}`
//! * `.jsonl` / `.ndjson`: one JSON object per line

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use parks_dash_park_models::{Park, ThingToDo};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::DbError;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// A single JSON document.
    Json,
    /// Newline-delimited JSON.
    JsonLines,
}

impl FileFormat {
    /// Detects the format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conversion`] if the extension is missing or not
    /// recognized.
    pub fn from_path(path: &Path) -> Result<Self, DbError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            Some("jsonl" | "ndjson") => Ok(Self::JsonLines),
            _ => Err(DbError::Conversion {
                message: format!(
                    "Unsupported file type '{}': expected .csv, .json, .jsonl, or .ndjson",
                    path.display()
                ),
            }),
        }
    }
}

/// Maps a CSV record onto its headers with every cell kept as a string.
/// csv's own deserializer infers numbers, which would turn `"00123"` into
/// `123` in text columns.
fn csv_row(headers: &csv::StringRecord, record: &csv::StringRecord) -> Value {
    Value::Object(
        headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.to_string(), Value::String(cell.to_string())))
            .collect(),
    )
}

/// Reads every record from `path`.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be opened or a record does not
/// match `T`.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DbError> {
    let format = FileFormat::from_path(path)?;
    let file = File::open(path)?;

    let records = match format {
        FileFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::Headers)
                .from_reader(file);
            let headers = reader.headers()?.clone();
            let mut out = Vec::new();
            for record in reader.records() {
                out.push(serde_json::from_value(csv_row(&headers, &record?))?);
            }
            out
        }
        FileFormat::Json => {
            let value: Value = serde_json::from_reader(BufReader::new(file))?;
            let items = match value {
                Value::Array(items) => items,
                Value::Object(mut map) => match map.remove("data") {
                    Some(Value::Array(items)) => items,
                    _ => {
                        return Err(DbError::Conversion {
                            message: format!(
                                "{}: expected a JSON array or an object with a 'data' array",
                                path.display()
                            ),
                        });
                    }
                },
                _ => {
                    return Err(DbError::Conversion {
                        message: format!("{}: expected a JSON array", path.display()),
                    });
                }
            };
            items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<T>, _>>()?
        }
        FileFormat::JsonLines => {
            let mut out = Vec::new();
            for line in BufReader::new(file).lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                out.push(serde_json::from_str(&line)?);
            }
            out
        }
    };

    log::debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Reads parks from a connector export file.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be read or parsed.
pub fn load_parks_file(path: &Path) -> Result<Vec<Park>, DbError> {
    read_records(path)
}

/// Reads things to do from a connector export file.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be read or parsed.
pub fn load_things_to_do_file(path: &Path) -> Result<Vec<ThingToDo>, DbError> {
    read_records(path)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn detects_format_from_extension() {
        assert_eq!(
            FileFormat::from_path(Path::new("parks.CSV")).unwrap(),
            FileFormat::Csv
        );
        assert_eq!(
            FileFormat::from_path(Path::new("things.ndjson")).unwrap(),
            FileFormat::JsonLines
        );
        assert!(FileFormat::from_path(Path::new("parks.parquet")).is_err());
        assert!(FileFormat::from_path(Path::new("parks")).is_err());
    }

    #[test]
    fn reads_parks_csv_with_blank_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "parks.csv",
            "name,state,latitude,longitude,description,designation,activities\n\
             Zion,UT,37.3,-113.0,Canyons,National Park,\"Hiking, Camping\"\n\
             Arches,UT,,,Arches,National Park,Hiking\n",
        );

        let parks = load_parks_file(&path).unwrap();
        assert_eq!(parks.len(), 2);
        assert_eq!(parks[0].name, "Zion");
        assert_eq!(parks[0].latitude, Some(37.3));
        assert_eq!(parks[0].activities.as_deref(), Some("Hiking, Camping"));
        assert_eq!(parks[1].latitude, None);
        assert_eq!(parks[1].longitude, None);
    }

    #[test]
    fn reads_things_to_do_csv_with_json_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "things.csv",
            "activity_id,park_name,title,duration,tags\n\
             a1,Zion,Angels Landing,4-5 Hours,\"[\"\"Hiking\"\"]\"\n\
             a2,Zion,Canyon Ride,,[]\n",
        );

        let things = load_things_to_do_file(&path).unwrap();
        assert_eq!(things.len(), 2);
        assert_eq!(things[0].tags.as_deref(), Some(r#"["Hiking"]"#));
        assert_eq!(things[1].duration, None);
        assert_eq!(things[1].tags.as_deref(), Some("[]"));
    }

    #[test]
    fn reads_json_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "parks.json",
            r#"{"total": "1", "data": [{"name": "Zion", "states": "UT", "latitude": "37.3", "longitude": "-113.0"}]}"#,
        );

        let parks = load_parks_file(&path).unwrap();
        assert_eq!(parks.len(), 1);
        assert_eq!(parks[0].state.as_deref(), Some("UT"));
    }

    #[test]
    fn reads_json_lines_skipping_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "things.jsonl",
            "{\"activity_id\": \"a1\", \"park_name\": \"Zion\", \"tags\": [\"Hiking\"]}\n\n\
             {\"activity_id\": \"a2\", \"park_name\": \"Zion\", \"tags\": [\"Biking\"]}\n",
        );

        let things = load_things_to_do_file(&path).unwrap();
        assert_eq!(things.len(), 2);
        assert_eq!(things[1].tags.as_deref(), Some(r#"["Biking"]"#));
    }

    #[test]
    fn rejects_json_scalar_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "parks.json", "42");
        assert!(matches!(
            load_parks_file(&path),
            Err(DbError::Conversion { .. })
        ));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "things.csv", "activity_id,title\na1,Hike\n");
        assert!(matches!(
            load_things_to_do_file(&path),
            Err(DbError::Json(_))
        ));
    }

    #[test]
    fn ragged_csv_row_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "things.csv", "activity_id,park_name\na1,Zion,extra\n");
        assert!(matches!(
            load_things_to_do_file(&path),
            Err(DbError::Csv(_))
        ));
    }

    #[test]
    fn csv_text_columns_keep_numeric_looking_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "things.csv",
            "activity_id,park_id,park_name,title,duration,tags\n\
             a1,00123,Zion,007,1.50,[]\n",
        );

        let things = load_things_to_do_file(&path).unwrap();
        assert_eq!(things[0].park_id.as_deref(), Some("00123"));
        assert_eq!(things[0].title.as_deref(), Some("007"));
        assert_eq!(things[0].duration.as_deref(), Some("1.50"));
        assert_eq!(things[0].tags.as_deref(), Some("[]"));
    }
}
