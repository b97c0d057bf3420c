#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Join builder, verification, and dashboard aggregates.
//!
//! [`join`] rebuilds the denormalized `park_activities` relation from the
//! `parks` and `thingstodo` source tables. [`aggregates`] and
//! [`categories`] compute the three read-only views the dashboard widgets
//! bind to. [`queries`] holds the SQL texts for every step, rendered
//! against a typed namespace, so the same queries can be pasted into the
//! hosted analytics platform.

pub mod aggregates;
pub mod categories;
pub mod join;
pub mod queries;

use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Storage layer error.
    #[error("Database error: {0}")]
    Database(#[from] parks_dash_database::DbError),

    /// Query execution error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Converts a SQL `COUNT` result to `u64`.
fn count_to_u64(value: i64, column: &str) -> Result<u64, AnalyticsError> {
    u64::try_from(value).map_err(|_| AnalyticsError::Conversion {
        message: format!("Negative count {value} in column '{column}'"),
    })
}
