#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `DuckDB` storage for the parks dashboard.
//!
//! The source relations live under a typed [`namespace::Namespace`]: the
//! database file is attached under the catalog name and every table is
//! created inside `{catalog}.{schema}`. This mirrors the catalog/schema
//! layout of the hosted analytics platform, so the rendered query texts
//! run unchanged against either.

pub mod db;
pub mod load;
pub mod namespace;
pub mod paths;
pub mod source_db;

use thiserror::Error;

pub use namespace::{Identifier, Namespace, NamespaceError};

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV input could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON input could not be read.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog or schema identifier is invalid.
    #[error("Namespace error: {0}")]
    Namespace(#[from] NamespaceError),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
