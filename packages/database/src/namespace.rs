//! Typed catalog/schema namespace.
//!
//! Query texts never take raw catalog or schema strings. They take a
//! [`Namespace`] whose parts were validated as plain SQL identifiers, so a
//! missing or malformed name is a configuration error raised before any
//! query runs rather than a resolution failure inside one.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap_or_else(|e| panic!("bad regex: {e}"))
});

/// Catalog names `DuckDB` reserves for its own databases.
const RESERVED_CATALOGS: &[&str] = &["memory", "system", "temp", "main"];

/// Errors raised while building a [`Namespace`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamespaceError {
    /// The identifier was empty.
    #[error("{part} name is empty")]
    Empty {
        /// Which part of the namespace (`catalog` or `schema`).
        part: &'static str,
    },

    /// The identifier contains characters outside `[A-Za-z0-9_]` or
    /// starts with a digit.
    #[error("{part} name '{value}' is not a valid identifier")]
    Invalid {
        /// Which part of the namespace.
        part: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The catalog name collides with a built-in `DuckDB` database.
    #[error("catalog name '{value}' is reserved")]
    Reserved {
        /// The rejected value.
        value: String,
    },
}

/// A validated SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    fn parse(part: &'static str, value: &str) -> Result<Self, NamespaceError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(NamespaceError::Empty { part });
        }
        if !IDENTIFIER_RE.is_match(value) {
            return Err(NamespaceError::Invalid {
                part,
                value: value.to_string(),
            });
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Identifier {
    type Err = NamespaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse("identifier", s)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The catalog and schema the source and derived relations live in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Namespace {
    catalog: Identifier,
    schema: Identifier,
}

impl Namespace {
    /// Builds a namespace from raw catalog and schema names.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError`] if either name is empty, is not a plain
    /// identifier, or the catalog name is reserved.
    pub fn new(catalog: &str, schema: &str) -> Result<Self, NamespaceError> {
        let catalog = Identifier::parse("catalog", catalog)?;
        if RESERVED_CATALOGS
            .iter()
            .any(|r| r.eq_ignore_ascii_case(catalog.as_str()))
        {
            return Err(NamespaceError::Reserved {
                value: catalog.0,
            });
        }
        let schema = Identifier::parse("schema", schema)?;
        Ok(Self { catalog, schema })
    }

    /// Catalog identifier.
    #[must_use]
    pub const fn catalog(&self) -> &Identifier {
        &self.catalog
    }

    /// Schema identifier.
    #[must_use]
    pub const fn schema(&self) -> &Identifier {
        &self.schema
    }

    /// Fully qualified `catalog.schema.table` name.
    #[must_use]
    pub fn table(&self, table: &str) -> String {
        format!("{}.{}.{table}", self.catalog, self.schema)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.catalog, self.schema)
    }
}
