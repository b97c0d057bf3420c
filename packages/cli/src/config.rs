//! Layered configuration.
//!
//! Settings come from a TOML file, overridden by environment variables and
//! command-line flags (clap merges those two, flag first). Catalog and
//! schema have no defaults: if no layer provides them, resolution fails
//! with [`ConfigError::Missing`] before any query runs.

use std::path::{Path, PathBuf};

use parks_dash_database::{Namespace, NamespaceError, paths};
use parks_dash_park_models::JoinKeyMode;
use serde::Deserialize;
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is not
/// given.
pub const DEFAULT_CONFIG_FILE: &str = "parks_dash.toml";

/// `database_path` value that selects an in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Catalog or schema is not a valid identifier.
    #[error("Invalid namespace: {0}")]
    Namespace(#[from] NamespaceError),

    /// A required setting was not provided by any layer.
    #[error("Missing {field}: set it in parks_dash.toml, via {env}, or with --{flag}")]
    Missing {
        /// Setting name.
        field: &'static str,
        /// Environment variable that provides it.
        env: &'static str,
        /// Command-line flag that provides it.
        flag: &'static str,
    },
}

/// Contents of the TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Catalog name.
    pub catalog: Option<String>,
    /// Schema name.
    pub schema: Option<String>,
    /// `DuckDB` file, or `:memory:`.
    pub database_path: Option<PathBuf>,
    /// Join key comparison.
    pub join_key: Option<JoinKeyMode>,
}

impl ConfigFile {
    /// Parses config file contents.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] on syntax errors or unknown keys.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads the config file.
    ///
    /// An explicitly requested file must exist. When `path` is `None`,
    /// [`DEFAULT_CONFIG_FILE`] is read if present and otherwise treated as
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn read(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                log::debug!("Read config from {}", path.display());
                Self::parse(&contents)
            }
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }
}

/// Environment-or-flag overrides, as parsed by clap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Catalog name.
    pub catalog: Option<String>,
    /// Schema name.
    pub schema: Option<String>,
    /// `DuckDB` file, or `:memory:`.
    pub database_path: Option<PathBuf>,
    /// Join key comparison.
    pub join_key: Option<JoinKeyMode>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where the relations live.
    pub namespace: Namespace,
    /// `DuckDB` file; `None` for an in-memory database.
    pub database_path: Option<PathBuf>,
    /// Join key comparison.
    pub join_key: JoinKeyMode,
}

impl Config {
    /// Merges `file` with `overrides`, overrides winning.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if catalog or schema is absent, or
    /// [`ConfigError::Namespace`] if either is not a valid identifier.
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> Result<Self, ConfigError> {
        let catalog = overrides
            .catalog
            .or(file.catalog)
            .ok_or(ConfigError::Missing {
                field: "catalog",
                env: "PARKS_DASH_CATALOG",
                flag: "catalog",
            })?;
        let schema = overrides
            .schema
            .or(file.schema)
            .ok_or(ConfigError::Missing {
                field: "schema",
                env: "PARKS_DASH_SCHEMA",
                flag: "schema",
            })?;
        let namespace = Namespace::new(&catalog, &schema)?;

        let database_path = match overrides.database_path.or(file.database_path) {
            Some(path) if path.as_os_str() == IN_MEMORY => None,
            Some(path) => Some(path),
            None => Some(paths::default_database_path()),
        };

        let join_key = overrides.join_key.or(file.join_key).unwrap_or_default();

        Ok(Self {
            namespace,
            database_path,
            join_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config_file() {
        let file = ConfigFile::parse(
            r#"
            catalog = "parks"
            schema = "nps"
            database_path = "data/test.duckdb"
            join_key = "normalized"
            "#,
        )
        .unwrap();
        assert_eq!(file.catalog.as_deref(), Some("parks"));
        assert_eq!(file.join_key, Some(JoinKeyMode::Normalized));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            ConfigFile::parse("catalog = \"parks\"\nwarehouse = \"x\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn overrides_win_over_file() {
        let file = ConfigFile {
            catalog: Some("parks".to_string()),
            schema: Some("nps".to_string()),
            database_path: None,
            join_key: Some(JoinKeyMode::Normalized),
        };
        let overrides = Overrides {
            schema: Some("staging".to_string()),
            join_key: Some(JoinKeyMode::Exact),
            ..Overrides::default()
        };

        let config = Config::resolve(file, overrides).unwrap();
        assert_eq!(config.namespace.to_string(), "parks.staging");
        assert_eq!(config.join_key, JoinKeyMode::Exact);
        assert_eq!(config.database_path, Some(paths::default_database_path()));
    }

    #[test]
    fn missing_catalog_is_a_config_error() {
        let err = Config::resolve(
            ConfigFile {
                schema: Some("nps".to_string()),
                ..ConfigFile::default()
            },
            Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { field: "catalog", .. }));
        assert!(err.to_string().contains("PARKS_DASH_CATALOG"));
    }

    #[test]
    fn placeholder_schema_is_rejected() {
        let err = Config::resolve(
            ConfigFile::default(),
            Overrides {
                catalog: Some("parks".to_string()),
                schema: Some("{schema}".to_string()),
                ..Overrides::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Namespace(_)));
    }

    #[test]
    fn memory_path_selects_in_memory_database() {
        let config = Config::resolve(
            ConfigFile::default(),
            Overrides {
                catalog: Some("parks".to_string()),
                schema: Some("nps".to_string()),
                database_path: Some(PathBuf::from(IN_MEMORY)),
                join_key: None,
            },
        )
        .unwrap();
        assert_eq!(config.database_path, None);
        assert_eq!(config.join_key, JoinKeyMode::Exact);
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            ConfigFile::read(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn reads_config_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parks_dash.toml");
        std::fs::write(&path, "catalog = \"parks\"\nschema = \"nps\"\n").unwrap();
        let file = ConfigFile::read(Some(&path)).unwrap();
        assert_eq!(file.schema.as_deref(), Some("nps"));
    }
}
