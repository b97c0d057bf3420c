#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the parks dashboard toolchain.
//!
//! Loads the `parks` and `thingstodo` source relations, rebuilds
//! `park_activities`, and prints the dashboard aggregates. Every command
//! works against the catalog and schema resolved by [`config`].
//!
//! Uses `indicatif-log-bridge` (via [`parks_dash_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod config;
mod output;
mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use duckdb::Connection;
use parks_dash_analytics::{aggregates, categories, join, queries};
use parks_dash_analytics_models::QueryKind;
use parks_dash_database::{db, source_db};
use parks_dash_park_models::JoinKeyMode;
use serde::Serialize;

use crate::config::{Config, ConfigFile, Overrides};
use crate::output::OutputFormat;
use crate::pipeline::Sources;

#[derive(Parser)]
#[command(name = "parks_dash", about = "Parks dashboard data preparation")]
struct Cli {
    /// Config file (defaults to `parks_dash.toml` if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog holding the relations
    #[arg(long, global = true, env = "PARKS_DASH_CATALOG")]
    catalog: Option<String>,

    /// Schema holding the relations
    #[arg(long, global = true, env = "PARKS_DASH_SCHEMA")]
    schema: Option<String>,

    /// `DuckDB` file, or `:memory:`
    #[arg(long, global = true, env = "PARKS_DASH_DATABASE")]
    database: Option<PathBuf>,

    /// Join key comparison: `exact` or `normalized`
    #[arg(long, global = true, env = "PARKS_DASH_JOIN_KEY")]
    join_key: Option<JoinKeyMode>,

    /// Output format: `text` or `json`
    #[arg(long, global = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load source files into `parks` and `thingstodo`
    Load {
        /// Parks file (CSV, JSON, or JSON lines)
        #[arg(long)]
        parks: Option<PathBuf>,
        /// Things-to-do file (CSV, JSON, or JSON lines)
        #[arg(long)]
        things_to_do: Option<PathBuf>,
    },
    /// Rebuild `park_activities`
    Build,
    /// Print row, park, and activity counts of `park_activities`
    Verify,
    /// Print the activity hub (parks with coordinates)
    Hub,
    /// Print the top parks by activity count
    Rankings,
    /// Print the top activity types by number of parks
    Categories,
    /// Load (optional), build, verify, and compute every aggregate
    Run {
        /// Parks file to load first
        #[arg(long)]
        parks: Option<PathBuf>,
        /// Things-to-do file to load first
        #[arg(long)]
        things_to_do: Option<PathBuf>,
    },
    /// Print the SQL text for one or all queries
    Sql {
        /// Query to print; all queries when omitted
        #[arg(long)]
        query: Option<QueryKind>,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            catalog: self.catalog.clone(),
            schema: self.schema.clone(),
            database_path: self.database.clone(),
            join_key: self.join_key,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = parks_dash_cli_utils::init_logger();
    let cli = Cli::parse();

    let file = ConfigFile::read(cli.config.as_deref())?;
    let config = Config::resolve(file, cli.overrides())?;
    let ns = &config.namespace;
    let format = cli.format;

    let conn = || open(&config);

    match cli.command {
        Commands::Load {
            parks,
            things_to_do,
        } => {
            if parks.is_none() && things_to_do.is_none() {
                return Err("load needs --parks and/or --things-to-do".into());
            }
            let conn = conn()?;
            let report = pipeline::load_sources(&conn, ns, &Sources {
                parks,
                things_to_do,
            })?;
            if let Some(rows) = report.parks {
                log::info!("Loaded {rows} parks into {}", ns.table(source_db::PARKS_TABLE));
            }
            if let Some(rows) = report.things_to_do {
                log::info!(
                    "Loaded {rows} activities into {}",
                    ns.table(source_db::THINGS_TO_DO_TABLE)
                );
            }
            emit(format, &report, |r: &pipeline::LoadReport| {
                format!(
                    "parks: {}\nthings_to_do: {}\n",
                    r.parks.map_or_else(|| "-".to_string(), |n| n.to_string()),
                    r.things_to_do
                        .map_or_else(|| "-".to_string(), |n| n.to_string()),
                )
            })?;
        }
        Commands::Build => {
            let conn = conn()?;
            let report = join::build_park_activities(&conn, ns, config.join_key)?;
            if report.source_activities == 0 {
                log::warn!(
                    "{} is empty; load it with `parks_dash load`",
                    ns.table(source_db::THINGS_TO_DO_TABLE)
                );
            }
            emit(format, &report, output::build_report_text)?;
        }
        Commands::Verify => {
            let conn = conn()?;
            let summary = join::verify_park_activities(&conn, ns)?;
            emit(format, &summary, output::summary_text)?;
        }
        Commands::Hub => {
            let conn = conn()?;
            let hubs = aggregates::activity_hub(&conn, ns)?;
            emit(format, hubs.as_slice(), output::activity_hub_text)?;
        }
        Commands::Rankings => {
            let conn = conn()?;
            let rankings = aggregates::power_rankings(&conn, ns)?;
            emit(format, rankings.as_slice(), output::power_rankings_text)?;
        }
        Commands::Categories => {
            let conn = conn()?;
            let result = categories::adventure_categories(&conn, ns)?;
            emit(format, &result, output::adventure_categories_text)?;
        }
        Commands::Run {
            parks,
            things_to_do,
        } => {
            let conn = conn()?;
            let report = pipeline::run(&multi, &conn, ns, config.join_key, &Sources {
                parks,
                things_to_do,
            })?;
            emit(format, &report, |r: &pipeline::RunReport| {
                [
                    (QueryKind::Build, output::build_report_text(&r.build)),
                    (QueryKind::Verify, output::summary_text(&r.verify)),
                    (QueryKind::Hub, output::activity_hub_text(&r.hub)),
                    (QueryKind::Rankings, output::power_rankings_text(&r.rankings)),
                    (
                        QueryKind::Categories,
                        output::adventure_categories_text(&r.categories),
                    ),
                ]
                .into_iter()
                .map(|(kind, body)| format!("== {} ==\n{body}", kind.title()))
                .collect::<Vec<_>>()
                .join("\n")
            })?;
        }
        Commands::Sql { query } => {
            let kinds = query.map_or_else(|| QueryKind::ALL.to_vec(), |kind| vec![kind]);
            for kind in kinds {
                println!("-- {}", kind.title());
                println!("{}\n", queries::render(kind, ns, config.join_key).trim());
            }
        }
    }

    Ok(())
}

/// Opens the configured database with the source tables in place.
fn open(config: &Config) -> Result<Connection, Box<dyn std::error::Error>> {
    match &config.database_path {
        Some(path) => log::info!("Using database {}", path.display()),
        None => log::info!("Using in-memory database"),
    }

    let conn = db::open(config.database_path.as_deref(), &config.namespace)?;
    source_db::ensure_schema(&conn, &config.namespace)?;
    Ok(conn)
}

/// Prints `value` as JSON or through the given text renderer.
fn emit<T: Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<(), serde_json::Error> {
    match format {
        OutputFormat::Text => print!("{}", text(value)),
        OutputFormat::Json => println!("{}", output::to_json(value)?),
    }
    Ok(())
}
