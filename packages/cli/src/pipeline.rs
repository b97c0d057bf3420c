//! Full dashboard refresh.
//!
//! Chains load -> build -> verify -> hub -> rankings -> categories against a
//! single connection, with an `indicatif` step bar for feedback.

use std::path::PathBuf;
use std::time::Instant;

use duckdb::Connection;
use parks_dash_analytics::{AnalyticsError, aggregates, categories, join};
use parks_dash_analytics_models::{
    ActivityHub, AdventureCategoriesResult, BuildReport, JoinSummary, PowerRanking,
};
use parks_dash_cli_utils::{MultiProgress, StepProgress};
use parks_dash_database::{DbError, Namespace, load, source_db};
use parks_dash_park_models::JoinKeyMode;
use serde::Serialize;

/// Source files to load before building. Either may be omitted, in which
/// case the relation already in the database is used.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    /// Parks file (CSV, JSON, or JSON lines).
    pub parks: Option<PathBuf>,
    /// Things-to-do file (CSV, JSON, or JSON lines).
    pub things_to_do: Option<PathBuf>,
}

/// Row counts written by [`load_sources`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Rows written to `parks`, if loaded.
    pub parks: Option<u64>,
    /// Rows written to `thingstodo`, if loaded.
    pub things_to_do: Option<u64>,
}

/// Everything a full refresh produces.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Rows loaded from source files.
    pub load: LoadReport,
    /// Join build outcome.
    pub build: BuildReport,
    /// Verification counts, read back after the build.
    pub verify: JoinSummary,
    /// Activity hub rows.
    pub hub: Vec<ActivityHub>,
    /// Power rankings rows.
    pub rankings: Vec<PowerRanking>,
    /// Adventure categories rows and explode counters.
    pub categories: AdventureCategoriesResult,
}

/// Loads whichever source files are given.
///
/// # Errors
///
/// Returns [`DbError`] if a file cannot be read or written.
pub fn load_sources(
    conn: &Connection,
    ns: &Namespace,
    sources: &Sources,
) -> Result<LoadReport, DbError> {
    let mut report = LoadReport::default();

    if let Some(path) = &sources.parks {
        let parks = load::load_parks_file(path)?;
        report.parks = Some(source_db::replace_parks(conn, ns, &parks)?);
    }
    if let Some(path) = &sources.things_to_do {
        let things = load::load_things_to_do_file(path)?;
        report.things_to_do = Some(source_db::replace_things_to_do(conn, ns, &things)?);
    }

    Ok(report)
}

/// Runs every step in order.
///
/// # Errors
///
/// Returns [`AnalyticsError`] from the first step that fails; later steps
/// are not run.
pub fn run(
    multi: &MultiProgress,
    conn: &Connection,
    ns: &Namespace,
    join_key: JoinKeyMode,
    sources: &Sources,
) -> Result<RunReport, AnalyticsError> {
    let start = Instant::now();
    let steps = StepProgress::new(multi, "refresh", 6);

    let result = run_steps(&steps, conn, ns, join_key, sources);

    match &result {
        Ok(_) => {
            steps.finish("done");
            log::info!("Refresh finished in {:.1}s", start.elapsed().as_secs_f64());
        }
        Err(e) => {
            steps.abandon();
            log::error!("Refresh failed after {} steps: {e}", steps.position());
        }
    }

    result
}

fn run_steps(
    steps: &StepProgress,
    conn: &Connection,
    ns: &Namespace,
    join_key: JoinKeyMode,
    sources: &Sources,
) -> Result<RunReport, AnalyticsError> {
    steps.start("load");
    let load = load_sources(conn, ns, sources)?;
    steps.advance();

    steps.start("build");
    let build = join::build_park_activities(conn, ns, join_key)?;
    steps.advance();

    steps.start("verify");
    let verify = join::verify_park_activities(conn, ns)?;
    steps.advance();

    steps.start("hub");
    let hub = aggregates::activity_hub(conn, ns)?;
    steps.advance();

    steps.start("rankings");
    let rankings = aggregates::power_rankings(conn, ns)?;
    steps.advance();

    steps.start("categories");
    let categories = categories::adventure_categories(conn, ns)?;
    steps.advance();

    Ok(RunReport {
        load,
        build,
        verify,
        hub,
        rankings,
        categories,
    })
}
