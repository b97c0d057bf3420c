#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the parks dashboard toolchain.
//!
//! [`init_logger`] sets up `indicatif-log-bridge` so that `log::info!` and
//! friends are suspended while progress bars redraw, and [`StepProgress`]
//! wraps an `indicatif` bar for multi-step runs.

use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// A step-level progress bar (e.g., "build 1/5").
pub struct StepProgress {
    bar: ProgressBar,
}

impl StepProgress {
    /// Creates a bar with a known number of steps.
    #[must_use]
    pub fn new(multi: &MultiProgress, message: &str, total: u64) -> Self {
        let bar = multi.add(ProgressBar::new(total));
        bar.set_style(
            ProgressStyle::with_template(
                "{msg} {wide_bar:.green/dim} {pos}/{len} [{elapsed_precise}]",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
        );
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Marks the start of a named step.
    pub fn start(&self, step: &str) {
        self.bar.set_message(step.to_string());
    }

    /// Marks the current step as finished.
    pub fn advance(&self) {
        self.bar.inc(1);
    }

    /// Finishes the bar, leaving `msg` on screen.
    pub fn finish(&self, msg: &str) {
        self.bar.finish_with_message(msg.to_string());
    }

    /// Removes the bar without a final message.
    pub fn abandon(&self) {
        self.bar.finish_and_clear();
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge`.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Ignore error if logger was already set (e.g., in tests)

    log::set_max_level(level);

    multi
}
