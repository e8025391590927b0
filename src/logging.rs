//! Tracing subscriber setup.
//!
//! Output goes to `<home>/logs/paneweave.log` so it never interleaves with
//! command output. `RUST_LOG` overrides the configured level.

use crate::config::LoggingConfig;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Builds the filter: `RUST_LOG` when set and valid, else the configured level, else `info`.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Subscriber writing plain (non-ANSI) lines to the given file.
pub fn build_subscriber(log_file: File, level: &str) -> impl tracing::Subscriber + Send + Sync {
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(build_filter(level))
}

/// Installs the global subscriber.
///
/// Returns false when logging could not be set up; the program keeps
/// running without a subscriber in that case.
pub fn init(home: &Path, config: &LoggingConfig) -> bool {
    if !config.file_log {
        return false;
    }
    let Ok(path) = crate::paths::log_path(home) else {
        return false;
    };
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return false;
    };
    build_subscriber(file, &config.level).try_init().is_ok()
}

#[cfg(test)]
#[path = "tests/logging_tests.rs"]
mod tests;
