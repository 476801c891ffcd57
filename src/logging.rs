//! Tracing setup: a console layer plus an append-only audit log file.

use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// File name of the human-readable audit trail inside the logs directory.
pub const AUDIT_LOG_FILE: &str = "file_reorganization.log";

/// Installs the global subscriber.
///
/// Audit events go to `audit_dir/file_reorganization.log` when `audit_dir` is
/// given; pass `None` for runs that must not write anything. The console only
/// shows warnings unless `verbose` is set. `RUST_LOG` overrides the default
/// `info` filter.
///
/// The returned guard flushes the file writer when dropped, so keep it alive
/// until the program exits.
pub fn init_logging(audit_dir: Option<&Path>, verbose: bool) -> Result<Option<WorkerGuard>, String> {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(console_level);

    let (file_layer, guard) = match audit_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Could not create log directory {}: {}", dir.display(), e))?;
            let appender = tracing_appender::rolling::never(dir, AUDIT_LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| format!("Could not initialize logging: {}", e))?;

    Ok(guard)
}
