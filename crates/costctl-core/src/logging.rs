//! Logging infrastructure for costctl.
//!
//! Diagnostics go to stderr so that report output on stdout stays clean and
//! can be piped into other tools. Warnings about skipped agents and session
//! files are always shown; `-v` and `-vv` raise the level to info and debug.
//!
//! When a log directory is supplied, a JSON lines file layer is added as well.
//!
//! ## Example
//!
//! ```no_run
//! use costctl_core::logging;
//!
//! let _guard = logging::init_logging(None, 0).expect("logging init");
//!
//! tracing::warn!(agent = "main", "sessions directory unreadable");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{CostctlError, Result};

/// File name used for the rolling JSON log.
pub const LOG_FILE_NAME: &str = "costctl.log";

/// Guard that must be held to ensure log flushing on shutdown.
///
/// Keep this guard alive for the lifetime of the application.
pub struct LogGuard {
    file_guard: Option<WorkerGuard>,
}

impl LogGuard {
    /// Returns true if a file layer was installed.
    pub fn has_file_output(&self) -> bool {
        self.file_guard.is_some()
    }
}

/// Map a `-v` count to the default level directive.
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Initialize the costctl logging system.
///
/// # Arguments
///
/// * `log_dir` - Optional directory for a daily-rolling `costctl.log` in JSON lines format.
/// * `verbosity` - Number of `-v` flags. `RUST_LOG` overrides it when set.
pub fn init_logging(log_dir: Option<PathBuf>, verbosity: u8) -> Result<LogGuard> {
    let default_level = level_for_verbosity(verbosity);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("costctl={default_level}")));

    let (file_layer, file_guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir).map_err(|e| CostctlError::DirectoryCreation {
                path: dir.clone(),
                source: e,
            })?;

            let file_appender = tracing_appender::rolling::daily(&dir, LOG_FILE_NAME);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .with_writer(non_blocking_file)
                .with_ansi(false)
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_span_list(true);

            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let verbose = verbosity > 1;
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| CostctlError::internal(format!("logging already initialized: {e}")))?;

    tracing::debug!(verbosity, file_output = file_guard.is_some(), "logging initialized");

    Ok(LogGuard {
        file_guard,
    })
}

/// Initialize minimal console-only logging for testing.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
