//! Error types for costctl operations.
//!
//! [`CostctlError`] covers the failures that surface to the operator, mostly
//! configuration and argument problems.
//! Per-record and per-session problems inside the ingestion pipeline are not
//! represented here; they are logged and skipped by `costctl-cost`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`CostctlError`].
pub type Result<T> = std::result::Result<T, CostctlError>;

/// Error type for costctl operations outside the ingestion pipeline.
#[derive(Debug, Error)]
pub enum CostctlError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file not found
    #[error("Configuration not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file is invalid YAML
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Argument Errors
    // =========================================================================
    /// A command-line or configuration value could not be interpreted
    #[error("Invalid {name} '{value}': expected one of {expected}")]
    InvalidArgument {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error (bug in costctl)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CostctlError {
    /// Create a ConfigNotFound error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Create a ConfigNotFound error with source
    pub fn config_not_found_with_source(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigNotFound {
            path: path.into(),
            source: Some(source),
        }
    }

    /// Create an I/O error
    pub fn io(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(
        name: &'static str,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::InvalidArgument {
            name,
            value: value.into(),
            expected,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. } | Self::ConfigInvalid { .. } | Self::ConfigValidation { .. }
        )
    }

    /// Returns actionable guidance for the user
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound { .. } => {
                Some("Check the --config path, or omit it to use built-in defaults")
            }
            Self::ConfigInvalid { .. } => Some("Check YAML syntax in the configuration file"),
            Self::ConfigValidation { .. } => {
                Some("Fix the reported field in costctl.yaml or override it on the command line")
            }
            Self::DirectoryCreation { .. } => Some("Check permissions on the log directory"),
            Self::InvalidArgument { .. } => Some("Run 'costctl report --help' for accepted values"),
            _ => None,
        }
    }
}
