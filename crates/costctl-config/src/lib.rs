//! # costctl-config
//!
//! Loads the optional `costctl.yaml` file and resolves the effective report
//! settings from command-line overrides, the file, and built-in defaults, in
//! that order.
//!
//! ```yaml
//! # ~/.openclaw/costctl.yaml
//! period: week
//! format: text
//! concurrency: 4
//! log_dir: /var/log/costctl
//! ```

use std::path::{Path, PathBuf};

use costctl_core::{CostctlError, OutputFormat, Period, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of the configuration file looked up inside the data directory.
pub const CONFIG_FILE_NAME: &str = "costctl.yaml";

/// Name of the OpenClaw data directory under the user's home.
pub const DATA_DIR_NAME: &str = ".openclaw";

/// Contents of `costctl.yaml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostctlConfig {
    /// OpenClaw data directory containing `agents/`
    pub data_dir: Option<PathBuf>,

    /// Default output format
    pub format: Option<OutputFormat>,

    /// Default reporting period
    pub period: Option<Period>,

    /// Number of session files parsed in parallel
    pub concurrency: Option<usize>,

    /// Directory for JSON log files
    pub log_dir: Option<PathBuf>,
}

impl CostctlConfig {
    /// Parse configuration from YAML text. `path` is used for error context.
    pub fn from_yaml_str(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self =
            serde_yaml::from_str(content).map_err(|e| CostctlError::ConfigInvalid {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file that must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CostctlError::config_not_found_with_source(path, e))?;
        debug!(path = %path.display(), "loaded configuration");
        Self::from_yaml_str(&content, path)
    }

    /// Load a configuration file if present. `None` means it does not exist.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                debug!(path = %path.display(), "loaded configuration");
                Self::from_yaml_str(&content, path).map(Some)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CostctlError::io("reading configuration", path, e)),
        }
    }

    /// Check field values that YAML typing alone cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == Some(0) {
            return Err(CostctlError::ConfigValidation {
                message: "concurrency must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Values supplied on the command line, each taking precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub period: Option<Period>,
    pub concurrency: Option<usize>,
    pub log_dir: Option<PathBuf>,
}

/// Fully resolved settings for one report run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub format: OutputFormat,
    pub period: Period,
    pub concurrency: usize,
    pub log_dir: Option<PathBuf>,
    /// Configuration file the values were read from, if any
    pub config_file: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings, reading the configuration file as needed.
    ///
    /// An explicit `config_path` must exist. Otherwise `costctl.yaml` inside
    /// the data directory is used when present.
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        let base_dir = match &overrides.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };

        let (config, config_file) = match &overrides.config_path {
            Some(path) => (CostctlConfig::load(path)?, Some(path.clone())),
            None => {
                let path = default_config_path(&base_dir);
                match CostctlConfig::load_optional(&path)? {
                    Some(config) => (config, Some(path)),
                    None => (CostctlConfig::default(), None),
                }
            }
        };

        let mut settings = Self::merge(overrides, config, base_dir)?;
        settings.config_file = config_file;
        Ok(settings)
    }

    /// Merge overrides over a loaded configuration.
    ///
    /// The result has no `config_file`; [`resolve`](Self::resolve) records it.
    pub fn merge(
        overrides: Overrides,
        config: CostctlConfig,
        default_dir: PathBuf,
    ) -> Result<Self> {
        let concurrency = overrides.concurrency.or(config.concurrency).unwrap_or(1);
        if concurrency == 0 {
            return Err(CostctlError::invalid_argument(
                "concurrency",
                "0",
                "a positive integer",
            ));
        }

        Ok(Self {
            data_dir: overrides
                .data_dir
                .or(config.data_dir)
                .unwrap_or(default_dir),
            format: overrides.format.or(config.format).unwrap_or_default(),
            period: overrides.period.or(config.period).unwrap_or_default(),
            concurrency,
            log_dir: overrides.log_dir.or(config.log_dir),
            config_file: None,
        })
    }
}

/// Get the default OpenClaw data directory.
///
/// Returns `~/.openclaw`
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(DATA_DIR_NAME))
        .ok_or_else(|| CostctlError::internal("could not determine home directory"))
}

/// Path of the configuration file inside a data directory.
pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
}
