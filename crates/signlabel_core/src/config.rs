//! Labeler configuration file.
//!
//! # Responsibility
//! - Deserialize the TOML configuration used by the CLI and embedders.
//! - Resolve relative paths against the configuration file location.
//!
//! # Invariants
//! - Every optional key has a default; an empty file is a valid config
//!   apart from the required `catalog` table.

use crate::catalog::CatalogSource;
use crate::coverage::cache::DEFAULT_COVERAGE_TTL;
use crate::logging::default_log_level;
use crate::model::category::SelectionMode;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DB_FILE_NAME: &str = "labels.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "cannot read config `{}`: {message}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "invalid config `{}`: {message}", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

/// Runtime settings for one labeling deployment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelerConfig {
    /// SQLite file holding the `labels` table.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    pub catalog: CatalogSource,
    /// Prefix prepended to image identifiers for display.
    #[serde(default)]
    pub image_base_url: String,
    /// Directory with one sub-directory of example images per category.
    #[serde(default)]
    pub examples_dir: Option<PathBuf>,
    #[serde(default = "default_coverage_ttl_secs")]
    pub coverage_ttl_secs: u64,
    #[serde(default)]
    pub selection_mode: SelectionMode,
    #[serde(default = "default_level")]
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl LabelerConfig {
    /// Minimal config for a catalog source, everything else defaulted.
    pub fn new(catalog: CatalogSource) -> Self {
        Self {
            db_path: default_db_path(),
            catalog,
            image_base_url: String::new(),
            examples_dir: None,
            coverage_ttl_secs: default_coverage_ttl_secs(),
            selection_mode: SelectionMode::default(),
            log_level: default_level(),
            log_dir: None,
        }
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let mut config = Self::from_toml_str(&text).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        if let Some(base_dir) = path.parent() {
            config.resolve_relative_to(base_dir);
        }
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|err| err.to_string())
    }

    pub fn coverage_ttl(&self) -> Duration {
        Duration::from_secs(self.coverage_ttl_secs)
    }

    fn resolve_relative_to(&mut self, base_dir: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        };
        resolve(&mut self.db_path);
        match &mut self.catalog {
            CatalogSource::List(path) | CatalogSource::Directory(path) => resolve(path),
        }
        if let Some(dir) = self.examples_dir.as_mut() {
            resolve(dir);
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_FILE_NAME)
}

fn default_coverage_ttl_secs() -> u64 {
    DEFAULT_COVERAGE_TTL.as_secs()
}

fn default_level() -> String {
    default_log_level().to_string()
}
