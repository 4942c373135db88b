use serde::Deserialize;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{
    CONFIG_PATH_ENV, DATABASE_URL_ENV, DEFAULT_CONFIG_PATH, DEFAULT_DATABASE_URL, DEFAULT_EXPORT_DIR,
    DEFAULT_LOG_DIR,
};
use crate::error::{QcError, Result};
use crate::ingest::ViolationPolicy;
use crate::normalize::{Coercer, HeaderNormalizer, RowNormalizer, DEFAULT_SENTINELS};
use crate::store::Database;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub ingest: IngestConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path, `sqlite://path` or `:memory:`
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    pub on_schema_violation: ViolationPolicy,
    /// Cell texts read as a missing value
    pub missing_sentinels: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            on_schema_violation: ViolationPolicy::default(),
            missing_sentinels: DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
        }
    }
}

impl Config {
    /// Load from `path`, else `$COHORT_QC_CONFIG`, else `config.toml`.
    /// A missing default file yields the defaults; an explicitly named one
    /// must exist. `$DATABASE_URL` overrides the configured database.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        let config_path = explicit.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let config = match fs::read_to_string(&config_path) {
            Ok(content) => Self::from_toml_str(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound && explicit.is_none() => {
                debug!("No {} found; using defaults", config_path.display());
                Self::default()
            }
            Err(e) => {
                return Err(QcError::Config(format!(
                    "Failed to read config file '{}': {}",
                    config_path.display(),
                    e
                )))
            }
        };

        Ok(config.with_database_url(env::var(DATABASE_URL_ENV).ok()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn with_database_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.database.url = url;
        }
        self
    }

    pub fn database(&self) -> Database {
        Database::from_url(&self.database.url)
    }

    pub fn coercer(&self) -> Coercer {
        Coercer::with_sentinels(self.ingest.missing_sentinels.iter().cloned())
    }

    pub fn normalizer(&self) -> RowNormalizer {
        RowNormalizer::new(HeaderNormalizer::new(), self.coercer())
    }
}
