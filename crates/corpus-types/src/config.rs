//! Configuration loading for corpus-index.
//!
//! Layered: defaults -> config file -> explicit config file -> env vars.
//! The default config file lives at `~/.config/corpus-index/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::CorpusError;

/// Timing knobs for the indexing core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingSettings {
    /// Minimum age (seconds) a record must have before it is eligible.
    #[serde(default = "default_indexing_delay_secs")]
    pub indexing_delay_secs: u64,

    /// Interval (seconds) between "Done to" progress lines.
    #[serde(default = "default_progress_interval_secs")]
    pub progress_interval_secs: u64,

    /// Record queries slower than this (seconds) are reported.
    #[serde(default = "default_long_query_secs")]
    pub long_query_secs: u64,

    /// Lifetime of a run lease before another process may take it over.
    #[serde(default = "default_lease_ttl_secs")]
    pub lease_ttl_secs: u64,
}

fn default_indexing_delay_secs() -> u64 {
    5
}

fn default_progress_interval_secs() -> u64 {
    30
}

fn default_long_query_secs() -> u64 {
    5
}

fn default_lease_ttl_secs() -> u64 {
    3600
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            indexing_delay_secs: default_indexing_delay_secs(),
            progress_interval_secs: default_progress_interval_secs(),
            long_query_secs: default_long_query_secs(),
            lease_ttl_secs: default_lease_ttl_secs(),
        }
    }
}

impl IndexingSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.progress_interval_secs == 0 {
            return Err("progress_interval_secs must be > 0".to_string());
        }
        if self.lease_ttl_secs == 0 {
            return Err("lease_ttl_secs must be > 0".to_string());
        }
        Ok(())
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to RocksDB storage directory (area state, requests, leases)
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Path to the Tantivy index directory
    #[serde(default = "default_search_index_path")]
    pub search_index_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub indexing: IndexingSettings,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "corpus-index")
}

fn default_db_path() -> String {
    project_dirs()
        .map(|p| p.data_local_dir().join("db"))
        .unwrap_or_else(|| PathBuf::from("./data"))
        .to_string_lossy()
        .to_string()
}

fn default_search_index_path() -> String {
    project_dirs()
        .map(|p| p.data_local_dir().join("search-index"))
        .unwrap_or_else(|| PathBuf::from("./search-index"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            search_index_path: default_search_index_path(),
            log_level: default_log_level(),
            indexing: IndexingSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/corpus-index/config.toml)
    /// 3. Explicit config file (optional)
    /// 4. Environment variables (CORPUS_*, nested keys joined by `__`)
    pub fn load(config_path: Option<&str>) -> Result<Self, CorpusError> {
        let config_dir = project_dirs()
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");
        let indexing = IndexingSettings::default();

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| CorpusError::Config(e.to_string()))?
            .set_default("search_index_path", default_search_index_path())
            .map_err(|e| CorpusError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| CorpusError::Config(e.to_string()))?
            .set_default(
                "indexing.indexing_delay_secs",
                indexing.indexing_delay_secs as i64,
            )
            .map_err(|e| CorpusError::Config(e.to_string()))?
            .set_default(
                "indexing.progress_interval_secs",
                indexing.progress_interval_secs as i64,
            )
            .map_err(|e| CorpusError::Config(e.to_string()))?
            .set_default("indexing.long_query_secs", indexing.long_query_secs as i64)
            .map_err(|e| CorpusError::Config(e.to_string()))?
            .set_default("indexing.lease_ttl_secs", indexing.lease_ttl_secs as i64)
            .map_err(|e| CorpusError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // CORPUS_DB_PATH, CORPUS_INDEXING__INDEXING_DELAY_SECS, ...
        builder = builder.add_source(
            Environment::with_prefix("CORPUS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| CorpusError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| CorpusError::Config(e.to_string()))?;
        settings.indexing.validate().map_err(CorpusError::Config)?;
        Ok(settings)
    }

    /// Expand a leading `~/` in db_path.
    pub fn expanded_db_path(&self) -> PathBuf {
        expand_home(&self.db_path)
    }

    /// Expand a leading `~/` in search_index_path.
    pub fn expanded_search_index_path(&self) -> PathBuf {
        expand_home(&self.search_index_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
