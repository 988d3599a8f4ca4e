//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use harvest_archive::MergePolicy;
use serde::Deserialize;

/// Global configuration for harvest
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub archive: ArchiveConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// CSV archive rewritten every run
    pub path: PathBuf,
    /// Parquet snapshot with the `new` flag (default: archive path with `.parquet`)
    pub snapshot: Option<PathBuf>,
    /// Where timestamped copies of the previous archive go
    pub backup_dir: PathBuf,
    pub compression_level: i32,
    /// `prefer-fresh` or `keep-archive`
    pub policy: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/papers.csv"),
            snapshot: None,
            backup_dir: PathBuf::from("./data/backups"),
            compression_level: 3,
            policy: "prefer-fresh".to_string(),
        }
    }
}

impl ArchiveConfig {
    pub fn merge_policy(&self) -> Result<MergePolicy> {
        self.policy
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("Invalid [archive] policy")
    }
}

/// Snapshot path for an archive: configured, or alongside it as `.parquet`
pub fn snapshot_path(archive: &Path, configured: Option<&Path>) -> PathBuf {
    configured
        .map(Path::to_path_buf)
        .unwrap_or_else(|| archive.with_extension("parquet"))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub lookback_days: u32,
    pub filter: String,
    pub result_type: String,
    pub page_size: u32,
    pub sort: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub email: Option<String>,
    pub page_delay_ms: u64,
    pub max_pages: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let defaults = harvest_epmc::Config::default();
        Self {
            base_url: defaults.base_url,
            lookback_days: defaults.lookback_days,
            filter: defaults.filter,
            result_type: defaults.result_type,
            page_size: defaults.page_size,
            sort: defaults.sort,
            email: std::env::var("EPMC_EMAIL").ok(),
            page_delay_ms: defaults.page_delay.as_millis() as u64,
            max_pages: defaults.max_pages,
        }
    }
}

impl SearchConfig {
    /// Harvester settings from the file values
    pub fn to_epmc(&self) -> harvest_epmc::Config {
        harvest_epmc::Config {
            base_url: self.base_url.clone(),
            lookback_days: self.lookback_days,
            filter: self.filter.clone(),
            result_type: self.result_type.clone(),
            page_size: self.page_size,
            sort: self.sort.clone(),
            email: self.email.clone(),
            page_delay: Duration::from_millis(self.page_delay_ms),
            max_pages: self.max_pages,
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./harvest.toml (current directory)
    /// 2. ~/.config/harvest/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("harvest.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "harvest") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
