//! CLI configuration with TOML file support.
//!
//! Precedence, lowest first: built-in defaults, the TOML file, environment
//! variables (`BALLOT_*`), command-line flags. The last two are resolved by
//! clap and arrive here as [`Overrides`].

use std::path::{Path, PathBuf};

use anyhow::Context;
use ballot_engine::EngineConfig;
use ballot_store_lmdb::DEFAULT_MAP_SIZE;
use ballot_utils::LogFormat;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// LMDB data directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Filter directive, e.g. `"info"` or `"warn,ballot_engine=debug"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default)]
    pub engine: EngineConfig,
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub map_size_mb: Option<usize>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./ballot_data")
}

const MIB: usize = 1024 * 1024;

fn default_map_size_mb() -> usize {
    DEFAULT_MAP_SIZE / MIB
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl CliConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("invalid configuration")
    }

    /// Load `path` if given, else start from the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read config file {}", path.display()))?;
                Self::from_toml_str(&content)
                    .with_context(|| format!("in config file {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn with_overrides(self, overrides: Overrides) -> Self {
        Self {
            data_dir: overrides.data_dir.unwrap_or(self.data_dir),
            map_size_mb: overrides.map_size_mb.unwrap_or(self.map_size_mb),
            log_level: overrides.log_level.unwrap_or(self.log_level),
            log_format: overrides.log_format.unwrap_or(self.log_format),
            engine: self.engine,
        }
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(MIB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(CliConfig::from_toml_str("").unwrap(), CliConfig::default());
        assert_eq!(CliConfig::default().map_size_bytes(), DEFAULT_MAP_SIZE);
    }

    #[test]
    fn file_values_and_engine_table() {
        let config = CliConfig::from_toml_str(
            r#"
            data_dir = "/var/lib/ballot"
            log_format = "json"

            [engine]
            max_commit_retries = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/ballot"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.engine.max_commit_retries, 5);
        assert_eq!(config.map_size_mb, 256);
    }

    #[test]
    fn overrides_win_over_file() {
        let config = CliConfig::from_toml_str("map_size_mb = 64\nlog_level = \"warn\"")
            .unwrap()
            .with_overrides(Overrides {
                log_level: Some("debug".into()),
                ..Default::default()
            });
        assert_eq!(config.map_size_mb, 64);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.map_size_bytes(), 64 * 1024 * 1024);
    }

    #[test]
    fn unknown_format_rejected() {
        assert!(CliConfig::from_toml_str("log_format = \"xml\"").is_err());
    }
}
