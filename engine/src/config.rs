//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables of the voting engine.
///
/// Usually embedded as the `[engine]` table of the CLI's TOML file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How many times a write that hit a transient store conflict is
    /// re-run before the conflict is surfaced. `0` disables retries.
    #[serde(default = "default_max_commit_retries")]
    pub max_commit_retries: u32,
}

fn default_max_commit_retries() -> u32 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_commit_retries: default_max_commit_retries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_uses_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_commit_retries, 3);
    }

    #[test]
    fn explicit_value_wins() {
        let config: EngineConfig = toml::from_str("max_commit_retries = 0").unwrap();
        assert_eq!(config.max_commit_retries, 0);
    }
}
