//! Engine configuration types for hookflow.
//!
//! `EngineConfig` represents the top-level `config.toml` in the data
//! directory. Every field has a default, so an empty file is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::workflow::DEFAULT_STEP_TIMEOUT_MS;

/// Top-level configuration for the workflow engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Timeout for steps that do not declare one.
    #[serde(default = "default_step_timeout_ms")]
    pub default_step_timeout_ms: u64,

    /// Delay before the second attempt of a failing step.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Upper bound for a single backoff delay.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Time between the graceful termination signal and the forced kill.
    #[serde(default = "default_kill_grace_period_ms")]
    pub kill_grace_period_ms: u64,

    /// Default age limit used by the log cleanup sweep.
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u32,

    /// Directory of JSON workflow definitions. Defaults to `<data_dir>/workflows`.
    #[serde(default)]
    pub workflows_dir: Option<PathBuf>,

    /// Execution log database. Defaults to `sqlite://<data_dir>/hookflow.db`.
    #[serde(default)]
    pub database_url: Option<String>,
}

fn default_step_timeout_ms() -> u64 {
    DEFAULT_STEP_TIMEOUT_MS
}

fn default_retry_base_delay_ms() -> u64 {
    1_000
}

fn default_retry_max_delay_ms() -> u64 {
    10_000
}

fn default_kill_grace_period_ms() -> u64 {
    5_000
}

fn default_log_retention_days() -> u32 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_step_timeout_ms: default_step_timeout_ms(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            kill_grace_period_ms: default_kill_grace_period_ms(),
            log_retention_days: default_log_retention_days(),
            workflows_dir: None,
            database_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default_values() {
        let config = EngineConfig::default();
        assert_eq!(config.default_step_timeout_ms, 30_000);
        assert_eq!(config.retry_base_delay_ms, 1_000);
        assert_eq!(config.retry_max_delay_ms, 10_000);
        assert_eq!(config.kill_grace_period_ms, 5_000);
        assert_eq!(config.log_retention_days, 30);
        assert!(config.workflows_dir.is_none());
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_engine_config_deserialize_with_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_engine_config_deserialize_with_values() {
        let toml_str = r#"
default_step_timeout_ms = 5000
retry_max_delay_ms = 2000
log_retention_days = 7
workflows_dir = "/etc/hookflow/workflows"
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_step_timeout_ms, 5_000);
        assert_eq!(config.retry_base_delay_ms, 1_000);
        assert_eq!(config.retry_max_delay_ms, 2_000);
        assert_eq!(config.log_retention_days, 7);
        assert_eq!(
            config.workflows_dir,
            Some(PathBuf::from("/etc/hookflow/workflows"))
        );
    }
}
