//! `config.toml` loading and path resolution.
//!
//! The file lives in the data directory. Every key is optional; see
//! [`EngineConfig`] for defaults.

use std::path::{Path, PathBuf};

use hookflow_types::config::EngineConfig;

use crate::filesystem::workflows_dir;
use crate::sqlite::pool::default_database_url;

/// Load `{data_dir}/config.toml`.
///
/// A missing file yields [`EngineConfig::default()`]. An unreadable or
/// malformed file is reported with a warning and also yields the defaults.
pub async fn load_engine_config(data_dir: &Path) -> EngineConfig {
    let path = data_dir.join("config.toml");
    let Some(content) = read_optional(&path).await else {
        return EngineConfig::default();
    };

    toml::from_str::<EngineConfig>(&content)
        .map(normalize)
        .unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "invalid config.toml, using defaults");
            EngineConfig::default()
        })
}

async fn read_optional(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Some(content),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config.toml, using defaults");
            None
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "unreadable config.toml, using defaults");
            None
        }
    }
}

/// The backoff cap may not be below the first delay.
fn normalize(mut config: EngineConfig) -> EngineConfig {
    if config.retry_max_delay_ms < config.retry_base_delay_ms {
        tracing::warn!(
            retry_base_delay_ms = config.retry_base_delay_ms,
            retry_max_delay_ms = config.retry_max_delay_ms,
            "retry_max_delay_ms below retry_base_delay_ms, raising it"
        );
        config.retry_max_delay_ms = config.retry_base_delay_ms;
    }
    config
}

/// Workflow directory from config, relative paths resolved against `data_dir`.
pub fn resolve_workflows_dir(config: &EngineConfig, data_dir: &Path) -> PathBuf {
    match &config.workflows_dir {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => data_dir.join(dir),
        None => workflows_dir(data_dir),
    }
}

/// Execution log database URL from config, or the default inside `data_dir`.
pub fn resolve_database_url(config: &EngineConfig, data_dir: &Path) -> String {
    config
        .database_url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}
