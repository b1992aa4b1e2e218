//! Application state wiring the engine to its infrastructure.
//!
//! The engine is generic over its command runner and execution log; AppState
//! pins it to the shell runner and the SQLite log.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use hookflow_core::workflow::engine::WorkflowEngine;
use hookflow_infra::config::{load_engine_config, resolve_database_url, resolve_workflows_dir};
use hookflow_infra::filesystem::resolve_data_dir;
use hookflow_infra::filesystem::workflows::DirectoryWorkflowSource;
use hookflow_infra::process::ShellCommandRunner;
use hookflow_infra::sqlite::execution_log::SqliteExecutionLog;
use hookflow_infra::sqlite::pool::DatabasePool;

pub type ConcreteEngine = WorkflowEngine<ShellCommandRunner, SqliteExecutionLog>;

/// Shared state for every CLI command.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConcreteEngine>,
    pub data_dir: PathBuf,
    pub workflows_dir: PathBuf,
    /// Number of workflows loaded from `workflows_dir` at startup.
    pub loaded: usize,
}

impl AppState {
    /// Open the log database, build the engine and load workflow definitions.
    ///
    /// `data_dir` overrides `HOOKFLOW_DATA_DIR` and the `~/.hookflow` default.
    pub async fn init(data_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let data_dir = data_dir.unwrap_or_else(resolve_data_dir);

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = load_engine_config(&data_dir).await;
        let workflows_dir = resolve_workflows_dir(&config, &data_dir);
        let db_url = resolve_database_url(&config, &data_dir);

        let db_pool = DatabasePool::new(&db_url)
            .await
            .with_context(|| format!("Failed to open execution log database {db_url}"))?;

        let engine = WorkflowEngine::new(
            ShellCommandRunner::from_config(&config),
            SqliteExecutionLog::new(db_pool),
            config,
        );

        let loaded = load_workflows(&engine, &workflows_dir).await?;
        tracing::debug!(loaded, dir = %workflows_dir.display(), "workflows loaded");

        Ok(Self {
            engine: Arc::new(engine),
            data_dir,
            workflows_dir,
            loaded,
        })
    }
}

async fn load_workflows(engine: &ConcreteEngine, dir: &Path) -> anyhow::Result<usize> {
    let source = DirectoryWorkflowSource::new(dir);
    engine
        .load_from(&source)
        .await
        .with_context(|| format!("Failed to load workflows from {}", dir.display()))
}
