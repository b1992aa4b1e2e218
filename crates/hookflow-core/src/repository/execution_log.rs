//! Execution log repository trait and an in-memory implementation.
//!
//! The engine appends one entry per workflow run and reads aggregates back
//! for statistics. The infrastructure layer (hookflow-infra) implements the
//! trait with SQLite persistence.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hookflow_types::error::RepositoryError;
use hookflow_types::log::{ExecutionLogEntry, ExecutionStatus, WorkflowExecutionStats};
use tokio::sync::RwLock;

/// Repository trait for workflow execution logs.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ExecutionLogRepository: Send + Sync {
    /// Append one entry.
    fn append(
        &self,
        entry: &ExecutionLogEntry,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Most recent entries first, optionally for one workflow.
    fn list_recent(
        &self,
        workflow_id: Option<&str>,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ExecutionLogEntry>, RepositoryError>> + Send;

    /// Per-workflow aggregates over entries created at or after `since`.
    fn statistics(
        &self,
        since: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<WorkflowExecutionStats>, RepositoryError>> + Send;

    /// Delete entries created strictly before `cutoff`. Returns the number removed.
    fn delete_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}

/// Fold log entries into per-workflow statistics.
pub fn aggregate<'a>(
    entries: impl IntoIterator<Item = &'a ExecutionLogEntry>,
) -> Vec<WorkflowExecutionStats> {
    let mut by_workflow: HashMap<&str, (WorkflowExecutionStats, u64)> = HashMap::new();

    for entry in entries {
        let (stats, duration_sum) = by_workflow
            .entry(entry.workflow_id.as_str())
            .or_insert_with(|| {
                (
                    WorkflowExecutionStats {
                        workflow_id: entry.workflow_id.clone(),
                        workflow_name: entry.workflow_name.clone(),
                        total: 0,
                        succeeded: 0,
                        failed: 0,
                        average_duration_ms: 0.0,
                        last_run: None,
                    },
                    0,
                )
            });

        stats.total += 1;
        match entry.status {
            ExecutionStatus::Success => stats.succeeded += 1,
            ExecutionStatus::Error => stats.failed += 1,
        }
        *duration_sum += entry.duration_ms;
        if stats.last_run.is_none_or(|last| entry.created_at > last) {
            stats.last_run = Some(entry.created_at);
            stats.workflow_name = entry.workflow_name.clone();
        }
    }

    let mut out: Vec<_> = by_workflow
        .into_values()
        .map(|(mut stats, duration_sum)| {
            stats.average_duration_ms = duration_sum as f64 / stats.total as f64;
            stats
        })
        .collect();
    out.sort_by(|a, b| a.workflow_id.cmp(&b.workflow_id));
    out
}

/// Execution log held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryExecutionLog {
    entries: RwLock<Vec<ExecutionLogEntry>>,
}

impl InMemoryExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl ExecutionLogRepository for InMemoryExecutionLog {
    async fn append(&self, entry: &ExecutionLogEntry) -> Result<(), RepositoryError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn list_recent(
        &self,
        workflow_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ExecutionLogEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        let mut matching: Vec<_> = entries
            .iter()
            .filter(|e| workflow_id.is_none_or(|id| e.workflow_id == id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        matching.truncate(limit as usize);
        Ok(matching)
    }

    async fn statistics(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<WorkflowExecutionStats>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(aggregate(entries.iter().filter(|e| e.created_at >= since)))
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.created_at >= cutoff);
        Ok((before - entries.len()) as u64)
    }
}
