//! Execution log records and aggregate statistics.
//!
//! One `ExecutionLogEntry` is appended per workflow run produced by a
//! dispatch. Entries are append-only and removed only by the retention sweep.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::execution::WorkflowResult;
use crate::workflow::EventKind;

/// Terminal status of a logged workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Error,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(ExecutionStatus::Success),
            "error" => Ok(ExecutionStatus::Error),
            other => Err(format!("invalid execution status: {other}")),
        }
    }
}

/// Condensed per-step record stored with a log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSummary {
    pub step_id: String,
    pub step_name: String,
    pub success: bool,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time: u64,
}

/// One persisted workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLogEntry {
    /// UUIDv7, so ids sort by creation time.
    pub id: Uuid,
    pub workflow_id: String,
    pub workflow_name: String,
    pub event: EventKind,
    pub status: ExecutionStatus,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub steps: Vec<StepSummary>,
    pub project_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ExecutionLogEntry {
    /// Build a log entry from a finished workflow run.
    pub fn from_result(
        result: &WorkflowResult,
        event: EventKind,
        project_path: Option<&str>,
    ) -> Self {
        let steps = result
            .step_results
            .iter()
            .map(|s| StepSummary {
                step_id: s.step_id.clone(),
                step_name: s.step_name.clone(),
                success: s.success,
                skipped: s.skipped,
                error: s.error.clone(),
                execution_time: s.execution_time,
            })
            .collect();

        Self {
            id: Uuid::now_v7(),
            workflow_id: result.workflow_id.clone(),
            workflow_name: result.workflow_name.clone(),
            event,
            status: if result.success {
                ExecutionStatus::Success
            } else {
                ExecutionStatus::Error
            },
            duration_ms: result.execution_time,
            error: result.error.clone(),
            steps,
            project_path: project_path.map(str::to_string),
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Aggregates for a single workflow over a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecutionStats {
    pub workflow_id: String,
    pub workflow_name: String,
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub average_duration_ms: f64,
    pub last_run: Option<DateTime<Utc>>,
}

/// Aggregates across all workflows over the last `days` days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStats {
    pub days: u32,
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub average_duration_ms: f64,
    pub workflows: Vec<WorkflowExecutionStats>,
}

impl ExecutionStats {
    /// Roll per-workflow rows up into window totals.
    pub fn from_workflows(days: u32, mut workflows: Vec<WorkflowExecutionStats>) -> Self {
        workflows.sort_by(|a, b| b.total.cmp(&a.total).then(a.workflow_id.cmp(&b.workflow_id)));

        let total: u64 = workflows.iter().map(|w| w.total).sum();
        let succeeded: u64 = workflows.iter().map(|w| w.succeeded).sum();
        let failed: u64 = workflows.iter().map(|w| w.failed).sum();
        let weighted: f64 = workflows
            .iter()
            .map(|w| w.average_duration_ms * w.total as f64)
            .sum();
        let average_duration_ms = if total == 0 {
            0.0
        } else {
            weighted / total as f64
        };

        Self {
            days,
            total,
            succeeded,
            failed,
            average_duration_ms,
            workflows,
        }
    }
}
