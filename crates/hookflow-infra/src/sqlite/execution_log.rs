//! SQLite execution log repository implementation.
//!
//! Implements `ExecutionLogRepository` from `hookflow-core` using sqlx with
//! split read/write pools. Step summaries are stored as a JSON array.
//! Timestamps are fixed-width RFC 3339 UTC strings, so string comparison in
//! SQL is chronological.

use chrono::{DateTime, SecondsFormat, Utc};
use hookflow_core::repository::execution_log::ExecutionLogRepository;
use hookflow_types::error::RepositoryError;
use hookflow_types::log::{ExecutionLogEntry, StepSummary, WorkflowExecutionStats};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ExecutionLogRepository`.
pub struct SqliteExecutionLog {
    pool: DatabasePool,
}

impl SqliteExecutionLog {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row types
// ---------------------------------------------------------------------------

struct LogRow {
    id: String,
    workflow_id: String,
    workflow_name: String,
    event: String,
    status: String,
    duration_ms: i64,
    error: Option<String>,
    step_results: String,
    project_path: Option<String>,
    created_at: String,
}

impl LogRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            workflow_id: row.try_get("workflow_id")?,
            workflow_name: row.try_get("workflow_name")?,
            event: row.try_get("event")?,
            status: row.try_get("status")?,
            duration_ms: row.try_get("duration_ms")?,
            error: row.try_get("error")?,
            step_results: row.try_get("step_results")?,
            project_path: row.try_get("project_path")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_entry(self) -> Result<ExecutionLogEntry, RepositoryError> {
        let steps: Vec<StepSummary> = serde_json::from_str(&self.step_results)
            .map_err(|e| RepositoryError::Query(format!("invalid step_results JSON: {e}")))?;

        Ok(ExecutionLogEntry {
            id: parse_uuid(&self.id)?,
            workflow_id: self.workflow_id,
            workflow_name: self.workflow_name,
            event: self.event.parse().map_err(RepositoryError::Query)?,
            status: self.status.parse().map_err(RepositoryError::Query)?,
            duration_ms: self.duration_ms.max(0) as u64,
            error: self.error,
            steps,
            project_path: self.project_path,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct StatsRow {
    workflow_id: String,
    workflow_name: String,
    total: i64,
    succeeded: i64,
    average_duration_ms: f64,
    last_run: String,
}

impl StatsRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            workflow_id: row.try_get("workflow_id")?,
            workflow_name: row.try_get("workflow_name")?,
            total: row.try_get("total")?,
            succeeded: row.try_get("succeeded")?,
            average_duration_ms: row.try_get("average_duration_ms")?,
            last_run: row.try_get("last_run")?,
        })
    }

    fn into_stats(self) -> Result<WorkflowExecutionStats, RepositoryError> {
        let total = self.total.max(0) as u64;
        let succeeded = self.succeeded.max(0) as u64;
        Ok(WorkflowExecutionStats {
            workflow_id: self.workflow_id,
            workflow_name: self.workflow_name,
            total,
            succeeded,
            failed: total.saturating_sub(succeeded),
            average_duration_ms: self.average_duration_ms,
            last_run: Some(parse_datetime(&self.last_run)?),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_uuid(s: &str) -> Result<Uuid, RepositoryError> {
    s.parse::<Uuid>()
        .map_err(|e| RepositoryError::Query(format!("invalid UUID: {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

// ---------------------------------------------------------------------------
// ExecutionLogRepository impl
// ---------------------------------------------------------------------------

impl ExecutionLogRepository for SqliteExecutionLog {
    async fn append(&self, entry: &ExecutionLogEntry) -> Result<(), RepositoryError> {
        let steps_json = serde_json::to_string(&entry.steps)
            .map_err(|e| RepositoryError::Query(format!("serialize step_results: {e}")))?;

        sqlx::query(
            r#"INSERT INTO workflow_execution_logs
                 (id, workflow_id, workflow_name, event, status, duration_ms, error,
                  step_results, project_path, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.workflow_id)
        .bind(&entry.workflow_name)
        .bind(entry.event.as_str())
        .bind(entry.status.as_str())
        .bind(entry.duration_ms as i64)
        .bind(&entry.error)
        .bind(&steps_json)
        .bind(&entry.project_path)
        .bind(format_datetime(&entry.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(())
    }

    async fn list_recent(
        &self,
        workflow_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ExecutionLogEntry>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT id, workflow_id, workflow_name, event, status, duration_ms, error,
                      step_results, project_path, created_at
               FROM workflow_execution_logs
               WHERE (?1 IS NULL OR workflow_id = ?1)
               ORDER BY created_at DESC, id DESC
               LIMIT ?2"#,
        )
        .bind(workflow_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter()
            .map(|row| LogRow::from_row(row).map_err(query_err)?.into_entry())
            .collect()
    }

    async fn statistics(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<WorkflowExecutionStats>, RepositoryError> {
        // The bare workflow_name column takes its value from the MAX(created_at) row.
        let rows = sqlx::query(
            r#"SELECT workflow_id,
                      workflow_name,
                      COUNT(*) AS total,
                      SUM(CASE WHEN status = 'success' THEN 1 ELSE 0 END) AS succeeded,
                      AVG(duration_ms) AS average_duration_ms,
                      MAX(created_at) AS last_run
               FROM workflow_execution_logs
               WHERE created_at >= ?
               GROUP BY workflow_id
               ORDER BY workflow_id"#,
        )
        .bind(format_datetime(&since))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter()
            .map(|row| StatsRow::from_row(row).map_err(query_err)?.into_stats())
            .collect()
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM workflow_execution_logs WHERE created_at < ?")
            .bind(format_datetime(&cutoff))
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        Ok(result.rows_affected())
    }
}
