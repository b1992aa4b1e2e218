//! Per-dispatch execution types: the context handed to conditions and steps,
//! and the result records returned to callers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::workflow::EventKind;

/// Message recorded on steps that never ran because an earlier step failed.
pub const SKIPPED_STEP_ERROR: &str = "Skipped due to previous step failure";

// ---------------------------------------------------------------------------
// ExecutionContext
// ---------------------------------------------------------------------------

/// Context built for one dispatch. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub event: EventKind,
    /// Free-form event payload. Always a JSON object.
    pub data: Value,
    pub project_path: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionContext {
    /// Build a context stamped with the current time.
    ///
    /// Non-object payloads are wrapped as `{ "value": <payload> }` so that
    /// `data.KEY` lookups stay well-defined.
    pub fn new(event: EventKind, data: Value, project_path: Option<String>) -> Self {
        let data = match data {
            Value::Object(_) => data,
            Value::Null => Value::Object(Map::new()),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Value::Object(map)
            }
        };

        Self {
            event,
            data,
            project_path,
            timestamp: Utc::now(),
        }
    }

    /// ISO-8601 timestamp used for templates and subprocess environment.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Look up a top-level key in the event payload.
    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Look up a string-valued top-level key in the event payload.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data_field(key).and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub step_id: String,
    pub step_name: String,
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    /// Wall-clock time across all attempts, in milliseconds.
    pub execution_time: u64,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub continue_on_error: bool,
}

impl StepResult {
    /// A step that was never attempted.
    pub fn skipped(step_id: &str, step_name: String, continue_on_error: bool) -> Self {
        Self {
            step_id: step_id.to_string(),
            step_name,
            success: false,
            output: String::new(),
            error: Some(SKIPPED_STEP_ERROR.to_string()),
            execution_time: 0,
            skipped: true,
            continue_on_error,
        }
    }

    /// Whether this result fails the pipeline.
    pub fn is_blocking_failure(&self) -> bool {
        !self.success && !self.continue_on_error
    }
}

/// Outcome of one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult {
    pub workflow_id: String,
    pub workflow_name: String,
    /// True iff every step succeeded or was allowed to fail.
    pub success: bool,
    pub step_results: Vec<StepResult>,
    /// First blocking failure, formatted as `Step "<name>" failed: <detail>`.
    pub error: Option<String>,
    pub execution_time: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_wraps_non_object_payload() {
        let ctx = ExecutionContext::new(EventKind::Error, json!("boom"), None);
        assert_eq!(ctx.data, json!({ "value": "boom" }));

        let ctx = ExecutionContext::new(EventKind::Error, Value::Null, None);
        assert_eq!(ctx.data, json!({}));
    }

    #[test]
    fn test_timestamp_iso_is_utc_millis() {
        let ctx = ExecutionContext::new(EventKind::SessionStart, json!({}), None);
        let iso = ctx.timestamp_iso();
        assert!(iso.ends_with('Z'));
        assert_eq!(iso.len(), "2024-01-01T00:00:00.000Z".len());
    }

    #[test]
    fn test_skipped_result_shape() {
        let r = StepResult::skipped("s3", "Deploy".to_string(), false);
        assert!(r.skipped);
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some(SKIPPED_STEP_ERROR));
        assert!(r.is_blocking_failure());
    }

    #[test]
    fn test_workflow_result_serializes_camel_case() {
        let result = WorkflowResult {
            workflow_id: "wf".to_string(),
            workflow_name: "Workflow".to_string(),
            success: true,
            step_results: vec![],
            error: None,
            execution_time: 12,
        };
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["workflowId"], json!("wf"));
        assert_eq!(v["stepResults"], json!([]));
        assert_eq!(v["executionTime"], json!(12));
    }
}
