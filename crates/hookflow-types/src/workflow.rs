//! Workflow domain types for hookflow.
//!
//! A `Workflow` binds one lifecycle event (`EventKind`) plus a trigger
//! condition to an ordered list of steps. Definitions arrive as JSON records
//! from a storage layer and are immutable once loaded: an edit replaces the
//! whole record.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Step timeout applied when a step does not declare one (30 seconds).
pub const DEFAULT_STEP_TIMEOUT_MS: u64 = 30_000;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// The fixed set of lifecycle events a workflow can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    PreToolUse,
    PostToolUse,
    PreChatMessage,
    PostChatMessage,
    FileChange,
    GitCommit,
    ProjectLoad,
    SessionStart,
    SessionEnd,
    Error,
}

impl EventKind {
    /// Every recognized event kind, in display order.
    pub const ALL: [EventKind; 10] = [
        EventKind::PreToolUse,
        EventKind::PostToolUse,
        EventKind::PreChatMessage,
        EventKind::PostChatMessage,
        EventKind::FileChange,
        EventKind::GitCommit,
        EventKind::ProjectLoad,
        EventKind::SessionStart,
        EventKind::SessionEnd,
        EventKind::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PreToolUse => "PreToolUse",
            EventKind::PostToolUse => "PostToolUse",
            EventKind::PreChatMessage => "PreChatMessage",
            EventKind::PostChatMessage => "PostChatMessage",
            EventKind::FileChange => "FileChange",
            EventKind::GitCommit => "GitCommit",
            EventKind::ProjectLoad => "ProjectLoad",
            EventKind::SessionStart => "SessionStart",
            EventKind::SessionEnd => "SessionEnd",
            EventKind::Error => "Error",
        }
    }

    /// Short human description, shown by `hookflow events`.
    pub fn description(&self) -> &'static str {
        match self {
            EventKind::PreToolUse => "Before a tool is invoked",
            EventKind::PostToolUse => "After a tool has completed",
            EventKind::PreChatMessage => "Before a chat message is sent",
            EventKind::PostChatMessage => "After a chat response is received",
            EventKind::FileChange => "A file in the project changed",
            EventKind::GitCommit => "A git commit was created",
            EventKind::ProjectLoad => "A project was opened",
            EventKind::SessionStart => "A session started",
            EventKind::SessionEnd => "A session ended",
            EventKind::Error => "An error was reported",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown event kind '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Workflow definition
// ---------------------------------------------------------------------------

/// A declarative automation pipeline bound to a trigger event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub trigger: Trigger,
    /// Ordered steps. Order matters for sequential mode and for result reporting.
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub settings: WorkflowSettings,
    /// Restricts the workflow to a single project. `None` means global.
    #[serde(default, alias = "projectPath", skip_serializing_if = "Option::is_none")]
    pub project_scope: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Workflow {
    /// Whether this workflow applies to a dispatch scoped to `project`.
    ///
    /// An unscoped workflow matches every project, and an unscoped dispatch
    /// matches every workflow. Otherwise both paths must be equal.
    pub fn matches_scope(&self, project: Option<&str>) -> bool {
        match (self.project_scope.as_deref(), project) {
            (Some(own), Some(requested)) => own == requested,
            _ => true,
        }
    }
}

/// The `(event, condition)` pair that decides whether a workflow fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub event: EventKind,
    #[serde(default)]
    pub condition: ConditionKind,
    /// Condition-specific parameters (`extension`, `tool`, `path`, `code`).
    #[serde(default)]
    pub condition_params: HashMap<String, serde_json::Value>,
}

impl Trigger {
    /// Look up a string-valued condition parameter.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.condition_params.get(key).and_then(|v| v.as_str())
    }
}

/// Built-in trigger condition kinds.
///
/// Unrecognized kinds deserialize to `Unknown`, which always fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    #[default]
    Always,
    FileType,
    ToolName,
    ProjectPath,
    Custom,
    #[serde(other)]
    Unknown,
}

/// Pipeline-level execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSettings {
    /// Run all steps concurrently instead of in order.
    #[serde(default)]
    pub parallel: bool,
    /// Abort the remaining sequential steps after a blocking failure.
    #[serde(default = "default_true")]
    pub stop_on_error: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            parallel: false,
            stop_on_error: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// One unit of work in a workflow pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// External hook to delegate to (`hook` steps).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_id: Option<String>,
    /// Shell command template (`command` steps).
    #[serde(default)]
    pub command: String,
    /// Per-attempt timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Extra attempts after the first failure.
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub continue_on_error: bool,
}

impl Step {
    /// Display name, falling back to the 1-based position label.
    pub fn display_name(&self, index: usize) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Step {}", index + 1),
        }
    }

    /// The declared timeout, or `default_ms` when the step has none.
    pub fn timeout_ms(&self, default_ms: u64) -> u64 {
        self.timeout.unwrap_or(default_ms)
    }

    /// Total number of attempts (`retries + 1`).
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// The kind of work a step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Hook,
    Command,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_workflow_deserializes_with_defaults() {
        let wf: Workflow = serde_json::from_value(json!({
            "id": "lint-on-save",
            "name": "Lint on save",
            "trigger": { "event": "FileChange" },
            "steps": [
                { "id": "lint", "type": "command", "command": "npm run lint" }
            ]
        }))
        .unwrap();

        assert_eq!(wf.trigger.event, EventKind::FileChange);
        assert_eq!(wf.trigger.condition, ConditionKind::Always);
        assert!(wf.enabled);
        assert!(!wf.settings.parallel);
        assert!(wf.settings.stop_on_error);
        assert!(wf.project_scope.is_none());

        let step = &wf.steps[0];
        assert_eq!(step.step_type, StepType::Command);
        assert_eq!(step.timeout_ms(DEFAULT_STEP_TIMEOUT_MS), DEFAULT_STEP_TIMEOUT_MS);
        assert_eq!(step.max_attempts(), 1);
        assert!(!step.continue_on_error);
    }

    #[test]
    fn test_workflow_deserializes_camel_case_fields() {
        let wf: Workflow = serde_json::from_value(json!({
            "id": "wf",
            "name": "wf",
            "trigger": {
                "event": "PostToolUse",
                "condition": "tool_name",
                "conditionParams": { "tool": "Edit" }
            },
            "steps": [{
                "id": "s1",
                "name": "Notify",
                "type": "hook",
                "hookId": "notify-slack",
                "timeout": 5000,
                "retries": 2,
                "continueOnError": true
            }],
            "settings": { "parallel": true, "stopOnError": false },
            "projectPath": "/work/app",
            "enabled": false
        }))
        .unwrap();

        assert_eq!(wf.trigger.condition, ConditionKind::ToolName);
        assert_eq!(wf.trigger.param_str("tool"), Some("Edit"));
        assert_eq!(wf.project_scope.as_deref(), Some("/work/app"));
        assert!(!wf.enabled);
        assert!(wf.settings.parallel);
        assert!(!wf.settings.stop_on_error);

        let step = &wf.steps[0];
        assert_eq!(step.hook_id.as_deref(), Some("notify-slack"));
        assert_eq!(step.max_attempts(), 3);
        assert_eq!(step.timeout_ms(DEFAULT_STEP_TIMEOUT_MS), 5_000);
        assert!(step.continue_on_error);
    }

    #[test]
    fn test_unknown_condition_kind_maps_to_unknown() {
        let trigger: Trigger = serde_json::from_value(json!({
            "event": "GitCommit",
            "condition": "branch_name"
        }))
        .unwrap();
        assert_eq!(trigger.condition, ConditionKind::Unknown);
    }

    #[test]
    fn test_unknown_event_kind_is_rejected() {
        let result: Result<Trigger, _> =
            serde_json::from_value(json!({ "event": "NotAnEvent" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_event_kind_from_str_is_case_insensitive() {
        assert_eq!("pretooluse".parse::<EventKind>().unwrap(), EventKind::PreToolUse);
        assert_eq!("GitCommit".parse::<EventKind>().unwrap(), EventKind::GitCommit);
        assert!("commit".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_step_display_name_falls_back_to_position() {
        let step: Step = serde_json::from_value(json!({
            "id": "s", "type": "command", "command": "true"
        }))
        .unwrap();
        assert_eq!(step.display_name(2), "Step 3");
    }

    #[test]
    fn test_matches_scope() {
        let mut wf: Workflow = serde_json::from_value(json!({
            "id": "wf", "name": "wf", "trigger": { "event": "ProjectLoad" }
        }))
        .unwrap();

        assert!(wf.matches_scope(None));
        assert!(wf.matches_scope(Some("/a")));

        wf.project_scope = Some("/a".to_string());
        assert!(wf.matches_scope(Some("/a")));
        assert!(!wf.matches_scope(Some("/b")));
        assert!(wf.matches_scope(None));
    }
}
