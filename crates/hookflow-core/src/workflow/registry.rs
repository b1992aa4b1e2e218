//! Workflow table and trigger/event index.
//!
//! Two owned collections: a table keyed by workflow id and an index from
//! event kind to an insertion-ordered set of ids. All mutation goes through
//! `register`/`unregister`, so the index never names an id that is missing
//! from the table and never holds an empty entry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use hookflow_types::workflow::{EventKind, StepType, Workflow};
use indexmap::IndexSet;

use super::engine::EngineError;

#[derive(Debug, Default)]
pub struct WorkflowRegistry {
    workflows: HashMap<String, Arc<Workflow>>,
    index: HashMap<EventKind, IndexSet<String>>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `workflow` under `id`, replacing any previous registration.
    ///
    /// Replacement is unregister-then-register, so an edited workflow whose
    /// trigger event changed leaves no stale index entry behind. Returns the
    /// replaced workflow, if any.
    pub fn register(
        &mut self,
        id: &str,
        workflow: Workflow,
    ) -> Result<Option<Arc<Workflow>>, EngineError> {
        validate(id, &workflow)?;

        let previous = self.unregister(id);
        let event = workflow.trigger.event;
        self.workflows.insert(id.to_string(), Arc::new(workflow));
        self.index.entry(event).or_default().insert(id.to_string());
        Ok(previous)
    }

    /// Remove `id` from its event entry (dropping the entry if it empties)
    /// and then from the table.
    pub fn unregister(&mut self, id: &str) -> Option<Arc<Workflow>> {
        let workflow = self.workflows.get(id)?;
        let event = workflow.trigger.event;

        if let Some(ids) = self.index.get_mut(&event) {
            ids.shift_remove(id);
            if ids.is_empty() {
                self.index.remove(&event);
            }
        }
        self.workflows.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Workflow>> {
        self.workflows.get(id).cloned()
    }

    /// Workflows subscribed to `event`, in registration order.
    pub fn candidates(&self, event: EventKind) -> Vec<Arc<Workflow>> {
        let Some(ids) = self.index.get(&event) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| {
                let found = self.workflows.get(id).cloned();
                if found.is_none() {
                    tracing::warn!(workflow_id = %id, %event, "index references unknown workflow");
                }
                found
            })
            .collect()
    }

    /// Ids in the index entry for `event`.
    pub fn subscribers(&self, event: EventKind) -> Vec<String> {
        self.index
            .get(&event)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every registered workflow, sorted by id.
    pub fn workflows(&self) -> Vec<Arc<Workflow>> {
        let mut all: Vec<_> = self.workflows.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}

/// Structural checks applied before a workflow is accepted.
pub fn validate(id: &str, workflow: &Workflow) -> Result<(), EngineError> {
    let invalid = |reason: String| EngineError::InvalidWorkflow {
        id: id.to_string(),
        reason,
    };

    if id.trim().is_empty() {
        return Err(invalid("workflow id must not be empty".to_string()));
    }
    if workflow.id != id {
        return Err(invalid(format!(
            "registered under '{id}' but definition has id '{}'",
            workflow.id
        )));
    }

    let mut seen = HashSet::new();
    for step in &workflow.steps {
        if !seen.insert(step.id.as_str()) {
            return Err(invalid(format!("duplicate step id '{}'", step.id)));
        }
        match step.step_type {
            StepType::Command if step.command.trim().is_empty() => {
                return Err(invalid(format!("command step '{}' has no command", step.id)));
            }
            StepType::Hook if step.hook_id.as_deref().is_none_or(str::is_empty) => {
                return Err(invalid(format!("hook step '{}' has no hookId", step.id)));
            }
            _ => {}
        }
    }
    Ok(())
}
