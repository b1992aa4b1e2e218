//! Shared test doubles for the workflow modules.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use hookflow_types::workflow::{
    ConditionKind, EventKind, Step, StepType, Trigger, Workflow, WorkflowSettings,
};

use super::command::{CommandError, CommandOutput, CommandRunner, CommandSpec};
use super::hook::{HookError, HookExecutor, HookOutcome, HookRequest};

pub fn workflow(id: &str, event: EventKind, steps: Vec<Step>) -> Workflow {
    Workflow {
        id: id.to_string(),
        name: format!("Workflow {id}"),
        description: None,
        trigger: Trigger {
            event,
            condition: ConditionKind::Always,
            condition_params: HashMap::new(),
        },
        steps,
        settings: WorkflowSettings::default(),
        project_scope: None,
        enabled: true,
    }
}

pub fn command_step(id: &str, command: &str) -> Step {
    Step {
        id: id.to_string(),
        name: None,
        step_type: StepType::Command,
        hook_id: None,
        command: command.to_string(),
        timeout: None,
        retries: 0,
        continue_on_error: false,
    }
}

pub fn hook_step(id: &str, hook_id: &str) -> Step {
    Step {
        step_type: StepType::Hook,
        hook_id: Some(hook_id.to_string()),
        ..command_step(id, "")
    }
}

pub fn exited(code: i32, stdout: &str, stderr: &str) -> Result<CommandOutput, CommandError> {
    Ok(CommandOutput {
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        exit_code: Some(code),
    })
}

/// Command runner that plays back scripted outcomes.
///
/// Commands with a queued script pop the next outcome. Otherwise commands
/// starting with `fail` exit 1 with stderr `<command> failed`, commands of
/// the form `sleep <ms>` wait on the tokio clock, and anything else succeeds
/// echoing the command line.
#[derive(Default)]
pub struct ScriptedRunner {
    scripts: Mutex<HashMap<String, VecDeque<Result<CommandOutput, CommandError>>>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(
        self,
        command: &str,
        outcomes: Vec<Result<CommandOutput, CommandError>>,
    ) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(command.to_string(), outcomes.into());
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(spec.clone());

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&spec.command)
            .and_then(VecDeque::pop_front);
        if let Some(outcome) = scripted {
            return outcome;
        }

        if spec.command.starts_with("fail") {
            return exited(1, "", &format!("{} failed", spec.command));
        }
        if let Some(ms) = spec.command.strip_prefix("sleep ") {
            let ms: u64 = ms.parse().unwrap();
            if Duration::from_millis(ms) > spec.timeout {
                tokio::time::sleep(spec.timeout).await;
                return Err(CommandError::Timeout {
                    timeout_ms: spec.timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        exited(0, &format!("{}\n", spec.command), "")
    }
}

/// Hook executor answering from a fixed table of outcomes.
#[derive(Default)]
pub struct FakeHooks {
    outcomes: HashMap<String, HookOutcome>,
    requests: Mutex<Vec<(String, HookRequest)>>,
}

impl FakeHooks {
    pub fn with(mut self, hook_id: &str, outcome: HookOutcome) -> Self {
        self.outcomes.insert(hook_id.to_string(), outcome);
        self
    }

    pub fn requests(&self) -> Vec<(String, HookRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

impl HookExecutor for FakeHooks {
    async fn test_hook(
        &self,
        hook_id: &str,
        request: &HookRequest,
    ) -> Result<HookOutcome, HookError> {
        self.requests
            .lock()
            .unwrap()
            .push((hook_id.to_string(), request.clone()));
        self.outcomes
            .get(hook_id)
            .cloned()
            .ok_or_else(|| HookError::NotFound(hook_id.to_string()))
    }
}
