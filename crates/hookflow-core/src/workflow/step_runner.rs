//! Step executor: runs one step with retries, backoff and a per-attempt timeout.
//!
//! `hook` steps delegate to the configured `HookExecutor`; without one they
//! fall back to a placeholder command that reports the hook as unavailable.
//! `command` steps are interpolated and handed to the `CommandRunner`.
//! Every failure mode ends up in the returned `StepResult`; nothing here
//! returns an error to the pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hookflow_types::config::EngineConfig;
use hookflow_types::execution::{ExecutionContext, StepResult};
use hookflow_types::workflow::{Step, StepType};
use tokio::time::Instant;

use super::command::{CommandRunner, CommandSpec};
use super::hook::{BoxHookExecutor, HookRequest};
use super::retry::BackoffPolicy;
use super::template::interpolate_command;

/// Error recorded when every attempt failed without a message.
pub const GENERIC_STEP_ERROR: &str = "Step execution failed";

pub struct StepExecutor<R> {
    runner: Arc<R>,
    hooks: Option<Arc<BoxHookExecutor>>,
    backoff: BackoffPolicy,
    default_timeout_ms: u64,
}

impl<R: CommandRunner> StepExecutor<R> {
    pub fn new(runner: Arc<R>, config: &EngineConfig) -> Self {
        Self {
            runner,
            hooks: None,
            backoff: BackoffPolicy::from_config(config),
            default_timeout_ms: config.default_step_timeout_ms,
        }
    }

    pub fn with_hook_executor(mut self, hooks: Arc<BoxHookExecutor>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Run `step` (at position `index`) until it succeeds or runs out of attempts.
    pub async fn execute(&self, step: &Step, index: usize, ctx: &ExecutionContext) -> StepResult {
        let step_name = step.display_name(index);
        let started = Instant::now();
        let attempts = step.max_attempts();
        let mut last_error: Option<String> = None;

        for attempt in 1..=attempts {
            match self.attempt(step, ctx).await {
                Ok(output) => {
                    tracing::debug!(step_id = %step.id, attempt, "step succeeded");
                    return StepResult {
                        step_id: step.id.clone(),
                        step_name,
                        success: true,
                        output,
                        error: None,
                        execution_time: elapsed_ms(started),
                        skipped: false,
                        continue_on_error: step.continue_on_error,
                    };
                }
                Err(error) => {
                    tracing::warn!(
                        step_id = %step.id,
                        attempt,
                        max_attempts = attempts,
                        error = %error,
                        "step attempt failed"
                    );
                    if !error.is_empty() {
                        last_error = Some(error);
                    }
                    if attempt < attempts {
                        tokio::time::sleep(self.backoff.delay_after(attempt)).await;
                    }
                }
            }
        }

        StepResult {
            step_id: step.id.clone(),
            step_name,
            success: false,
            output: String::new(),
            error: Some(last_error.unwrap_or_else(|| GENERIC_STEP_ERROR.to_string())),
            execution_time: elapsed_ms(started),
            skipped: false,
            continue_on_error: step.continue_on_error,
        }
    }

    /// One attempt. `Ok` carries the output, `Err` the failure message.
    async fn attempt(&self, step: &Step, ctx: &ExecutionContext) -> Result<String, String> {
        let timeout_ms = step.timeout_ms(self.default_timeout_ms);

        match step.step_type {
            StepType::Command => {
                let command = interpolate_command(&step.command, ctx);
                self.run_command(command, timeout_ms, ctx).await
            }
            StepType::Hook => {
                let hook_id = step.hook_id.as_deref().unwrap_or(step.id.as_str());
                match &self.hooks {
                    Some(hooks) => self.run_hook(hooks, hook_id, timeout_ms, ctx).await,
                    None => {
                        tracing::debug!(step_id = %step.id, hook_id, "no hook executor configured");
                        let placeholder = format!("echo \"Hook {hook_id} not available\"");
                        self.run_command(placeholder, timeout_ms, ctx).await
                    }
                }
            }
        }
    }

    async fn run_command(
        &self,
        command: String,
        timeout_ms: u64,
        ctx: &ExecutionContext,
    ) -> Result<String, String> {
        let spec = CommandSpec {
            command,
            working_dir: ctx.project_path.as_ref().map(PathBuf::from),
            env: workflow_env(ctx),
            timeout: Duration::from_millis(timeout_ms),
        };

        match self.runner.run(&spec).await {
            Ok(output) if output.success() => Ok(output.stdout.trim_end().to_string()),
            Ok(output) => Err(output.failure_message()),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn run_hook(
        &self,
        hooks: &BoxHookExecutor,
        hook_id: &str,
        timeout_ms: u64,
        ctx: &ExecutionContext,
    ) -> Result<String, String> {
        let request = HookRequest {
            event: ctx.event,
            data: ctx.data.clone(),
            project_path: ctx.project_path.clone(),
        };

        let call = hooks.test_hook(hook_id, &request);
        match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
            Err(_) => Err(format!("Hook timed out after {timeout_ms}ms")),
            Ok(Err(e)) => Err(e.to_string()),
            Ok(Ok(outcome)) if outcome.success => Ok(outcome.output.unwrap_or_default()),
            Ok(Ok(outcome)) => Err(outcome.error.unwrap_or_default()),
        }
    }
}

/// Variables exported to every subprocess a step spawns.
pub fn workflow_env(ctx: &ExecutionContext) -> Vec<(String, String)> {
    vec![
        ("WORKFLOW_EVENT".to_string(), ctx.event.as_str().to_string()),
        (
            "WORKFLOW_PROJECT_PATH".to_string(),
            ctx.project_path.clone().unwrap_or_default(),
        ),
        ("WORKFLOW_TIMESTAMP".to_string(), ctx.timestamp_iso()),
        ("WORKFLOW_DATA".to_string(), ctx.data.to_string()),
    ]
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
