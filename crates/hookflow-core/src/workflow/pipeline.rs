//! Pipeline runner: orchestrates a workflow's steps.
//!
//! Sequential mode runs steps in order and, with `stopOnError`, marks the
//! remainder as skipped after the first blocking failure. Parallel mode
//! spawns every step on a `JoinSet` and waits for all of them; a failing
//! step never cancels its siblings. Results are always reported in step
//! order.

use std::sync::Arc;

use hookflow_types::execution::{ExecutionContext, StepResult, WorkflowResult};
use hookflow_types::workflow::Workflow;
use tokio::task::JoinSet;
use tokio::time::Instant;

use super::command::CommandRunner;
use super::step_runner::{GENERIC_STEP_ERROR, StepExecutor};

pub struct PipelineRunner<R> {
    executor: Arc<StepExecutor<R>>,
}

impl<R> Clone for PipelineRunner<R> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<R: CommandRunner + 'static> PipelineRunner<R> {
    pub fn new(executor: Arc<StepExecutor<R>>) -> Self {
        Self { executor }
    }

    pub async fn run(&self, workflow: Arc<Workflow>, ctx: Arc<ExecutionContext>) -> WorkflowResult {
        let started = Instant::now();
        tracing::info!(
            workflow_id = %workflow.id,
            event = %ctx.event,
            steps = workflow.steps.len(),
            parallel = workflow.settings.parallel,
            "running workflow"
        );

        let step_results = if workflow.settings.parallel {
            self.run_parallel(&workflow, &ctx).await
        } else {
            self.run_sequential(&workflow, &ctx).await
        };

        let success = step_results.iter().all(|r| !r.is_blocking_failure());
        let error = if !success && workflow.settings.stop_on_error {
            step_results
                .iter()
                .find(|r| r.is_blocking_failure() && !r.skipped)
                .map(|r| {
                    format!(
                        "Step \"{}\" failed: {}",
                        r.step_name,
                        r.error.as_deref().unwrap_or(GENERIC_STEP_ERROR)
                    )
                })
        } else {
            None
        };

        let execution_time = started.elapsed().as_millis() as u64;
        tracing::info!(
            workflow_id = %workflow.id,
            success,
            duration_ms = execution_time,
            "workflow finished"
        );

        WorkflowResult {
            workflow_id: workflow.id.clone(),
            workflow_name: workflow.name.clone(),
            success,
            step_results,
            error,
            execution_time,
        }
    }

    async fn run_sequential(&self, workflow: &Workflow, ctx: &ExecutionContext) -> Vec<StepResult> {
        let mut results = Vec::with_capacity(workflow.steps.len());

        for (index, step) in workflow.steps.iter().enumerate() {
            let result = self.executor.execute(step, index, ctx).await;
            let abort = result.is_blocking_failure() && workflow.settings.stop_on_error;
            results.push(result);

            if abort {
                tracing::debug!(
                    workflow_id = %workflow.id,
                    step_id = %step.id,
                    "stopping after failed step"
                );
                for (rest_index, rest) in workflow.steps.iter().enumerate().skip(index + 1) {
                    results.push(StepResult::skipped(
                        &rest.id,
                        rest.display_name(rest_index),
                        rest.continue_on_error,
                    ));
                }
                break;
            }
        }
        results
    }

    async fn run_parallel(
        &self,
        workflow: &Arc<Workflow>,
        ctx: &Arc<ExecutionContext>,
    ) -> Vec<StepResult> {
        let mut tasks = JoinSet::new();
        for index in 0..workflow.steps.len() {
            let executor = Arc::clone(&self.executor);
            let workflow = Arc::clone(workflow);
            let ctx = Arc::clone(ctx);
            tasks.spawn(async move {
                let result = executor.execute(&workflow.steps[index], index, &ctx).await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<StepResult>> = vec![None; workflow.steps.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!(workflow_id = %workflow.id, error = %e, "step task failed to join"),
            }
        }

        slots
            .into_iter()
            .zip(workflow.steps.iter().enumerate())
            .map(|(slot, (index, step))| {
                slot.unwrap_or_else(|| StepResult {
                    step_id: step.id.clone(),
                    step_name: step.display_name(index),
                    success: false,
                    output: String::new(),
                    error: Some("Step task aborted".to_string()),
                    execution_time: 0,
                    skipped: false,
                    continue_on_error: step.continue_on_error,
                })
            })
            .collect()
    }
}
