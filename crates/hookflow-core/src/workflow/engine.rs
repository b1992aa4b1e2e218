//! `WorkflowEngine` facade.
//!
//! Owns the workflow table/event index behind a `tokio::sync::RwLock`,
//! receives events via `process_event`, and records one execution log entry
//! per workflow run. Dispatch snapshots the candidate list under the read
//! lock and releases it before any step runs, so register/unregister never
//! wait on a running pipeline.

use std::sync::Arc;

use chrono::{Duration, Utc};
use hookflow_types::config::EngineConfig;
use hookflow_types::error::RepositoryError;
use hookflow_types::execution::{ExecutionContext, WorkflowResult};
use hookflow_types::log::{ExecutionLogEntry, ExecutionStats};
use hookflow_types::workflow::{EventKind, Workflow};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::repository::execution_log::ExecutionLogRepository;
use crate::repository::workflow_source::WorkflowSource;

use super::command::CommandRunner;
use super::condition::ConditionEvaluator;
use super::hook::BoxHookExecutor;
use super::pipeline::PipelineRunner;
use super::registry::{self, WorkflowRegistry};
use super::step_runner::StepExecutor;

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid workflow '{id}': {reason}")]
    InvalidWorkflow { id: String, reason: String },

    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// ---------------------------------------------------------------------------
// Test-run inputs
// ---------------------------------------------------------------------------

/// What `test_workflow` should run: a registered id or an inline definition.
#[derive(Debug, Clone)]
pub enum WorkflowRef {
    Id(String),
    Definition(Box<Workflow>),
}

/// Synthetic dispatch data for `test_workflow`.
#[derive(Debug, Clone, Default)]
pub struct TestContext {
    /// Defaults to the workflow's trigger event.
    pub event: Option<EventKind>,
    pub data: Value,
    pub project_path: Option<String>,
}

// ---------------------------------------------------------------------------
// WorkflowEngine
// ---------------------------------------------------------------------------

pub struct WorkflowEngine<R, L> {
    registry: RwLock<WorkflowRegistry>,
    runner: Arc<R>,
    pipeline: PipelineRunner<R>,
    log: L,
    config: EngineConfig,
}

impl<R, L> WorkflowEngine<R, L>
where
    R: CommandRunner + 'static,
    L: ExecutionLogRepository,
{
    pub fn new(runner: R, log: L, config: EngineConfig) -> Self {
        let runner = Arc::new(runner);
        let executor = StepExecutor::new(Arc::clone(&runner), &config);
        Self {
            registry: RwLock::new(WorkflowRegistry::new()),
            runner,
            pipeline: PipelineRunner::new(Arc::new(executor)),
            log,
            config,
        }
    }

    /// Route `hook` steps to an external executor instead of the placeholder command.
    pub fn with_hook_executor(mut self, hooks: BoxHookExecutor) -> Self {
        let executor = StepExecutor::new(Arc::clone(&self.runner), &self.config)
            .with_hook_executor(Arc::new(hooks));
        self.pipeline = PipelineRunner::new(Arc::new(executor));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn execution_log(&self) -> &L {
        &self.log
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register (or replace) a workflow under `id`.
    pub async fn register_workflow(&self, id: &str, workflow: Workflow) -> Result<(), EngineError> {
        let event = workflow.trigger.event;
        let replaced = self.registry.write().await.register(id, workflow)?;
        tracing::info!(workflow_id = %id, %event, replaced = replaced.is_some(), "workflow registered");
        Ok(())
    }

    /// Remove a workflow. Returns `false` if `id` was not registered.
    pub async fn unregister_workflow(&self, id: &str) -> bool {
        let removed = self.registry.write().await.unregister(id).is_some();
        if removed {
            tracing::info!(workflow_id = %id, "workflow unregistered");
        }
        removed
    }

    /// Register every enabled workflow from `source`.
    ///
    /// Invalid workflows are logged and skipped. Returns how many were registered.
    pub async fn load_from<S: WorkflowSource>(&self, source: &S) -> Result<usize, EngineError> {
        let workflows = source.load_workflows().await?;
        let mut registered = 0;

        for workflow in workflows.into_iter().filter(|w| w.enabled) {
            let id = workflow.id.clone();
            match self.register_workflow(&id, workflow).await {
                Ok(()) => registered += 1,
                Err(e) => tracing::warn!(workflow_id = %id, error = %e, "skipping workflow"),
            }
        }

        tracing::info!(registered, "workflows loaded");
        Ok(registered)
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Run every enabled, in-scope workflow subscribed to `event` whose
    /// trigger condition matches.
    ///
    /// Failures are reported inside the returned results; this never errors.
    pub async fn process_event(
        &self,
        event: EventKind,
        data: Value,
        project_path: Option<&str>,
    ) -> Vec<WorkflowResult> {
        let candidates = self.registry.read().await.candidates(event);
        if candidates.is_empty() {
            tracing::debug!(%event, "no workflows subscribed");
            return Vec::new();
        }

        let ctx = Arc::new(ExecutionContext::new(
            event,
            data,
            project_path.map(str::to_string),
        ));
        let mut results = Vec::new();

        for workflow in candidates {
            if !workflow.enabled {
                tracing::debug!(workflow_id = %workflow.id, "skipping disabled workflow");
                continue;
            }
            if !workflow.matches_scope(project_path) {
                tracing::debug!(workflow_id = %workflow.id, "skipping out-of-scope workflow");
                continue;
            }
            if !ConditionEvaluator::evaluate(&workflow.trigger, &ctx) {
                tracing::debug!(workflow_id = %workflow.id, "trigger condition not met");
                continue;
            }

            let result = self.pipeline.run(Arc::clone(&workflow), Arc::clone(&ctx)).await;

            let entry = ExecutionLogEntry::from_result(&result, event, project_path);
            if let Err(e) = self.log.append(&entry).await {
                tracing::warn!(workflow_id = %workflow.id, error = %e, "failed to record execution log");
            }
            results.push(result);
        }

        tracing::info!(%event, executed = results.len(), "event dispatched");
        results
    }

    /// Dry-run a workflow against synthetic data.
    ///
    /// The trigger condition is not evaluated and no log entry is written.
    /// Inline definitions do not need to be registered.
    pub async fn test_workflow(
        &self,
        target: WorkflowRef,
        test: TestContext,
    ) -> Result<WorkflowResult, EngineError> {
        let workflow = match target {
            WorkflowRef::Id(id) => self
                .registry
                .read()
                .await
                .get(&id)
                .ok_or(EngineError::WorkflowNotFound(id))?,
            WorkflowRef::Definition(definition) => {
                registry::validate(&definition.id, &definition)?;
                Arc::new(*definition)
            }
        };

        let event = test.event.unwrap_or(workflow.trigger.event);
        let ctx = Arc::new(ExecutionContext::new(event, test.data, test.project_path));
        tracing::info!(workflow_id = %workflow.id, %event, "test run");
        Ok(self.pipeline.run(workflow, ctx).await)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The fixed list of recognized events.
    pub fn available_events(&self) -> &'static [EventKind] {
        &EventKind::ALL
    }

    /// Registered workflows, sorted by id.
    pub async fn workflows(&self) -> Vec<Arc<Workflow>> {
        self.registry.read().await.workflows()
    }

    pub async fn get_workflow(&self, id: &str) -> Option<Arc<Workflow>> {
        self.registry.read().await.get(id)
    }

    /// Workflow ids subscribed to `event`, in dispatch order.
    pub async fn subscribers(&self, event: EventKind) -> Vec<String> {
        self.registry.read().await.subscribers(event)
    }

    // -----------------------------------------------------------------------
    // Execution log
    // -----------------------------------------------------------------------

    /// Aggregates over the last `days` days.
    pub async fn execution_statistics(&self, days: u32) -> Result<ExecutionStats, EngineError> {
        let since = Utc::now() - Duration::days(i64::from(days));
        let workflows = self.log.statistics(since).await?;
        Ok(ExecutionStats::from_workflows(days, workflows))
    }

    /// Delete log entries older than `retention_days`. Returns the number removed.
    pub async fn cleanup_old_logs(&self, retention_days: u32) -> Result<u64, EngineError> {
        let cutoff = Utc::now() - Duration::days(i64::from(retention_days));
        let deleted = self.log.delete_before(cutoff).await?;
        tracing::info!(retention_days, deleted, "old execution logs removed");
        Ok(deleted)
    }

    pub async fn recent_executions(
        &self,
        workflow_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ExecutionLogEntry>, EngineError> {
        Ok(self.log.list_recent(workflow_id, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::execution_log::InMemoryExecutionLog;
    use crate::workflow::hook::HookOutcome;
    use crate::workflow::testing::{FakeHooks, ScriptedRunner, command_step, hook_step, workflow};
    use hookflow_types::log::ExecutionStatus;
    use hookflow_types::workflow::ConditionKind;
    use serde_json::json;
    use uuid::Uuid;

    type TestEngine = WorkflowEngine<Arc<ScriptedRunner>, InMemoryExecutionLog>;

    fn engine() -> (Arc<ScriptedRunner>, TestEngine) {
        let runner = Arc::new(ScriptedRunner::new());
        let engine = WorkflowEngine::new(
            Arc::clone(&runner),
            InMemoryExecutionLog::new(),
            EngineConfig::default(),
        );
        (runner, engine)
    }

    fn simple(id: &str, event: EventKind) -> Workflow {
        workflow(id, event, vec![command_step("s1", &format!("echo {id}"))])
    }

    struct StaticSource(Vec<Workflow>);

    impl WorkflowSource for StaticSource {
        async fn load_workflows(&self) -> Result<Vec<Workflow>, RepositoryError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenLog;

    impl ExecutionLogRepository for BrokenLog {
        async fn append(&self, _: &ExecutionLogEntry) -> Result<(), RepositoryError> {
            Err(RepositoryError::Connection)
        }
        async fn list_recent(
            &self,
            _: Option<&str>,
            _: u32,
        ) -> Result<Vec<ExecutionLogEntry>, RepositoryError> {
            Err(RepositoryError::Connection)
        }
        async fn statistics(
            &self,
            _: chrono::DateTime<Utc>,
        ) -> Result<Vec<hookflow_types::log::WorkflowExecutionStats>, RepositoryError> {
            Err(RepositoryError::Connection)
        }
        async fn delete_before(&self, _: chrono::DateTime<Utc>) -> Result<u64, RepositoryError> {
            Err(RepositoryError::Connection)
        }
    }

    #[tokio::test]
    async fn test_dispatch_without_subscribers_is_empty() {
        let (runner, engine) = engine();
        engine.register_workflow("a", simple("a", EventKind::GitCommit)).await.unwrap();

        let results = engine.process_event(EventKind::FileChange, json!({}), None).await;

        assert!(results.is_empty());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_runs_each_matching_workflow_once_in_order() {
        let (_, engine) = engine();
        for id in ["first", "second", "third"] {
            engine.register_workflow(id, simple(id, EventKind::PostToolUse)).await.unwrap();
        }
        engine.register_workflow("other", simple("other", EventKind::PreToolUse)).await.unwrap();

        let results = engine.process_event(EventKind::PostToolUse, json!({}), None).await;

        let ids: Vec<_> = results.iter().map(|r| r.workflow_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(engine.execution_log().len().await, 3);
    }

    #[tokio::test]
    async fn test_disabled_and_out_of_scope_are_skipped_but_stay_indexed() {
        let (_, engine) = engine();
        let mut disabled = simple("disabled", EventKind::GitCommit);
        disabled.enabled = false;
        let mut scoped = simple("scoped", EventKind::GitCommit);
        scoped.project_scope = Some("/work/a".to_string());
        engine.register_workflow("disabled", disabled).await.unwrap();
        engine.register_workflow("scoped", scoped).await.unwrap();
        engine.register_workflow("global", simple("global", EventKind::GitCommit)).await.unwrap();

        let results = engine
            .process_event(EventKind::GitCommit, json!({}), Some("/work/b"))
            .await;
        let ids: Vec<_> = results.iter().map(|r| r.workflow_id.as_str()).collect();
        assert_eq!(ids, vec!["global"]);
        assert_eq!(engine.subscribers(EventKind::GitCommit).await.len(), 3);

        let results = engine
            .process_event(EventKind::GitCommit, json!({}), Some("/work/a"))
            .await;
        let ids: Vec<_> = results.iter().map(|r| r.workflow_id.as_str()).collect();
        assert_eq!(ids, vec!["scoped", "global"]);
    }

    #[tokio::test]
    async fn test_condition_filters_candidates() {
        let (_, engine) = engine();
        let mut wf = simple("commits", EventKind::PostToolUse);
        wf.trigger.condition = ConditionKind::Custom;
        wf.trigger
            .condition_params
            .insert("code".to_string(), json!("data.tool === 'git_commit'"));
        engine.register_workflow("commits", wf).await.unwrap();

        let hit = engine
            .process_event(EventKind::PostToolUse, json!({ "tool": "git_commit" }), None)
            .await;
        let miss = engine.process_event(EventKind::PostToolUse, json!({}), None).await;

        assert_eq!(hit.len(), 1);
        assert!(miss.is_empty());
    }

    #[tokio::test]
    async fn test_unregister_then_register_round_trip() {
        let (_, engine) = engine();
        engine.register_workflow("a", simple("a", EventKind::SessionStart)).await.unwrap();

        assert!(engine.unregister_workflow("a").await);
        assert!(engine.process_event(EventKind::SessionStart, json!({}), None).await.is_empty());
        assert!(engine.subscribers(EventKind::SessionStart).await.is_empty());
        assert!(!engine.unregister_workflow("a").await);

        engine.register_workflow("a", simple("a", EventKind::SessionStart)).await.unwrap();
        assert_eq!(engine.process_event(EventKind::SessionStart, json!({}), None).await.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_registration_is_rejected() {
        let (_, engine) = engine();
        let bad = workflow("bad", EventKind::GitCommit, vec![command_step("s", "")]);
        let err = engine.register_workflow("bad", bad).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidWorkflow { .. }));
        assert!(engine.workflows().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_from_registers_enabled_and_skips_invalid() {
        let (_, engine) = engine();
        let mut disabled = simple("off", EventKind::GitCommit);
        disabled.enabled = false;
        let invalid = workflow("broken", EventKind::GitCommit, vec![command_step("s", " ")]);
        let source = StaticSource(vec![
            simple("on", EventKind::GitCommit),
            disabled,
            invalid,
            simple("also-on", EventKind::FileChange),
        ]);

        let registered = engine.load_from(&source).await.unwrap();

        assert_eq!(registered, 2);
        let ids: Vec<_> = engine.workflows().await.iter().map(|w| w.id.clone()).collect();
        assert_eq!(ids, vec!["also-on", "on"]);
    }

    #[tokio::test]
    async fn test_log_failure_does_not_fail_dispatch() {
        let runner = Arc::new(ScriptedRunner::new());
        let engine = WorkflowEngine::new(runner, BrokenLog, EngineConfig::default());
        engine.register_workflow("a", simple("a", EventKind::Error)).await.unwrap();

        let results = engine.process_event(EventKind::Error, json!({}), None).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].success);
    }

    #[tokio::test]
    async fn test_failed_workflow_is_logged_as_error() {
        let (_, engine) = engine();
        let wf = workflow("wf", EventKind::GitCommit, vec![command_step("s", "fail hard")]);
        engine.register_workflow("wf", wf).await.unwrap();

        let results = engine
            .process_event(EventKind::GitCommit, json!({}), Some("/p"))
            .await;
        assert!(!results[0].success);

        let logged = engine.recent_executions(Some("wf"), 10).await.unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].status, ExecutionStatus::Error);
        assert_eq!(logged[0].project_path.as_deref(), Some("/p"));
        assert_eq!(logged[0].error, results[0].error);
    }

    #[tokio::test]
    async fn test_test_workflow_by_id_skips_condition_and_log() {
        let (_, engine) = engine();
        let mut wf = simple("a", EventKind::GitCommit);
        wf.trigger.condition = ConditionKind::Custom;
        wf.trigger.condition_params.insert("code".to_string(), json!("false"));
        engine.register_workflow("a", wf).await.unwrap();

        let result = engine
            .test_workflow(WorkflowRef::Id("a".to_string()), TestContext::default())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(engine.execution_log().len().await, 0);
    }

    #[tokio::test]
    async fn test_test_workflow_inline_definition_needs_no_registration() {
        let (runner, engine) = engine();
        let wf = workflow(
            "draft",
            EventKind::FileChange,
            vec![command_step("s", "check ${data.filePath} on ${event}")],
        );

        let result = engine
            .test_workflow(
                WorkflowRef::Definition(Box::new(wf)),
                TestContext {
                    event: None,
                    data: json!({ "filePath": "a.rs" }),
                    project_path: None,
                },
            )
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(runner.commands(), vec!["check a.rs on FileChange"]);
        assert!(engine.workflows().await.is_empty());
    }

    #[tokio::test]
    async fn test_test_workflow_unknown_id() {
        let (_, engine) = engine();
        let err = engine
            .test_workflow(WorkflowRef::Id("ghost".to_string()), TestContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::WorkflowNotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_hook_executor_is_used_for_hook_steps() {
        let runner = Arc::new(ScriptedRunner::new());
        let hooks = FakeHooks::default().with(
            "notify",
            HookOutcome {
                success: true,
                output: Some("ok".to_string()),
                ..Default::default()
            },
        );
        let engine = WorkflowEngine::new(
            Arc::clone(&runner),
            InMemoryExecutionLog::new(),
            EngineConfig::default(),
        )
        .with_hook_executor(BoxHookExecutor::new(hooks));
        engine
            .register_workflow("h", workflow("h", EventKind::SessionEnd, vec![hook_step("n", "notify")]))
            .await
            .unwrap();

        let results = engine.process_event(EventKind::SessionEnd, json!({}), None).await;

        assert_eq!(results[0].step_results[0].output, "ok");
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_old_logs_respects_retention() {
        let (_, engine) = engine();
        for (age, id) in [(45, "old"), (31, "older-than-window"), (29, "recent"), (0, "today")] {
            engine
                .execution_log()
                .append(&ExecutionLogEntry {
                    id: Uuid::now_v7(),
                    workflow_id: id.to_string(),
                    workflow_name: id.to_string(),
                    event: EventKind::GitCommit,
                    status: ExecutionStatus::Success,
                    duration_ms: 5,
                    error: None,
                    steps: vec![],
                    project_path: None,
                    created_at: Utc::now() - Duration::days(age),
                })
                .await
                .unwrap();
        }

        let deleted = engine.cleanup_old_logs(30).await.unwrap();

        assert_eq!(deleted, 2);
        let mut left: Vec<_> = engine
            .recent_executions(None, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.workflow_id)
            .collect();
        left.sort();
        assert_eq!(left, vec!["recent", "today"]);
    }

    #[tokio::test]
    async fn test_execution_statistics_rolls_up_dispatches() {
        let (_, engine) = engine();
        engine.register_workflow("ok", simple("ok", EventKind::GitCommit)).await.unwrap();
        engine
            .register_workflow(
                "bad",
                workflow("bad", EventKind::GitCommit, vec![command_step("s", "fail")]),
            )
            .await
            .unwrap();

        engine.process_event(EventKind::GitCommit, json!({}), None).await;
        engine.process_event(EventKind::GitCommit, json!({}), None).await;

        let stats = engine.execution_statistics(7).await.unwrap();
        assert_eq!(stats.days, 7);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.workflows.len(), 2);
    }

    #[test]
    fn test_available_events_is_fixed_list() {
        let (_, engine) = engine();
        let events = engine.available_events();
        assert_eq!(events.len(), 10);
        assert_eq!(events[0], EventKind::PreToolUse);
        assert_eq!(events[9], EventKind::Error);
    }
}
