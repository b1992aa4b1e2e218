//! Trigger condition evaluation.
//!
//! Built-in kinds are pure functions of `(conditionParams, context)`.
//! `custom` expressions fail closed (any error is a non-match) while
//! unrecognized kinds fail open (always fire).

use std::path::Path;

use hookflow_types::execution::ExecutionContext;
use hookflow_types::workflow::{ConditionKind, Trigger};
use serde_json::{Value, json};

use super::expression::Predicate;

/// Stateless evaluator for trigger conditions.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Whether `trigger` fires for the given dispatch context.
    pub fn evaluate(trigger: &Trigger, ctx: &ExecutionContext) -> bool {
        match trigger.condition {
            ConditionKind::Always => true,
            ConditionKind::FileType => Self::file_type(trigger, ctx),
            ConditionKind::ToolName => Self::tool_name(trigger, ctx),
            ConditionKind::ProjectPath => Self::project_path(trigger, ctx),
            ConditionKind::Custom => Self::custom(trigger, ctx),
            ConditionKind::Unknown => {
                tracing::debug!(event = %ctx.event, "unrecognized condition kind, firing");
                true
            }
        }
    }

    fn file_type(trigger: &Trigger, ctx: &ExecutionContext) -> bool {
        let Some(wanted) = trigger.param_str("extension") else {
            return false;
        };
        let Some(path) = file_path(ctx) else {
            return false;
        };
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == wanted.trim_start_matches('.'))
    }

    fn tool_name(trigger: &Trigger, ctx: &ExecutionContext) -> bool {
        let Some(wanted) = trigger.param_str("tool") else {
            return false;
        };
        ctx.data_str("tool")
            .or_else(|| ctx.data_str("tool_name"))
            .is_some_and(|tool| tool == wanted)
    }

    fn project_path(trigger: &Trigger, ctx: &ExecutionContext) -> bool {
        match (trigger.param_str("path"), ctx.project_path.as_deref()) {
            (Some(wanted), Some(project)) => project.contains(wanted),
            _ => false,
        }
    }

    fn custom(trigger: &Trigger, ctx: &ExecutionContext) -> bool {
        let code = match trigger.param_str("code").map(str::trim) {
            Some(code) if !code.is_empty() => code,
            _ => return true,
        };

        match Predicate::parse(code).and_then(|p| p.evaluate(&predicate_scope(ctx))) {
            Ok(fired) => fired,
            Err(e) => {
                tracing::warn!(event = %ctx.event, code, error = %e, "custom condition failed, treating as false");
                false
            }
        }
    }
}

/// Variables visible to `custom` expressions.
pub fn predicate_scope(ctx: &ExecutionContext) -> Value {
    json!({
        "event": ctx.event.as_str(),
        "data": ctx.data,
        "projectPath": ctx.project_path,
        "timestamp": ctx.timestamp_iso(),
    })
}

fn file_path(ctx: &ExecutionContext) -> Option<&str> {
    ctx.data_str("filePath")
        .or_else(|| ctx.data_str("file_path"))
        .or_else(|| {
            ctx.data_field("tool_input")
                .and_then(|input| input.get("file_path"))
                .and_then(Value::as_str)
        })
}
