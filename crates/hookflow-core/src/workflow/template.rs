//! Command template interpolation.
//!
//! Placeholders are substituted in a fixed order: `${event}`,
//! `${projectPath}`, `${timestamp}`, every `${data.KEY}`, and finally bare
//! `$ENV_VAR` references. Environment variables that are not set are left
//! untouched so the shell can still expand them.

use std::sync::LazyLock;

use hookflow_types::execution::ExecutionContext;
use regex::{Captures, Regex};
use serde_json::Value;

static DATA_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{data\.([^}]+)\}").expect("valid data placeholder regex"));

static ENV_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Z][A-Z0-9_]*)").expect("valid env reference regex"));

/// Interpolate `template` against the dispatch context and the process environment.
pub fn interpolate_command(template: &str, ctx: &ExecutionContext) -> String {
    interpolate_with_env(template, ctx, |name| std::env::var(name).ok())
}

/// Interpolate with a caller-supplied environment lookup.
pub fn interpolate_with_env<F>(template: &str, ctx: &ExecutionContext, env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let out = template
        .replace("${event}", ctx.event.as_str())
        .replace("${projectPath}", ctx.project_path.as_deref().unwrap_or(""))
        .replace("${timestamp}", &ctx.timestamp_iso());

    let out = DATA_PLACEHOLDER.replace_all(&out, |caps: &Captures<'_>| {
        ctx.data_field(&caps[1]).map(value_to_string).unwrap_or_default()
    });

    ENV_REFERENCE
        .replace_all(&out, |caps: &Captures<'_>| {
            env(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Strings are inserted raw; everything else uses its JSON form.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
