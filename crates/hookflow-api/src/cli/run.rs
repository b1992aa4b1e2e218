//! `hookflow dispatch` and `hookflow test`.
//!
//! Both commands print one block per workflow run: the overall outcome, then
//! one line per step in definition order.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use console::style;

use hookflow_core::workflow::engine::{TestContext, WorkflowRef};
use hookflow_infra::filesystem::workflows::parse_workflow_file;
use hookflow_types::execution::{StepResult, WorkflowResult};
use hookflow_types::workflow::EventKind;

use super::{parse_data, print_json, project_arg};
use crate::state::AppState;

pub fn parse_event(raw: &str) -> Result<EventKind> {
    raw.parse::<EventKind>().map_err(|e| {
        anyhow!("{e} (run `hookflow events` for the list of recognized events)")
    })
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub async fn dispatch(
    state: &AppState,
    event: &str,
    data: Option<&str>,
    project: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let event = parse_event(event)?;
    let data = parse_data(data)?;
    let project = project_arg(project);

    let results = state
        .engine
        .process_event(event, data, project.as_deref())
        .await;

    if json {
        return print_json(&results);
    }

    println!();
    if results.is_empty() {
        println!(
            "  No workflows ran for {}.",
            style(event.as_str()).cyan()
        );
        println!();
        return Ok(());
    }

    println!(
        "  {} {} workflow(s) ran for {}",
        style("*").bold(),
        results.len(),
        style(event.as_str()).cyan()
    );
    println!();
    for result in &results {
        print_result(result);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Test
// ---------------------------------------------------------------------------

pub async fn test(
    state: &AppState,
    target: &str,
    data: Option<&str>,
    project: Option<&PathBuf>,
    event: Option<&str>,
    json: bool,
) -> Result<()> {
    let event = event.map(parse_event).transpose()?;
    let data = parse_data(data)?;
    let project_path = project_arg(project);

    let mut results = Vec::new();
    for target in resolve_targets(target).await? {
        let test = TestContext {
            event,
            data: data.clone(),
            project_path: project_path.clone(),
        };
        let result = state
            .engine
            .test_workflow(target, test)
            .await
            .map_err(|e| anyhow!("Test run failed: {e}"))?;
        results.push(result);
    }

    if json {
        return print_json(&results);
    }

    println!();
    for result in &results {
        print_result(result);
    }

    Ok(())
}

/// A path to an existing file is a definition file; anything else is a registered id.
pub async fn resolve_targets(target: &str) -> Result<Vec<WorkflowRef>> {
    let path = Path::new(target);
    if !tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file()) {
        return Ok(vec![WorkflowRef::Id(target.to_string())]);
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let workflows = parse_workflow_file(&content)
        .with_context(|| format!("Failed to parse workflow file {}", path.display()))?;
    if workflows.is_empty() {
        bail!("No workflows defined in {}", path.display());
    }

    Ok(workflows
        .into_iter()
        .map(|w| WorkflowRef::Definition(Box::new(w)))
        .collect())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn print_result(result: &WorkflowResult) {
    let mark = if result.success {
        style("✓").green()
    } else {
        style("✗").red()
    };
    println!(
        "  {} {} {} {}",
        mark,
        style(&result.workflow_name).bold(),
        style(format!("({})", result.workflow_id)).dim(),
        style(format!("{}ms", result.execution_time)).dim()
    );

    for step in &result.step_results {
        println!("    {}", step_line(step));
    }

    if let Some(error) = &result.error {
        println!("    {}", style(error).red());
    }
    println!();
}

fn step_line(step: &StepResult) -> String {
    if step.skipped {
        return format!("{} {} {}", style("-").dim(), step.step_name, style("skipped").dim());
    }

    let mark = match (step.success, step.continue_on_error) {
        (true, _) => style("✓").green(),
        (false, true) => style("!").yellow(),
        (false, false) => style("✗").red(),
    };
    let mut line = format!(
        "{} {} {}",
        mark,
        step.step_name,
        style(format!("{}ms", step.execution_time)).dim()
    );
    if let Some(error) = &step.error {
        line.push_str(&format!("  {}", style(error).red()));
    }
    line
}
