//! `hookflow list`: registered workflows with their trigger and step count.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use hookflow_types::workflow::{ConditionKind, Trigger, Workflow};

use crate::state::AppState;

pub async fn list_workflows(state: &AppState, json: bool) -> Result<()> {
    let workflows = state.engine.workflows().await;

    if json {
        let out: Vec<_> = workflows
            .iter()
            .map(|w| {
                serde_json::json!({
                    "id": w.id,
                    "name": w.name,
                    "event": w.trigger.event.as_str(),
                    "condition": condition_label(&w.trigger),
                    "steps": w.steps.len(),
                    "parallel": w.settings.parallel,
                    "enabled": w.enabled,
                    "projectScope": w.project_scope,
                })
            })
            .collect();
        return super::print_json(&out);
    }

    if workflows.is_empty() {
        println!();
        println!("  No workflows registered.");
        println!(
            "  Add JSON definitions to: {}",
            style(state.workflows_dir.display()).dim()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(Color::Cyan),
            Cell::new("Name"),
            Cell::new("Event"),
            Cell::new("Condition"),
            Cell::new("Steps"),
            Cell::new("Scope"),
        ]);

    for w in &workflows {
        table.add_row(vec![
            Cell::new(&w.id),
            Cell::new(&w.name),
            Cell::new(w.trigger.event.as_str()),
            Cell::new(condition_label(&w.trigger)),
            Cell::new(step_summary(w)),
            Cell::new(w.project_scope.as_deref().unwrap_or("global")),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

/// Condition kind plus its main parameter, e.g. `file_type(rs)`.
pub fn condition_label(trigger: &Trigger) -> String {
    let (name, param) = match trigger.condition {
        ConditionKind::Always => return "always".to_string(),
        ConditionKind::Unknown => return "unknown".to_string(),
        ConditionKind::FileType => ("file_type", "extension"),
        ConditionKind::ToolName => ("tool_name", "tool"),
        ConditionKind::ProjectPath => ("project_path", "path"),
        ConditionKind::Custom => ("custom", "code"),
    };
    match trigger.param_str(param) {
        Some(value) if !value.is_empty() => format!("{name}({value})"),
        _ => name.to_string(),
    }
}

fn step_summary(workflow: &Workflow) -> String {
    if workflow.settings.parallel {
        format!("{} (parallel)", workflow.steps.len())
    } else {
        workflow.steps.len().to_string()
    }
}
