//! Execution log commands: `stats`, `logs` and `cleanup`.

use anyhow::{anyhow, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use hookflow_types::log::{ExecutionLogEntry, ExecutionStats, ExecutionStatus};

use super::print_json;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

pub async fn stats(state: &AppState, days: u32, json: bool) -> Result<()> {
    let stats = state
        .engine
        .execution_statistics(days)
        .await
        .map_err(|e| anyhow!("Failed to load execution statistics: {e}"))?;

    if json {
        return print_json(&stats);
    }

    println!();
    println!("  {}", style(format!("── Last {days} day(s) ──")).dim());
    println!("  Executions: {}", style(stats.total).bold());
    println!("  Succeeded:  {}", style(stats.succeeded).green());
    if stats.failed > 0 {
        println!("  Failed:     {}", style(stats.failed).red());
    }
    println!("  Avg time:   {}", format_ms(stats.average_duration_ms));
    println!("  Success:    {}", format_rate(&stats));
    println!();

    if stats.workflows.is_empty() {
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Workflow").fg(Color::Cyan),
            Cell::new("Runs"),
            Cell::new("OK"),
            Cell::new("Failed"),
            Cell::new("Avg"),
            Cell::new("Last run"),
        ]);

    for w in &stats.workflows {
        let failed = if w.failed > 0 {
            Cell::new(w.failed).fg(Color::Red)
        } else {
            Cell::new(w.failed)
        };
        table.add_row(vec![
            Cell::new(&w.workflow_name),
            Cell::new(w.total),
            Cell::new(w.succeeded),
            failed,
            Cell::new(format_ms(w.average_duration_ms)),
            Cell::new(
                w.last_run
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }

    println!("{table}");
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

pub async fn logs(
    state: &AppState,
    workflow: Option<&str>,
    limit: u32,
    json: bool,
) -> Result<()> {
    let entries = state
        .engine
        .recent_executions(workflow, limit)
        .await
        .map_err(|e| anyhow!("Failed to load execution log: {e}"))?;

    if json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!();
        match workflow {
            Some(id) => println!("  No executions recorded for '{id}'."),
            None => println!("  No executions recorded."),
        }
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Time").fg(Color::Cyan),
            Cell::new("Workflow"),
            Cell::new("Event"),
            Cell::new("Status"),
            Cell::new("Duration"),
            Cell::new("Steps"),
            Cell::new("Error"),
        ]);

    for entry in &entries {
        table.add_row(vec![
            Cell::new(entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(&entry.workflow_id),
            Cell::new(entry.event.as_str()),
            status_cell(entry.status),
            Cell::new(format!("{}ms", entry.duration_ms)),
            Cell::new(step_counts(entry)),
            Cell::new(entry.error.as_deref().unwrap_or("")),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

fn status_cell(status: ExecutionStatus) -> Cell {
    match status {
        ExecutionStatus::Success => Cell::new(status.as_str()).fg(Color::Green),
        ExecutionStatus::Error => Cell::new(status.as_str()).fg(Color::Red),
    }
}

/// `passed/total`, with skipped steps noted when present.
fn step_counts(entry: &ExecutionLogEntry) -> String {
    let passed = entry.steps.iter().filter(|s| s.success).count();
    let skipped = entry.steps.iter().filter(|s| s.skipped).count();
    let total = entry.steps.len();
    if skipped > 0 {
        format!("{passed}/{total} ({skipped} skipped)")
    } else {
        format!("{passed}/{total}")
    }
}

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

pub async fn cleanup(state: &AppState, retention_days: Option<u32>, json: bool) -> Result<()> {
    let retention_days = retention_days.unwrap_or(state.engine.config().log_retention_days);
    let deleted = state
        .engine
        .cleanup_old_logs(retention_days)
        .await
        .map_err(|e| anyhow!("Failed to clean up execution log: {e}"))?;

    if json {
        return print_json(&serde_json::json!({
            "retentionDays": retention_days,
            "deleted": deleted,
        }));
    }

    println!();
    println!(
        "  {} Removed {} execution log entr{} older than {} day(s)",
        style("*").green().bold(),
        style(deleted).bold(),
        if deleted == 1 { "y" } else { "ies" },
        retention_days
    );
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

fn format_ms(ms: f64) -> String {
    if ms >= 1_000.0 {
        format!("{:.1}s", ms / 1_000.0)
    } else {
        format!("{ms:.0}ms")
    }
}

fn format_rate(stats: &ExecutionStats) -> String {
    if stats.total == 0 {
        return "-".to_string();
    }
    format!("{:.1}%", stats.succeeded as f64 * 100.0 / stats.total as f64)
}
