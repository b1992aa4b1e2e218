//! CLI command definitions for the `hookflow` binary.
//!
//! Uses clap derive macros for argument parsing. Every command prints styled
//! text by default, or pretty JSON with `--json`.

pub mod events;
pub mod logs;
pub mod run;
pub mod workflow;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;
use serde_json::Value;

/// Run shell workflows in response to lifecycle events.
#[derive(Parser)]
#[command(name = "hookflow", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for dispatch details, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Data directory (defaults to $HOOKFLOW_DATA_DIR or ~/.hookflow).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Export tracing spans via OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the events a workflow can subscribe to.
    Events,

    /// List registered workflows.
    #[command(alias = "ls")]
    List,

    /// Dispatch an event to every subscribed workflow.
    Dispatch {
        /// Event name (e.g. FileChange, GitCommit).
        event: String,

        /// Event payload as a JSON object.
        #[arg(long)]
        data: Option<String>,

        /// Project the event belongs to.
        #[arg(long)]
        project: Option<PathBuf>,
    },

    /// Dry-run a workflow without checking its trigger condition.
    Test {
        /// Registered workflow id, or a path to a JSON definition file.
        target: String,

        /// Synthetic event payload as a JSON object.
        #[arg(long)]
        data: Option<String>,

        /// Project path for the synthetic event.
        #[arg(long)]
        project: Option<PathBuf>,

        /// Event to report (defaults to the workflow's trigger event).
        #[arg(long)]
        event: Option<String>,
    },

    /// Show execution statistics.
    Stats {
        /// Look-back window in days.
        #[arg(long, default_value = "7")]
        days: u32,
    },

    /// Show recent executions.
    Logs {
        /// Only show executions of this workflow.
        #[arg(long)]
        workflow: Option<String>,

        /// Maximum number of entries to display.
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Delete old execution log entries.
    Cleanup {
        /// Keep entries newer than this many days (defaults to config).
        #[arg(long)]
        retention_days: Option<u32>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Parse a `--data` argument. Missing data is an empty object.
pub fn parse_data(raw: Option<&str>) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Object(Default::default()));
    };
    let value: Value = serde_json::from_str(raw).context("Invalid JSON in --data")?;
    if !value.is_object() {
        anyhow::bail!("--data must be a JSON object");
    }
    Ok(value)
}

/// Render a path argument the way it is stored on workflows and log entries.
pub fn project_arg(project: Option<&PathBuf>) -> Option<String> {
    project.map(|p| p.display().to_string())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_dispatch_with_global_flags() {
        let cli = Cli::try_parse_from([
            "hookflow",
            "dispatch",
            "FileChange",
            "--data",
            r#"{"filePath":"a.rs"}"#,
            "--json",
            "-vv",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Dispatch { event, data, project } => {
                assert_eq!(event, "FileChange");
                assert_eq!(data.as_deref(), Some(r#"{"filePath":"a.rs"}"#));
                assert!(project.is_none());
            }
            _ => panic!("expected dispatch"),
        }
    }

    #[test]
    fn test_parse_data_defaults_to_empty_object() {
        assert_eq!(parse_data(None).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_parse_data_rejects_non_objects() {
        assert!(parse_data(Some("[1, 2]")).is_err());
        assert!(parse_data(Some("{ nope")).is_err());
        assert_eq!(
            parse_data(Some(r#"{"tool":"Edit"}"#)).unwrap()["tool"],
            "Edit"
        );
    }
}
