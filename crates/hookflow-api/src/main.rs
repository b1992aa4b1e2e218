//! hookflow CLI entry point.
//!
//! Binary name: `hookflow`
//!
//! Parses CLI arguments, opens the execution log, loads workflow definitions
//! from the data directory, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity; RUST_LOG overrides
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,hookflow_core=debug,hookflow_infra=debug",
        _ => "trace",
    };
    hookflow_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    let outcome = run(cli).await;
    hookflow_observe::tracing_setup::shutdown_tracing();
    outcome
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "hookflow", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(cli.data_dir.clone()).await?;
    tracing::debug!(
        data_dir = %state.data_dir.display(),
        workflows = state.loaded,
        "application state ready"
    );

    match cli.command {
        Commands::Events => cli::events::list_events(&state, cli.json).await?,

        Commands::List => cli::workflow::list_workflows(&state, cli.json).await?,

        Commands::Dispatch {
            event,
            data,
            project,
        } => {
            cli::run::dispatch(&state, &event, data.as_deref(), project.as_ref(), cli.json)
                .await?;
        }

        Commands::Test {
            target,
            data,
            project,
            event,
        } => {
            cli::run::test(
                &state,
                &target,
                data.as_deref(),
                project.as_ref(),
                event.as_deref(),
                cli.json,
            )
            .await?;
        }

        Commands::Stats { days } => cli::logs::stats(&state, days, cli.json).await?,

        Commands::Logs { workflow, limit } => {
            cli::logs::logs(&state, workflow.as_deref(), limit, cli.json).await?;
        }

        Commands::Cleanup { retention_days } => {
            cli::logs::cleanup(&state, retention_days, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
