//! Subprocess runner port.
//!
//! The step executor never spawns processes itself; it hands a fully
//! interpolated `CommandSpec` to a `CommandRunner`. The infra crate provides
//! the platform shell implementation, tests provide scripted doubles.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// A shell command ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Command line passed to the platform shell.
    pub command: String,
    /// Working directory. `None` inherits the engine's own.
    pub working_dir: Option<PathBuf>,
    /// Variables added on top of the inherited environment.
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
}

/// Captured result of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Failure message: trimmed stderr, or the exit status if stderr is empty.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.exit_code {
            Some(code) => format!("Command exited with code {code}"),
            None => "Command terminated by signal".to_string(),
        }
    }
}

/// Errors that prevent a command from producing an exit status.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to spawn command: {0}")]
    Spawn(String),

    #[error("Command timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("I/O error: {0}")]
    Io(String),
}

/// Runs shell commands with a timeout.
///
/// Implementations must stop the process once `spec.timeout` elapses and
/// return `CommandError::Timeout`.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        spec: &CommandSpec,
    ) -> impl std::future::Future<Output = Result<CommandOutput, CommandError>> + Send;
}

impl<T: CommandRunner> CommandRunner for Arc<T> {
    fn run(
        &self,
        spec: &CommandSpec,
    ) -> impl std::future::Future<Output = Result<CommandOutput, CommandError>> + Send {
        (**self).run(spec)
    }
}
