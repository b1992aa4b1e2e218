//! Platform shell command runner.
//!
//! Implements `CommandRunner` from `hookflow-core` by spawning the command
//! line through `sh -c` (POSIX) or `cmd /C` (Windows). The shell is chosen
//! once when the runner is built.
//!
//! On unix each command runs in its own process group. When the timeout
//! fires, the whole group gets SIGTERM, then SIGKILL if it is still alive
//! after the grace period. The caller gets `CommandError::Timeout` right
//! away; termination finishes in a background task.

use std::process::Stdio;
use std::time::Duration;

use hookflow_core::workflow::command::{CommandError, CommandOutput, CommandRunner, CommandSpec};
use hookflow_types::config::EngineConfig;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Shell used to interpret command lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    /// `sh -c <line>`
    Posix,
    /// `cmd /C <line>`
    Cmd,
}

impl Shell {
    /// The shell for the platform this binary was built for.
    pub fn native() -> Self {
        if cfg!(windows) { Shell::Cmd } else { Shell::Posix }
    }

    fn command(&self, line: &str) -> Command {
        let (program, flag) = match self {
            Shell::Posix => ("sh", "-c"),
            Shell::Cmd => ("cmd", "/C"),
        };
        let mut command = Command::new(program);
        command.arg(flag).arg(line);
        command
    }
}

pub struct ShellCommandRunner {
    shell: Shell,
    grace_period: Duration,
}

impl ShellCommandRunner {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            shell: Shell::native(),
            grace_period,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(Duration::from_millis(config.kill_grace_period_ms))
    }

    pub fn shell(&self) -> Shell {
        self.shell
    }

    fn build(&self, spec: &CommandSpec) -> Command {
        let mut command = self.shell.command(&spec.command);
        command
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        command.process_group(0);
        command
    }
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl CommandRunner for ShellCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let mut child = self
            .build(spec)
            .spawn()
            .map_err(|e| CommandError::Spawn(e.to_string()))?;

        let stdout = read_pipe(child.stdout.take());
        let stderr = read_pipe(child.stderr.take());

        let waited = tokio::time::timeout(spec.timeout, child.wait()).await;
        match waited {
            Ok(status) => {
                let status = status.map_err(|e| CommandError::Io(e.to_string()))?;
                Ok(CommandOutput {
                    stdout: collect(stdout).await,
                    stderr: collect(stderr).await,
                    exit_code: status.code(),
                })
            }
            Err(_) => {
                let timeout_ms = spec.timeout.as_millis() as u64;
                tracing::warn!(command = %spec.command, timeout_ms, "command timed out, terminating");
                stdout.abort();
                stderr.abort();
                tokio::spawn(terminate(child, self.grace_period));
                Err(CommandError::Timeout { timeout_ms })
            }
        }
    }
}

fn read_pipe<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                tracing::debug!(error = %e, "failed to read command output");
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

async fn collect(handle: JoinHandle<String>) -> String {
    handle.await.unwrap_or_default()
}

/// Graceful then forced termination of a timed-out command.
async fn terminate(mut child: Child, grace_period: Duration) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        let group = -(pid as libc::pid_t);
        // SAFETY: kill(2) has no memory-safety preconditions; a negative pid
        // addresses the process group created with `process_group(0)`.
        unsafe {
            libc::kill(group, libc::SIGTERM);
        }
        if tokio::time::timeout(grace_period, child.wait()).await.is_ok() {
            return;
        }
        tracing::warn!(pid, "command ignored SIGTERM, killing process group");
        // SAFETY: as above.
        unsafe {
            libc::kill(group, libc::SIGKILL);
        }
    }

    #[cfg(not(unix))]
    let _ = grace_period;

    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "kill after timeout failed");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Instant;

    fn spec(command: &str, timeout_ms: u64) -> CommandSpec {
        CommandSpec {
            command: command.to_string(),
            working_dir: None,
            env: Vec::new(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[test]
    fn test_native_shell_is_posix() {
        assert_eq!(ShellCommandRunner::default().shell(), Shell::Posix);
    }

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let runner = ShellCommandRunner::default();
        let out = runner.run(&spec("echo hello; echo oops >&2", 5_000)).await.unwrap();

        assert!(out.success());
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_output_not_error() {
        let runner = ShellCommandRunner::default();
        let out = runner.run(&spec("echo bad >&2; exit 3", 5_000)).await.unwrap();

        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.failure_message(), "bad");
    }

    #[tokio::test]
    async fn test_env_and_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ShellCommandRunner::default();
        let mut spec = spec("echo \"$WORKFLOW_EVENT\"; pwd", 5_000);
        spec.env = vec![("WORKFLOW_EVENT".to_string(), "GitCommit".to_string())];
        spec.working_dir = Some(dir.path().to_path_buf());

        let out = runner.run(&spec).await.unwrap();

        let mut lines = out.stdout.lines();
        assert_eq!(lines.next(), Some("GitCommit"));
        let cwd = PathBuf::from(lines.next().unwrap());
        assert_eq!(
            cwd.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_timeout_resolves_promptly() {
        let runner = ShellCommandRunner::default();
        let started = Instant::now();

        let err = runner.run(&spec("sleep 5", 200)).await.unwrap_err();

        let elapsed = started.elapsed();
        assert!(matches!(err, CommandError::Timeout { timeout_ms: 200 }));
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(1_000), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn test_missing_working_dir_is_spawn_error() {
        let runner = ShellCommandRunner::default();
        let mut spec = spec("true", 5_000);
        spec.working_dir = Some(PathBuf::from("/definitely/not/a/dir"));

        let err = runner.run(&spec).await.unwrap_err();
        assert!(matches!(err, CommandError::Spawn(_)));
    }
}
