use async_trait::async_trait;
use log::{debug, info, warn};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::ExecutionError;
use crate::utils::shell::ShellDetector;

/// What happened to a command that was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Completed {
        exit_code: i32,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    /// Killed after the caller-supplied timeout expired.
    TimedOut { after: Duration },
}

impl ExecutionOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed { exit_code: 0, .. })
    }
}

#[async_trait]
pub trait ShellExecutor: Send + Sync {
    /// Runs `command` to completion. A non-zero exit is a normal outcome;
    /// `Err` only means the shell could not be started.
    async fn run(
        &self,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<ExecutionOutcome, ExecutionError>;
}

pub struct SystemShell {
    program: String,
    flag: &'static str,
}

impl Default for SystemShell {
    fn default() -> Self {
        let (program, flag) = ShellDetector::invocation();
        Self { program, flag }
    }
}

impl SystemShell {
    pub fn with_program(program: impl Into<String>, flag: &'static str) -> Self {
        Self {
            program: program.into(),
            flag,
        }
    }
}

#[async_trait]
impl ShellExecutor for SystemShell {
    async fn run(
        &self,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        debug!("Running via {} {}: {command}", self.program, self.flag);

        let child = Command::new(&self.program)
            .arg(self.flag)
            .arg(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let wait = child.wait_with_output();
        let output = match timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(output) => output,
                Err(_) => {
                    warn!("Command timed out after {limit:?}, child killed");
                    return Ok(ExecutionOutcome::TimedOut { after: limit });
                }
            },
            None => wait.await,
        }
        .map_err(|source| ExecutionError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // No code means the child died from a signal; report it like a shell does.
        let exit_code = output.status.code().unwrap_or_else(|| signal_exit_code(&output.status));
        info!("Command exited with code {exit_code}");

        Ok(ExecutionOutcome::Completed {
            exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(unix)]
fn signal_exit_code(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|sig| 128 + sig).unwrap_or(-1)
}

#[cfg(not(unix))]
fn signal_exit_code(_status: &std::process::ExitStatus) -> i32 {
    -1
}
