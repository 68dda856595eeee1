// ── External command execution ──
//
// The boundary to the `kn` binary. An executor never fails the call
// itself: spawn errors, timeouts, and non-zero exits come back inside
// `CliExitData` so the caller decides what counts as fatal.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::CoreError;

// ── CliCommand ──────────────────────────────────────────────────────

/// A program plus its argument vector. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CliCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CliCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ── CliExitData ─────────────────────────────────────────────────────

/// Why an invocation did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// The program could not be started (missing binary, permissions).
    Spawn { reason: String },
    /// The program did not finish within the configured timeout.
    TimedOut { after: Duration },
    /// The program exited non-zero. `None` when killed by a signal.
    ExitStatus { code: Option<i32> },
}

/// Raw result of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliExitData {
    pub stdout: String,
    pub stderr: String,
    pub error: Option<ExecError>,
}

impl CliExitData {
    /// A successful run that printed `stdout`.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    /// A run that exited with `code` after printing `stderr`.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            error: Some(ExecError::ExitStatus { code: Some(code) }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Convert into stdout, or the transport error the failure represents.
    pub fn into_result(self, command: &CliCommand) -> Result<String, CoreError> {
        match self.error {
            None => Ok(self.stdout),
            Some(ExecError::Spawn { reason }) => Err(CoreError::ExecutorUnavailable {
                program: command.program.display().to_string(),
                reason,
            }),
            Some(ExecError::TimedOut { after }) => Err(CoreError::Timeout {
                command: command.to_string(),
                timeout_secs: after.as_secs(),
            }),
            Some(ExecError::ExitStatus { code }) => {
                let message = self
                    .stderr
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .map_or_else(
                        || match code {
                            Some(c) => format!("exit status {c}"),
                            None => "terminated by signal".to_owned(),
                        },
                        str::to_owned,
                    );
                Err(CoreError::CommandFailed {
                    command: command.to_string(),
                    message,
                    stderr: self.stderr,
                })
            }
        }
    }
}

// ── CommandExecutor ─────────────────────────────────────────────────

/// Runs external commands on behalf of the data providers.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &CliCommand) -> impl Future<Output = CliExitData> + Send;
}

/// Production executor backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Duration,
}

impl ProcessExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, command: &CliCommand) -> CliExitData {
        debug!(%command, "executing");

        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                warn!(%command, error = %e, "failed to spawn");
                return CliExitData {
                    error: Some(ExecError::Spawn {
                        reason: e.to_string(),
                    }),
                    ..CliExitData::default()
                };
            }
        };

        // Dropping the output future on timeout drops the child, which
        // kills it.
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                let error = (!output.status.success()).then(|| ExecError::ExitStatus {
                    code: output.status.code(),
                });
                if error.is_some() {
                    debug!(%command, code = ?output.status.code(), "non-zero exit");
                }
                CliExitData {
                    stdout,
                    stderr,
                    error,
                }
            }
            Ok(Err(e)) => CliExitData {
                error: Some(ExecError::Spawn {
                    reason: e.to_string(),
                }),
                ..CliExitData::default()
            },
            Err(_) => {
                warn!(%command, timeout_secs = self.timeout.as_secs(), "command timed out");
                CliExitData {
                    error: Some(ExecError::TimedOut {
                        after: self.timeout,
                    }),
                    ..CliExitData::default()
                }
            }
        }
    }
}
