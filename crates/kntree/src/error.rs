//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use kntree_config::ConfigError;
use kntree_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const UNAVAILABLE: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── kn binary ────────────────────────────────────────────────────
    #[error("Cannot run {program}: {reason}")]
    #[diagnostic(
        code(kntree::kn_unavailable),
        help(
            "Install the Knative CLI or point kntree at it:\n\
             kntree --kn-path /path/to/kn ...\n\
             Or set kn_path in the config file."
        )
    )]
    KnUnavailable { program: String, reason: String },

    #[error("`{command}` failed: {message}")]
    #[diagnostic(code(kntree::command_failed))]
    CommandFailed { command: String, message: String },

    #[error("`{command}` timed out after {seconds}s")]
    #[diagnostic(
        code(kntree::timeout),
        help("Increase the timeout with --timeout or check cluster responsiveness.")
    )]
    Timeout { command: String, seconds: u64 },

    // ── Readiness ────────────────────────────────────────────────────
    #[error("{kind} resources are still not ready after {attempts} attempts")]
    #[diagnostic(
        code(kntree::not_ready),
        help("Raise retry.max_attempts in the config file, or set it to 0 to wait indefinitely.")
    )]
    NotReady { kind: String, attempts: u32 },

    #[error("Interrupted")]
    #[diagnostic(code(kntree::interrupted))]
    Interrupted,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{kind} '{identifier}' not found")]
    #[diagnostic(
        code(kntree::not_found),
        help("Run: kntree tree to see available resources")
    )]
    NotFound { kind: String, identifier: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(kntree::validation))]
    Validation { field: String, reason: String },

    #[error("Could not load configuration")]
    #[diagnostic(code(kntree::config), help("Config file: {path}"))]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(kntree::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::KnUnavailable { .. } => exit_code::UNAVAILABLE,
            Self::Timeout { .. } | Self::NotReady { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Interrupted => exit_code::INTERRUPTED,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the config file path to a loading failure.
    pub fn config(path: &std::path::Path, source: ConfigError) -> Self {
        match source {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            source => Self::Config {
                path: path.display().to_string(),
                source,
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ExecutorUnavailable { program, reason } => {
                CliError::KnUnavailable { program, reason }
            }

            CoreError::CommandFailed {
                command,
                message,
                stderr: _,
            } => CliError::CommandFailed { command, message },

            CoreError::Timeout {
                command,
                timeout_secs,
            } => CliError::Timeout {
                command,
                seconds: timeout_secs,
            },

            CoreError::NotReady { kind, attempts } => CliError::NotReady {
                kind: kind.to_string(),
                attempts,
            },

            CoreError::Cancelled => CliError::Interrupted,

            CoreError::NotFound { kind, identifier } => CliError::NotFound {
                kind: kind.to_string(),
                identifier,
            },
        }
    }
}
