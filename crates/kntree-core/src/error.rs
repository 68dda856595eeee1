// ── Core error types ──
//
// User-facing errors from kntree-core. Parse failures and not-yet-ready
// resources are resolved inside the data providers; only transport
// failures, exhausted retries, and cancellation reach the caller.

use thiserror::Error;

use crate::model::ResourceKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Transport errors ─────────────────────────────────────────────
    #[error("Command `{command}` failed: {message}")]
    CommandFailed {
        command: String,
        message: String,
        /// Captured stderr of the failed invocation (may be empty).
        stderr: String,
    },

    #[error("Cannot run {program}: {reason}")]
    ExecutorUnavailable { program: String, reason: String },

    #[error("Command `{command}` timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    // ── Readiness ────────────────────────────────────────────────────
    #[error("{kind} resources still not ready after {attempts} attempts")]
    NotReady { kind: ResourceKind, attempts: u32 },

    #[error("Refresh cancelled")]
    Cancelled,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{kind} not found: {identifier}")]
    NotFound {
        kind: ResourceKind,
        identifier: String,
    },
}

impl CoreError {
    /// Whether this error is a transport failure (the cluster or the
    /// CLI binary could not be reached).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::CommandFailed { .. } | Self::ExecutorUnavailable { .. } | Self::Timeout { .. }
        )
    }
}

/// Failure to decode one CLI response or one item inside it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("unexpected document shape: {0}")]
    Shape(String),

    #[error("item {index} is missing {field}")]
    MissingField { index: usize, field: &'static str },
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
