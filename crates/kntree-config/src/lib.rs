//! Shared configuration for kntree.
//!
//! A TOML file plus `KNTREE_` environment overrides, translated into
//! `kntree_core::KnConfig`. Core never reads files; the front end loads
//! a [`Config`] here and hands the runtime form in.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use kntree_core::{KnConfig, RetryPolicy};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Path or bare name of the `kn` binary.
    #[serde(default = "default_kn_path")]
    pub kn_path: PathBuf,

    /// Namespace for every command. Unset uses the kubeconfig context's.
    pub namespace: Option<String>,

    /// Per-command timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Directory holding `context/<context>.svg` icons.
    pub icon_root: Option<PathBuf>,

    /// Output colouring: "auto", "always", or "never".
    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kn_path: default_kn_path(),
            namespace: None,
            timeout_secs: default_timeout(),
            icon_root: None,
            color: default_color(),
            retry: RetrySettings::default(),
        }
    }
}

/// Readiness polling. `max_attempts = 0` polls until interrupted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

fn default_kn_path() -> PathBuf {
    "kn".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_color() -> String {
    "auto".into()
}
fn default_max_attempts() -> u32 {
    40
}
fn default_initial_backoff() -> u64 {
    250
}
fn default_max_backoff() -> u64 {
    5_000
}

// ── Config file path ────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "kntree", "kntree")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("kntree");
    p
}

fn default_icon_root() -> PathBuf {
    project_dirs().map_or_else(|| PathBuf::from("images"), |dirs| dirs.data_dir().join("images"))
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from `path` (missing files are fine) with `KNTREE_` overrides.
///
/// Nested keys use a double underscore: `KNTREE_RETRY__MAX_ATTEMPTS`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("KNTREE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML at `path`, creating parent directories.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Validate and build the runtime configuration core consumes.
    pub fn to_runtime_config(&self) -> Result<KnConfig, ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::Validation {
                field: "retry.initial_backoff_ms".into(),
                reason: format!(
                    "{} exceeds retry.max_backoff_ms ({})",
                    self.retry.initial_backoff_ms, self.retry.max_backoff_ms
                ),
            });
        }
        if self.namespace.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Validation {
                field: "namespace".into(),
                reason: "must not be empty; omit it to use the current context".into(),
            });
        }

        Ok(KnConfig {
            kn_path: self.kn_path.clone(),
            namespace: self.namespace.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryPolicy {
                initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
                max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
                max_attempts: (self.retry.max_attempts > 0).then_some(self.retry.max_attempts),
            },
            icon_root: self.icon_root.clone().unwrap_or_else(default_icon_root),
        })
    }
}
