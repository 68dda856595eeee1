// ── Runtime configuration ──
//
// Describes *how* to reach the cluster through the `kn` binary.
// Built by the front end from its config layer and handed in;
// core never reads config files.

use std::path::PathBuf;
use std::time::Duration;

use crate::provider::RetryPolicy;

/// Configuration shared by the executor and both data providers.
#[derive(Debug, Clone)]
pub struct KnConfig {
    /// Path or bare name of the `kn` binary.
    pub kn_path: PathBuf,
    /// Namespace passed as `-n` on every command. `None` uses the
    /// current kubeconfig context's namespace.
    pub namespace: Option<String>,
    /// Per-command timeout.
    pub timeout: Duration,
    /// Readiness polling behaviour.
    pub retry: RetryPolicy,
    /// Directory holding `context/<context>.svg` icons.
    pub icon_root: PathBuf,
}

impl Default for KnConfig {
    fn default() -> Self {
        Self {
            kn_path: PathBuf::from("kn"),
            namespace: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            icon_root: PathBuf::from("images"),
        }
    }
}
