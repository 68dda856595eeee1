// ── kn command builders ──
//
// Every command the providers issue, built in one place so the
// namespace flag and output format are applied uniformly.

use std::path::PathBuf;

use crate::config::KnConfig;
use crate::executor::CliCommand;
use crate::model::ResourceKind;

/// Builds `kn` invocations for one binary and (optional) namespace.
#[derive(Debug, Clone)]
pub struct KnCommands {
    kn_path: PathBuf,
    namespace: Option<String>,
}

impl KnCommands {
    pub fn new(kn_path: impl Into<PathBuf>, namespace: Option<String>) -> Self {
        Self {
            kn_path: kn_path.into(),
            namespace,
        }
    }

    pub fn from_config(config: &KnConfig) -> Self {
        Self::new(config.kn_path.clone(), config.namespace.clone())
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    // ── Listing ──────────────────────────────────────────────────────

    /// `kn <noun> list -o json`
    pub fn list(&self, kind: ResourceKind) -> CliCommand {
        self.base([noun(kind), "list", "-o", "json"])
    }

    /// `kn revision list -s <service> -o json`
    pub fn list_revisions(&self, service: &str) -> CliCommand {
        self.base(["revision", "list", "-s", service, "-o", "json"])
    }

    /// `kn <noun> describe <name> -o yaml`
    pub fn describe(&self, kind: ResourceKind, name: &str) -> CliCommand {
        self.base([noun(kind), "describe", name, "-o", "yaml"])
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// `kn service create <name> --image <image>`
    pub fn create_service(&self, name: &str, image: &str) -> CliCommand {
        self.base(["service", "create", name, "--image", image])
    }

    /// `kn <noun> create <name>` for kinds that need no further input.
    pub fn create(&self, kind: ResourceKind, name: &str) -> CliCommand {
        self.base([noun(kind), "create", name])
    }

    /// `kn <noun> delete <name>`
    pub fn delete(&self, kind: ResourceKind, name: &str) -> CliCommand {
        self.base([noun(kind), "delete", name])
    }

    fn base<'a>(&self, args: impl IntoIterator<Item = &'a str>) -> CliCommand {
        let cmd = CliCommand::new(self.kn_path.clone()).args(args);
        match &self.namespace {
            Some(ns) => cmd.args(["-n", ns.as_str()]),
            None => cmd,
        }
    }
}

/// The `kn` subcommand noun for a kind.
fn noun(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Service => "service",
        ResourceKind::Revision => "revision",
        ResourceKind::Broker => "broker",
        ResourceKind::Channel => "channel",
        ResourceKind::Subscription => "subscription",
    }
}
