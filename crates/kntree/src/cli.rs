//! Clap derive structures for the `kntree` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// kntree -- Knative Serving and Eventing resources as a tree
#[derive(Debug, Parser)]
#[command(
    name = "kntree",
    version,
    about = "Browse and manage Knative resources as a tree",
    long_about = "Renders the Knative Serving and Eventing trees by driving the `kn` CLI.\n\n\
        Resources that are still reconciling are polled until the cluster\n\
        reports their status conditions.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path to the `kn` binary (overrides config)
    #[arg(long, env = "KNTREE_KN_PATH", global = true)]
    pub kn_path: Option<PathBuf>,

    /// Namespace to operate in (overrides config)
    #[arg(long, short = 'n', env = "KNTREE_NAMESPACE", global = true)]
    pub namespace: Option<String>,

    /// Per-command timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Config file to load instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the resource tree
    #[command(alias = "t")]
    Tree(TreeArgs),

    /// Manage Knative services
    #[command(alias = "ksvc")]
    Service(ServiceArgs),

    /// Manage revisions
    #[command(alias = "rev")]
    Revision(RevisionArgs),

    /// Manage brokers
    Broker(BrokerArgs),

    /// Manage channels
    Channel(ChannelArgs),

    /// Manage subscriptions
    #[command(alias = "sub")]
    Subscription(SubscriptionArgs),

    /// Print a resource's YAML manifest
    Describe(DescribeArgs),

    /// Inspect the configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Tree ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Which tree to render
    #[arg(default_value = "all")]
    pub domain: TreeDomain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TreeDomain {
    /// Services and their revisions
    Serving,
    /// Brokers, channels, and subscriptions
    Eventing,
    /// Both trees, Serving first
    All,
}

// ── Serving ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServiceArgs {
    #[command(subcommand)]
    pub command: ServiceCommand,
}

#[derive(Debug, Subcommand)]
pub enum ServiceCommand {
    /// Create a service from a container image
    Create {
        name: String,
        /// Container image to deploy
        #[arg(long, short = 'i')]
        image: String,
    },
    /// Delete a service and its revisions
    #[command(alias = "rm")]
    Delete { name: String },
}

#[derive(Debug, Args)]
pub struct RevisionArgs {
    #[command(subcommand)]
    pub command: RevisionCommand,
}

#[derive(Debug, Subcommand)]
pub enum RevisionCommand {
    /// Delete a revision
    #[command(alias = "rm")]
    Delete { name: String },
}

// ── Eventing ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BrokerArgs {
    #[command(subcommand)]
    pub command: CreateDeleteCommand,
}

#[derive(Debug, Args)]
pub struct ChannelArgs {
    #[command(subcommand)]
    pub command: CreateDeleteCommand,
}

#[derive(Debug, Subcommand)]
pub enum CreateDeleteCommand {
    /// Create a resource with default settings
    Create { name: String },
    /// Delete a resource
    #[command(alias = "rm")]
    Delete { name: String },
}

#[derive(Debug, Args)]
pub struct SubscriptionArgs {
    #[command(subcommand)]
    pub command: SubscriptionCommand,
}

#[derive(Debug, Subcommand)]
pub enum SubscriptionCommand {
    /// Delete a subscription
    #[command(alias = "rm")]
    Delete { name: String },
}

// ── Describe ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DescribeArgs {
    /// Kind of resource
    pub kind: DescribeKind,
    /// Resource name
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DescribeKind {
    #[value(alias = "ksvc")]
    Service,
    #[value(alias = "rev")]
    Revision,
    Broker,
    Channel,
    #[value(alias = "sub")]
    Subscription,
}

// ── Config & Completions ─────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file location
    Path,
    /// Write a config file with default values (plus any global flags)
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
