// kntree-core: Knative resource sync engine between the `kn` CLI and tree views.

pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod model;
pub mod parse;
pub mod provider;
pub mod store;
pub mod tree;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::KnCommands;
pub use config::KnConfig;
pub use error::{CoreError, ParseError};
pub use executor::{CliCommand, CliExitData, CommandExecutor, ExecError, ProcessExecutor};
pub use provider::{EventingDataProvider, Fetched, RetryPolicy, ServingDataProvider};
pub use store::{ChangeKind, Registries, ResourceEvent};
pub use tree::{Collapsible, ContextType, Domain, NodeCommand, NodeItem, TreeItem, TreeNode};

pub use model::{
    // Identity
    Handle, Resource, ResourceKey, ResourceKind, WeakHandle,
    // Serving
    Revision, Service, Traffic,
    // Eventing
    Broker, Channel, SinkKind, SinkRef, Subscription,
    // Status
    Condition,
};
