//! Command dispatch: bridges CLI args -> data providers -> terminal output.

pub mod config_cmd;
pub mod describe;
pub mod eventing;
pub mod serving;
pub mod tree;

use std::sync::Arc;

use kntree_core::{
    CommandExecutor, EventingDataProvider, KnConfig, Registries, ServingDataProvider,
};

use crate::cli::Command;
use crate::error::CliError;

/// Both providers over one set of registries, so Eventing can resolve
/// Service sinks that Serving has fetched.
pub struct Session<E> {
    pub serving: ServingDataProvider<E>,
    pub eventing: EventingDataProvider<E>,
    pub color: bool,
}

impl<E: CommandExecutor> Session<E> {
    pub fn new(executor: Arc<E>, config: &KnConfig, color: bool) -> Self {
        let registries = Arc::new(Registries::new());
        Self {
            serving: ServingDataProvider::new(Arc::clone(&executor), Arc::clone(&registries), config),
            eventing: EventingDataProvider::new(executor, registries, config),
            color,
        }
    }

    /// Stop every readiness loop still polling.
    pub fn shutdown(&self) {
        self.serving.shutdown();
        self.eventing.shutdown();
    }
}

/// Dispatch a cluster-bound command to the appropriate handler.
pub async fn dispatch<E: CommandExecutor>(cmd: Command, session: &Session<E>) -> Result<(), CliError> {
    match cmd {
        Command::Tree(args) => tree::handle(args, session).await,
        Command::Service(args) => serving::handle_service(args, session).await,
        Command::Revision(args) => serving::handle_revision(args, session).await,
        Command::Broker(args) => eventing::handle_broker(args, session).await,
        Command::Channel(args) => eventing::handle_channel(args, session).await,
        Command::Subscription(args) => eventing::handle_subscription(args, session).await,
        Command::Describe(args) => describe::handle(&args, session).await,
        // Config and Completions are handled before a session exists
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not use the cluster".into(),
        )),
    }
}
