// ── Canonical resource registries ──
//
// One registry per kind, sharing a single change-event channel.
// Providers receive the context explicitly; nothing here is global.

mod registry;
mod services;

pub use registry::{ChangeKind, Reconciled, Registry, ResourceEvent};
pub use services::{RevisionLocation, ServiceRegistry};

use tokio::sync::broadcast;

use crate::model::{Broker, Channel, Subscription};

const EVENT_CHANNEL_SIZE: usize = 256;

/// Every canonical registry the tree reads from.
///
/// Serving and Eventing providers share one instance so that cross-domain
/// lookups (a Subscription sink naming a Service) resolve to the same
/// canonical handle the Serving tree shows.
pub struct Registries {
    pub services: ServiceRegistry,
    pub brokers: Registry<Broker>,
    pub channels: Registry<Channel>,
    pub subscriptions: Registry<Subscription>,
    events: broadcast::Sender<ResourceEvent>,
}

impl Registries {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            services: ServiceRegistry::new(events.clone()),
            brokers: Registry::new(events.clone()),
            channels: Registry::new(events.clone()),
            subscriptions: Registry::new(events.clone()),
            events,
        }
    }

    /// Subscribe to inserted/changed/deleted notifications for all kinds.
    pub fn events(&self) -> broadcast::Receiver<ResourceEvent> {
        self.events.subscribe()
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}
