// ── Eventing domain types ──

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::resource::{Condition, Resource, ResourceKind, conditions_populated};

/// Concrete kind a sink reference resolves to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
pub enum SinkKind {
    Broker,
    Channel,
    Service,
}

impl SinkKind {
    /// Classify a Kubernetes `kind` string from a destination ref.
    ///
    /// Every channel implementation (`InMemoryChannel`, `KafkaChannel`, ...)
    /// collapses to [`SinkKind::Channel`].
    pub fn from_ref_kind(kind: &str) -> Option<Self> {
        match kind {
            "Broker" => Some(Self::Broker),
            "Service" => Some(Self::Service),
            k if k.ends_with("Channel") => Some(Self::Channel),
            _ => None,
        }
    }

    pub fn resource_kind(self) -> ResourceKind {
        match self {
            Self::Broker => ResourceKind::Broker,
            Self::Channel => ResourceKind::Channel,
            Self::Service => ResourceKind::Service,
        }
    }
}

/// A Subscription delivery target, classified once at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkRef {
    pub kind: SinkKind,
    pub name: String,
    pub namespace: String,
}

/// The canonical Knative Broker.
#[derive(Debug, Clone)]
pub struct Broker {
    pub name: String,
    pub namespace: String,
    /// Ingress address (`status.address.url`).
    pub url: Option<Url>,
    pub conditions: Option<Vec<Condition>>,
    pub raw: Value,
}

/// The canonical Knative Channel (any channel implementation).
#[derive(Debug, Clone)]
pub struct Channel {
    pub name: String,
    pub namespace: String,
    pub url: Option<Url>,
    pub conditions: Option<Vec<Condition>>,
    pub raw: Value,
}

/// The canonical Knative Subscription.
///
/// Each of the four destinations stays `None` until the CLI reports it.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub name: String,
    pub namespace: String,
    pub conditions: Option<Vec<Condition>>,
    pub channel: Option<SinkRef>,
    pub subscriber: Option<SinkRef>,
    pub dead_letter_sink: Option<SinkRef>,
    pub reply: Option<SinkRef>,
    pub raw: Value,
}

macro_rules! impl_resource {
    ($ty:ty, $kind:expr) => {
        impl Resource for $ty {
            const KIND: ResourceKind = $kind;

            fn name(&self) -> &str {
                &self.name
            }

            fn namespace(&self) -> &str {
                &self.namespace
            }

            fn raw(&self) -> &Value {
                &self.raw
            }

            fn is_ready(&self) -> bool {
                conditions_populated(self.conditions.as_ref())
            }
        }
    };
}

impl_resource!(Broker, ResourceKind::Broker);
impl_resource!(Channel, ResourceKind::Channel);
impl_resource!(Subscription, ResourceKind::Subscription);
