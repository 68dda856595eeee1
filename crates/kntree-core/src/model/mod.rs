// ── Domain model ──
//
// Canonical types for everything the tree shows. Identity is always
// `(kind, namespace, name)`; values live behind registry-owned handles.

pub mod eventing;
pub mod resource;
pub mod serving;

pub use eventing::{Broker, Channel, SinkKind, SinkRef, Subscription};
pub use resource::{Condition, Handle, Resource, ResourceKey, ResourceKind, WeakHandle};
pub use serving::{Revision, Service, Traffic};
