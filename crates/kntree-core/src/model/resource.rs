// ── Core identity types ──
//
// ResourceKey and Handle form the foundation of every domain type.
// A key names a resource; a handle is the single canonical cell that
// holds its current value for as long as a registry owns it.

use std::fmt;
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── ResourceKind ────────────────────────────────────────────────────

/// Knative resource kinds mirrored by the engine.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum ResourceKind {
    Service,
    Revision,
    Broker,
    Channel,
    Subscription,
}

// ── ResourceKey ─────────────────────────────────────────────────────

/// Identity of a resource: `(kind, namespace, name)`.
///
/// Registries key on this and never on list position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(kind: ResourceKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

// ── Condition ───────────────────────────────────────────────────────

/// One entry of a resource's `status.conditions` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A resource counts as ready once the cluster reported at least one
/// condition for it.
pub(crate) fn conditions_populated(conditions: Option<&Vec<Condition>>) -> bool {
    conditions.is_some_and(|c| !c.is_empty())
}

// ── Resource trait ──────────────────────────────────────────────────

/// Behaviour shared by every canonical domain type held in a registry.
pub trait Resource: Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn name(&self) -> &str;

    fn namespace(&self) -> &str;

    /// The full item document as reported by the CLI.
    fn raw(&self) -> &Value;

    /// Whether `status.conditions` has been populated by the cluster.
    fn is_ready(&self) -> bool;

    fn key(&self) -> ResourceKey {
        ResourceKey::new(Self::KIND, self.namespace(), self.name())
    }

    /// True when `other` carries the same cluster content as `self`.
    fn content_eq(&self, other: &Self) -> bool {
        self.raw() == other.raw()
    }

    /// Fold freshly fetched data into the canonical value.
    ///
    /// Called with the registry lock held. The default lets the
    /// incoming data win outright.
    fn merge(current: &Self, incoming: Self) -> Self {
        let _ = current;
        incoming
    }
}

// ── Handle ──────────────────────────────────────────────────────────

/// Shared, swappable cell holding the canonical value of one resource.
///
/// Registry updates swap the value inside the same cell, so every
/// outstanding clone observes the update on its next [`load`](Self::load).
/// Pointer identity of the cell is the identity of the resource.
pub struct Handle<T>(Arc<ArcSwap<T>>);

impl<T> Handle<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(Arc::new(ArcSwap::from_pointee(value)))
    }

    /// Current value.
    pub fn load(&self) -> Arc<T> {
        self.0.load_full()
    }

    /// Replace the value in place. Only registries mutate canonical state.
    pub(crate) fn store(&self, value: T) {
        self.0.store(Arc::new(value));
    }

    /// Whether both handles refer to the same canonical resource.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakHandle<T> {
        WeakHandle(Arc::downgrade(&self.0))
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&*self.load()).finish()
    }
}

/// Non-owning reference to a [`Handle`], held by tree nodes.
pub struct WeakHandle<T>(Weak<ArcSwap<T>>);

impl<T> WeakHandle<T> {
    pub fn upgrade(&self) -> Option<Handle<T>> {
        self.0.upgrade().map(Handle)
    }

    /// False once the owning registry has dropped the resource.
    pub fn is_live(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Current value, if the resource is still canonical.
    pub fn load(&self) -> Option<Arc<T>> {
        self.upgrade().map(|h| h.load())
    }
}

impl<T> Clone for WeakHandle<T> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

impl<T> fmt::Debug for WeakHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakHandle")
            .field("live", &self.is_live())
            .finish()
    }
}
