// ── Generic identity-keyed registry ──
//
// Ordered storage keyed by `ResourceKey`, with in-place merge into
// long-lived handles and broadcast change notification. Every
// mutation runs under one short, non-async write lock, so each item
// merge is all-or-nothing and overlapping refreshes never duplicate.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use tokio::sync::broadcast;
use tracing::trace;

use crate::model::{Handle, Resource, ResourceKey};

/// Kind of structural change a registry reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ChangeKind {
    Inserted,
    Changed,
    Deleted,
}

/// Notification broadcast for every structural change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEvent {
    pub change: ChangeKind,
    pub key: ResourceKey,
}

/// Outcome of a single upsert.
#[derive(Debug, Clone)]
pub(crate) struct Upserted<T> {
    pub handle: Handle<T>,
    /// `None` when the incoming data matched the canonical value.
    pub change: Option<ChangeKind>,
}

/// Outcome of reconciling a full listing against a registry.
#[derive(Debug, Clone)]
pub struct Reconciled<T> {
    /// Canonical handles for the incoming items, in first-seen order.
    pub handles: Vec<Handle<T>>,
    pub inserted: Vec<ResourceKey>,
    pub changed: Vec<ResourceKey>,
    pub removed: Vec<ResourceKey>,
}

impl<T> Reconciled<T> {
    pub fn is_unchanged(&self) -> bool {
        self.inserted.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// The canonical set of resources of one kind.
pub struct Registry<T: Resource> {
    entries: RwLock<IndexMap<ResourceKey, Handle<T>>>,
    events: broadcast::Sender<ResourceEvent>,
}

impl<T: Resource> Registry<T> {
    pub(crate) fn new(events: broadcast::Sender<ResourceEvent>) -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            events,
        }
    }

    /// Merge `item` into the canonical handle with the same identity, or
    /// insert it. The returned handle is the one outstanding holders
    /// already have when the identity existed.
    pub fn add_or_update(&self, item: T) -> Handle<T> {
        self.upsert(item).handle
    }

    /// [`add_or_update`](Self::add_or_update) per item. Newly inserted
    /// items keep first-seen order.
    pub fn add_many(&self, items: impl IntoIterator<Item = T>) -> Vec<Handle<T>> {
        items.into_iter().map(|i| self.add_or_update(i)).collect()
    }

    /// Insert or merge, reporting what changed.
    pub(crate) fn upsert(&self, item: T) -> Upserted<T> {
        let key = item.key();
        let upserted = {
            let mut entries = self.write();
            upsert_locked(&mut entries, item)
        };
        if let Some(change) = upserted.change {
            self.notify(change, key);
        }
        upserted
    }

    /// Upsert every item of a complete listing, then prune identities the
    /// listing no longer reports. The collection is never briefly empty.
    pub fn reconcile(&self, items: Vec<T>) -> Reconciled<T> {
        let mut result = Reconciled {
            handles: Vec::with_capacity(items.len()),
            inserted: Vec::new(),
            changed: Vec::new(),
            removed: Vec::new(),
        };
        {
            let mut entries = self.write();
            let mut seen: HashSet<ResourceKey> = HashSet::with_capacity(items.len());

            for item in items {
                let key = item.key();
                let first_sighting = seen.insert(key.clone());
                let upserted = upsert_locked(&mut entries, item);
                match upserted.change {
                    Some(ChangeKind::Inserted) => result.inserted.push(key.clone()),
                    Some(ChangeKind::Changed)
                        if !result.changed.contains(&key) && !result.inserted.contains(&key) =>
                    {
                        result.changed.push(key.clone());
                    }
                    _ => {}
                }
                if first_sighting {
                    result.handles.push(upserted.handle);
                }
            }

            entries.retain(|key, _| {
                let keep = seen.contains(key);
                if !keep {
                    result.removed.push(key.clone());
                }
                keep
            });
        }

        for key in &result.inserted {
            self.notify(ChangeKind::Inserted, key.clone());
        }
        for key in &result.changed {
            self.notify(ChangeKind::Changed, key.clone());
        }
        for key in &result.removed {
            self.notify(ChangeKind::Deleted, key.clone());
        }
        result
    }

    /// Exact lookup by identity.
    pub fn find(&self, key: &ResourceKey) -> Option<Handle<T>> {
        self.read().get(key).cloned()
    }

    /// Lookup by name. With a namespace this is an exact identity match;
    /// without one, the name must be unique across namespaces.
    pub fn find_by_name(&self, name: &str, namespace: Option<&str>) -> Option<Handle<T>> {
        let entries = self.read();
        if let Some(ns) = namespace {
            return entries.get(&ResourceKey::new(T::KIND, ns, name)).cloned();
        }
        let mut matches = entries.iter().filter(|(k, _)| k.name == name);
        match (matches.next(), matches.next()) {
            (Some((_, h)), None) => Some(h.clone()),
            _ => None,
        }
    }

    /// Remove by identity and return the remaining handles. Removing an
    /// unknown identity is a no-op.
    pub fn remove(&self, key: &ResourceKey) -> Vec<Handle<T>> {
        let (removed, remaining) = {
            let mut entries = self.write();
            let removed = entries.shift_remove(key);
            (removed, entries.values().cloned().collect())
        };
        if removed.is_some() {
            self.notify(ChangeKind::Deleted, key.clone());
        }
        remaining
    }

    /// All handles in insertion order.
    pub fn snapshot(&self) -> Vec<Handle<T>> {
        self.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // ── Crate-internal helpers ───────────────────────────────────────

    /// Replace the value of `key` with `f(current)` under the write lock.
    pub(crate) fn update<R>(
        &self,
        key: &ResourceKey,
        f: impl FnOnce(&Handle<T>) -> R,
    ) -> Option<R> {
        let entries = self.write();
        entries.get(key).map(f)
    }

    /// Run `f` over the ordered entries under the read lock.
    pub(crate) fn with_entries<R>(&self, f: impl FnOnce(&IndexMap<ResourceKey, Handle<T>>) -> R) -> R {
        f(&self.read())
    }

    pub(crate) fn notify(&self, change: ChangeKind, key: ResourceKey) {
        trace!(%change, %key, "registry change");
        // No receivers is fine.
        let _ = self.events.send(ResourceEvent { change, key });
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<ResourceKey, Handle<T>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<ResourceKey, Handle<T>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn upsert_locked<T: Resource>(
    entries: &mut IndexMap<ResourceKey, Handle<T>>,
    item: T,
) -> Upserted<T> {
    let key = item.key();
    if let Some(handle) = entries.get(&key) {
        let current = handle.load();
        if current.content_eq(&item) {
            return Upserted {
                handle: handle.clone(),
                change: None,
            };
        }
        handle.store(T::merge(&current, item));
        Upserted {
            handle: handle.clone(),
            change: Some(ChangeKind::Changed),
        }
    } else {
        let handle = Handle::new(item);
        entries.insert(key, handle.clone());
        Upserted {
            handle,
            change: Some(ChangeKind::Inserted),
        }
    }
}
