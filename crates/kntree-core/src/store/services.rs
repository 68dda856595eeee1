// ── Service registry with nested revisions ──
//
// Services own their revisions: the revision handles live inside the
// service value, so dropping a service drops every revision with it.
// Revision mutations run under the service registry's write lock.

use std::collections::HashSet;
use std::ops::Deref;

use tokio::sync::broadcast;

use super::registry::{ChangeKind, Reconciled, Registry, ResourceEvent};
use crate::error::CoreError;
use crate::model::{Handle, Resource, ResourceKey, ResourceKind, Revision, Service};

/// A revision together with its owning service and both positions.
#[derive(Debug, Clone)]
pub struct RevisionLocation {
    pub service: Handle<Service>,
    pub revision: Handle<Revision>,
    pub service_index: usize,
    pub revision_index: usize,
}

/// Canonical Services, plus the revision operations that reach into them.
///
/// Derefs to [`Registry<Service>`] for the common add/find/remove surface.
pub struct ServiceRegistry {
    inner: Registry<Service>,
}

impl Deref for ServiceRegistry {
    type Target = Registry<Service>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl ServiceRegistry {
    pub(crate) fn new(events: broadcast::Sender<ResourceEvent>) -> Self {
        Self {
            inner: Registry::new(events),
        }
    }

    /// Remove a service and, with it, every revision it owns.
    pub fn remove(&self, key: &ResourceKey) -> Vec<Handle<Service>> {
        let owned: Vec<ResourceKey> = self
            .inner
            .find(key)
            .map(|svc| svc.load().revisions.iter().map(|r| r.load().key()).collect())
            .unwrap_or_default();
        let remaining = self.inner.remove(key);
        for rev in owned {
            self.inner.notify(ChangeKind::Deleted, rev);
        }
        remaining
    }

    /// Reconcile a full service listing; revisions of pruned services go
    /// with them.
    pub fn reconcile(&self, items: Vec<Service>) -> Reconciled<Service> {
        let previous = self.inner.snapshot();
        let result = self.inner.reconcile(items);
        for handle in previous {
            let svc = handle.load();
            if result.removed.contains(&svc.key()) {
                for rev in &svc.revisions {
                    self.inner.notify(ChangeKind::Deleted, rev.load().key());
                }
            }
        }
        result
    }

    /// Set or clear the local-edit flag. This is the only way the flag
    /// changes; cluster refreshes leave it alone.
    pub fn set_modified(&self, key: &ResourceKey, modified: bool) -> Option<Handle<Service>> {
        let changed = self.inner.update(key, |handle| {
            let current = handle.load();
            if current.modified == modified {
                return false;
            }
            handle.store(Service {
                modified,
                ..(*current).clone()
            });
            true
        })?;
        if changed {
            self.inner.notify(ChangeKind::Changed, key.clone());
        }
        self.inner.find(key)
    }

    // ── Revisions ────────────────────────────────────────────────────

    /// Merge revisions into their owning service without pruning.
    ///
    /// Each revision's traffic slice is computed from the service's
    /// current traffic split.
    pub fn add_revisions(
        &self,
        service: &ResourceKey,
        revisions: Vec<Revision>,
    ) -> Result<Vec<Handle<Revision>>, CoreError> {
        self.merge_revisions(service, revisions, false)
            .map(|r| r.handles)
    }

    /// Merge a complete revision listing for one service, dropping the
    /// revisions it no longer reports.
    pub fn reconcile_revisions(
        &self,
        service: &ResourceKey,
        revisions: Vec<Revision>,
    ) -> Result<Reconciled<Revision>, CoreError> {
        self.merge_revisions(service, revisions, true)
    }

    /// Find a revision by its flat name across every service.
    pub fn find_revision(&self, name: &str) -> Option<Handle<Revision>> {
        self.find_pair_and_index(name).map(|loc| loc.revision)
    }

    /// Locate a revision, its owning service, and both positions.
    pub fn find_pair_and_index(&self, revision: &str) -> Option<RevisionLocation> {
        self.inner.with_entries(|entries| {
            entries
                .values()
                .enumerate()
                .find_map(|(service_index, svc_handle)| {
                    let svc = svc_handle.load();
                    svc.revisions
                        .iter()
                        .enumerate()
                        .find(|(_, r)| r.load().name == revision)
                        .map(|(revision_index, r)| RevisionLocation {
                            service: svc_handle.clone(),
                            revision: r.clone(),
                            service_index,
                            revision_index,
                        })
                })
        })
    }

    /// Remove a revision by flat name. Returns the removed handle.
    pub fn remove_revision(&self, name: &str) -> Option<Handle<Revision>> {
        let loc = self.find_pair_and_index(name)?;
        let service_key = loc.service.load().key();
        let removed = self
            .inner
            .update(&service_key, |handle| {
                let current = handle.load();
                let idx = current.revisions.iter().position(|r| r.load().name == name)?;
                let mut next = (*current).clone();
                let removed = next.revisions.remove(idx);
                handle.store(next);
                Some(removed)
            })
            .flatten()?;
        self.inner.notify(ChangeKind::Deleted, removed.load().key());
        Some(removed)
    }

    fn merge_revisions(
        &self,
        service: &ResourceKey,
        revisions: Vec<Revision>,
        prune: bool,
    ) -> Result<Reconciled<Revision>, CoreError> {
        let result = self
            .inner
            .update(service, |handle| {
                let current = handle.load();
                let mut next = (*current).clone();
                let mut result = Reconciled {
                    handles: Vec::with_capacity(revisions.len()),
                    inserted: Vec::new(),
                    changed: Vec::new(),
                    removed: Vec::new(),
                };
                let mut seen: HashSet<String> = HashSet::with_capacity(revisions.len());

                for mut revision in revisions {
                    revision.service.clone_from(&next.name);
                    revision.traffic = next.traffic_for(&revision.name);
                    let key = revision.key();
                    let first_sighting = seen.insert(revision.name.clone());

                    let existing = next
                        .revisions
                        .iter()
                        .find(|r| r.load().name == revision.name)
                        .cloned();
                    let rev_handle = match existing {
                        Some(existing) => {
                            let canonical = existing.load();
                            if !canonical.content_eq(&revision) {
                                existing.store(Revision::merge(&canonical, revision));
                                if !result.changed.contains(&key) && !result.inserted.contains(&key) {
                                    result.changed.push(key);
                                }
                            }
                            existing
                        }
                        None => {
                            let created = Handle::new(revision);
                            next.revisions.push(created.clone());
                            result.inserted.push(key);
                            created
                        }
                    };
                    if first_sighting {
                        result.handles.push(rev_handle);
                    }
                }

                if prune {
                    next.revisions.retain(|r| {
                        let rev = r.load();
                        let keep = seen.contains(&rev.name);
                        if !keep {
                            result.removed.push(rev.key());
                        }
                        keep
                    });
                }

                if !result.inserted.is_empty() || !result.removed.is_empty() {
                    handle.store(next);
                }
                result
            })
            .ok_or_else(|| CoreError::NotFound {
                kind: ResourceKind::Service,
                identifier: service.to_string(),
            })?;

        for key in &result.inserted {
            self.inner.notify(ChangeKind::Inserted, key.clone());
        }
        for key in &result.changed {
            self.inner.notify(ChangeKind::Changed, key.clone());
        }
        for key in &result.removed {
            self.inner.notify(ChangeKind::Deleted, key.clone());
        }
        Ok(result)
    }
}
