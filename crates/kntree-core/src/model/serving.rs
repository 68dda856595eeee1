// ── Serving domain types ──

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::resource::{Condition, Handle, Resource, ResourceKind, conditions_populated};

/// One entry of a Service's traffic split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traffic {
    pub revision_name: Option<String>,
    pub tag: Option<String>,
    pub percent: u32,
    pub latest_revision: bool,
    pub url: Option<Url>,
}

/// The canonical Knative Service.
#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    pub namespace: String,
    /// Route URL (`status.url`).
    pub url: Option<Url>,
    pub conditions: Option<Vec<Condition>>,
    /// Traffic split from `status.traffic`, in cluster order.
    pub traffic: Vec<Traffic>,
    pub latest_ready_revision: Option<String>,
    /// Local edits differ from the cluster-fetched content.
    pub modified: bool,
    /// Owned revisions in discovery order.
    pub revisions: Vec<Handle<Revision>>,
    pub raw: Value,
}

impl Service {
    /// The traffic entries that route to `revision`.
    ///
    /// A `latestRevision` entry without an explicit revision name is
    /// attributed to the latest ready revision.
    pub fn traffic_for(&self, revision: &str) -> Vec<Traffic> {
        self.traffic
            .iter()
            .filter(|t| match t.revision_name.as_deref() {
                Some(name) => name == revision,
                None => t.latest_revision && self.latest_ready_revision.as_deref() == Some(revision),
            })
            .cloned()
            .collect()
    }
}

impl Resource for Service {
    const KIND: ResourceKind = ResourceKind::Service;

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

    /// Cluster data replaces the document and traffic split; the local
    /// `modified` flag and the owned revisions survive. Owned revisions
    /// get their traffic slice recomputed from the incoming split.
    fn merge(current: &Self, incoming: Self) -> Self {
        let merged = Self {
            modified: current.modified,
            revisions: current.revisions.clone(),
            ..incoming
        };
        for handle in &merged.revisions {
            let revision = handle.load();
            let traffic = merged.traffic_for(&revision.name);
            if traffic != revision.traffic {
                handle.store(Revision {
                    traffic,
                    ..(*revision).clone()
                });
            }
        }
        merged
    }
}

/// The canonical Knative Revision, owned by a [`Service`].
#[derive(Debug, Clone)]
pub struct Revision {
    pub name: String,
    pub namespace: String,
    /// Name of the owning Service.
    pub service: String,
    pub conditions: Option<Vec<Condition>>,
    /// The owning Service's traffic entries that reference this revision.
    pub traffic: Vec<Traffic>,
    pub raw: Value,
}

impl Revision {
    /// Total percentage of traffic routed here.
    pub fn percent(&self) -> u32 {
        self.traffic.iter().map(|t| t.percent).sum()
    }

    /// Tags of the traffic entries that carry one, in split order.
    pub fn tags(&self) -> Vec<&str> {
        self.traffic.iter().filter_map(|t| t.tag.as_deref()).collect()
    }

    pub fn is_tagged(&self) -> bool {
        self.traffic.iter().any(|t| t.tag.is_some())
    }
}

impl Resource for Revision {
    const KIND: ResourceKind = ResourceKind::Revision;

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

    fn content_eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.traffic == other.traffic
    }
}
