// ── Tree node adapters ──
//
// Presentation wrappers over canonical resources. A node holds a weak
// reference to what it shows, so a node whose resource was removed stops
// reporting itself as live instead of rendering stale data.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;

use crate::model::{
    Broker, Channel, Resource, ResourceKey, ResourceKind, Revision, Service, SinkRef, Subscription,
    WeakHandle,
};

// ── ContextType ─────────────────────────────────────────────────────

/// Presentation tag driving icon, sort priority, and command selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ContextType {
    ServiceModified,
    Service,
    RevisionTagged,
    Revision,
    BrokerFolder,
    ChannelFolder,
    SubscriptionFolder,
    Broker,
    Channel,
    Subscription,
    /// Empty-state message such as "No Service Found".
    #[strum(serialize = "none")]
    Placeholder,
}

impl ContextType {
    /// Sort priority; lower sorts first.
    ///
    /// Modified services come before unmodified ones. Tagged and untagged
    /// revisions share a rank so they order by name alone.
    pub fn priority(self) -> u8 {
        match self {
            Self::ServiceModified => 0,
            Self::Service => 1,
            Self::RevisionTagged | Self::Revision => 2,
            Self::BrokerFolder => 3,
            Self::ChannelFolder => 4,
            Self::SubscriptionFolder => 5,
            Self::Broker | Self::Channel | Self::Subscription => 6,
            Self::Placeholder => 7,
        }
    }

    /// File stem of the icon under `<icon_root>/context/`.
    pub fn icon_name(self) -> Option<&'static str> {
        match self {
            Self::Service | Self::ServiceModified => Some("service"),
            Self::Revision | Self::RevisionTagged => Some("revision"),
            Self::Broker | Self::BrokerFolder => Some("broker"),
            Self::Channel | Self::ChannelFolder => Some("channel"),
            Self::Subscription | Self::SubscriptionFolder => Some("subscription"),
            Self::Placeholder => None,
        }
    }
}

/// Expansion hint for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Collapsible {
    #[default]
    None,
    Collapsed,
    Expanded,
}

/// Which provider's tree a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Domain {
    Serving,
    Eventing,
}

/// What a node presents.
#[derive(Debug, Clone)]
pub enum NodeItem {
    Service(WeakHandle<Service>),
    Revision(WeakHandle<Revision>),
    Broker(WeakHandle<Broker>),
    Channel(WeakHandle<Channel>),
    Subscription(WeakHandle<Subscription>),
    /// A subscription destination not (yet) known to any registry.
    Sink(SinkRef),
    /// Folders and placeholders.
    None,
}

/// Command bound to activating a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeCommand {
    /// Show the cluster's current document.
    Describe(ResourceKey),
    /// Open the locally edited document.
    Edit(ResourceKey),
}

impl NodeCommand {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Describe(_) => "kntree.describe",
            Self::Edit(_) => "kntree.edit",
        }
    }

    pub fn key(&self) -> &ResourceKey {
        match self {
            Self::Describe(key) | Self::Edit(key) => key,
        }
    }
}

/// Resolves context types to icon files.
#[derive(Debug, Clone)]
pub struct IconTheme {
    root: PathBuf,
}

impl IconTheme {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/context/<icon>.svg`
    pub fn icon(&self, context: ContextType) -> Option<PathBuf> {
        context
            .icon_name()
            .map(|name| self.root.join("context").join(format!("{name}.svg")))
    }
}

/// Everything the UI needs to render one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub label: String,
    pub description: String,
    pub tooltip: Option<String>,
    pub icon: Option<PathBuf>,
    pub collapsible: Collapsible,
    pub command: Option<NodeCommand>,
    pub context_value: Option<String>,
}

// ── TreeNode ────────────────────────────────────────────────────────

/// One node in the Serving or Eventing tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    parent: Option<Arc<TreeNode>>,
    item: NodeItem,
    label: String,
    context: Option<ContextType>,
    collapsible: Collapsible,
    domain: Domain,
}

impl TreeNode {
    pub fn new(
        parent: Option<Arc<TreeNode>>,
        item: NodeItem,
        label: impl Into<String>,
        context: Option<ContextType>,
        collapsible: Collapsible,
        domain: Domain,
    ) -> Self {
        Self {
            parent,
            item,
            label: label.into(),
            context,
            collapsible,
            domain,
        }
    }

    /// An empty-state message node.
    pub fn placeholder(parent: Option<Arc<TreeNode>>, label: impl Into<String>, domain: Domain) -> Self {
        Self::new(
            parent,
            NodeItem::None,
            label,
            Some(ContextType::Placeholder),
            Collapsible::None,
            domain,
        )
    }

    pub fn parent(&self) -> Option<&Arc<TreeNode>> {
        self.parent.as_ref()
    }

    pub fn item(&self) -> &NodeItem {
        &self.item
    }

    /// The label the node was built with, without annotations.
    pub fn base_label(&self) -> &str {
        &self.label
    }

    pub fn context(&self) -> Option<ContextType> {
        self.context
    }

    pub fn collapsible(&self) -> Collapsible {
        self.collapsible
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Whether the presented resource is still canonical. Folders and
    /// placeholders are always live.
    pub fn is_live(&self) -> bool {
        match &self.item {
            NodeItem::Service(h) => h.is_live(),
            NodeItem::Revision(h) => h.is_live(),
            NodeItem::Broker(h) => h.is_live(),
            NodeItem::Channel(h) => h.is_live(),
            NodeItem::Subscription(h) => h.is_live(),
            NodeItem::Sink(_) | NodeItem::None => true,
        }
    }

    /// Identity of the presented resource, if it still exists.
    pub fn key(&self) -> Option<ResourceKey> {
        match &self.item {
            NodeItem::Service(h) => h.load().map(|s| s.key()),
            NodeItem::Revision(h) => h.load().map(|r| r.key()),
            NodeItem::Broker(h) => h.load().map(|b| b.key()),
            NodeItem::Channel(h) => h.load().map(|c| c.key()),
            NodeItem::Subscription(h) => h.load().map(|s| s.key()),
            NodeItem::Sink(sink) => Some(ResourceKey::new(
                sink.kind.resource_kind(),
                sink.namespace.clone(),
                sink.name.clone(),
            )),
            NodeItem::None => None,
        }
    }

    /// Display label. Revisions that receive traffic are annotated with
    /// their share, e.g. `example-75w7v (100%)`.
    pub fn label(&self) -> String {
        let NodeItem::Revision(h) = &self.item else {
            return self.label.clone();
        };
        match h.load() {
            Some(rev) if !rev.traffic.is_empty() && rev.percent() > 0 => {
                format!("{} ({}%)", self.label, rev.percent())
            }
            _ => self.label.clone(),
        }
    }

    /// `"modified"` for locally edited services; traffic markers for
    /// revisions; empty otherwise.
    pub fn description(&self) -> String {
        match &self.item {
            NodeItem::Service(h) => h
                .load()
                .filter(|s| s.modified)
                .map(|_| "modified".to_owned())
                .unwrap_or_default(),
            NodeItem::Revision(h) => h.load().map(|r| traffic_markers(&r)).unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// `"<Kind>: <name>"` for resource nodes.
    pub fn tooltip(&self) -> Option<String> {
        let key = self.key()?;
        Some(format!("{}: {}", key.kind, key.name))
    }

    /// Edit for locally modified services, describe for every other
    /// resource, nothing for folders and placeholders.
    pub fn command(&self) -> Option<NodeCommand> {
        if self.context == Some(ContextType::Placeholder) {
            return None;
        }
        let key = self.key()?;
        let modified = match &self.item {
            NodeItem::Service(h) => h.load().is_some_and(|s| s.modified),
            _ => false,
        };
        Some(if modified {
            NodeCommand::Edit(key)
        } else {
            NodeCommand::Describe(key)
        })
    }

    /// The kind of resource this node presents, if any.
    pub fn kind(&self) -> Option<ResourceKind> {
        match &self.item {
            NodeItem::Service(_) => Some(ResourceKind::Service),
            NodeItem::Revision(_) => Some(ResourceKind::Revision),
            NodeItem::Broker(_) => Some(ResourceKind::Broker),
            NodeItem::Channel(_) => Some(ResourceKind::Channel),
            NodeItem::Subscription(_) => Some(ResourceKind::Subscription),
            NodeItem::Sink(sink) => Some(sink.kind.resource_kind()),
            NodeItem::None => None,
        }
    }

    pub fn tree_item(&self, icons: &IconTheme) -> TreeItem {
        TreeItem {
            label: self.label(),
            description: self.description(),
            tooltip: self.tooltip(),
            icon: self.context.and_then(|c| icons.icon(c)),
            collapsible: self.collapsible,
            command: self.command(),
            context_value: self.context.map(|c| c.to_string()),
        }
    }
}

/// `latest` for each latest-revision entry and each tag, in split order.
fn traffic_markers(revision: &Revision) -> String {
    let mut out = String::new();
    for entry in &revision.traffic {
        for marker in entry
            .latest_revision
            .then_some("latest")
            .into_iter()
            .chain(entry.tag.as_deref())
        {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(marker);
        }
    }
    out
}

// ── Ordering ────────────────────────────────────────────────────────

/// Total order for siblings: defined context before absent context,
/// then context priority, then case-sensitive label.
pub fn compare_nodes(a: &TreeNode, b: &TreeNode) -> Ordering {
    match (a.context, b.context) {
        (Some(ca), Some(cb)) => ca
            .priority()
            .cmp(&cb.priority())
            .then_with(|| a.label.cmp(&b.label)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.label.cmp(&b.label),
    }
}

/// Stable sort of a sibling set with [`compare_nodes`].
pub fn sort_nodes(nodes: &mut [Arc<TreeNode>]) {
    nodes.sort_by(|a, b| compare_nodes(a, b));
}
