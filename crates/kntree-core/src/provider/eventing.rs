// ── Eventing data provider ──
//
// Folder nodes for Brokers, Channels, and Subscriptions at the root.
// Subscriptions expand to their destinations, which may resolve into
// the Serving registry.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{Fetched, Refresh, RetryPolicy, describe, fetch_until_ready};
use crate::command::KnCommands;
use crate::config::KnConfig;
use crate::error::CoreError;
use crate::executor::CommandExecutor;
use crate::model::{
    Broker, Channel, Handle, Resource, ResourceKey, ResourceKind, SinkKind, SinkRef, Subscription,
};
use crate::parse::{Parsed, parse_brokers, parse_channels, parse_subscriptions};
use crate::store::{Registries, Registry};
use crate::tree::{
    Collapsible, ContextType, Domain, IconTheme, NodeItem, TreeItem, TreeNode, sort_nodes,
};

const NO_BROKER: &str = "No Broker Found";
const NO_CHANNEL: &str = "No Channel Found";
const NO_SUBSCRIPTION: &str = "No Subscription Found";

/// Serves the Eventing tree (`getChildren` / `getTreeItem`).
pub struct EventingDataProvider<E> {
    executor: Arc<E>,
    registries: Arc<Registries>,
    commands: KnCommands,
    retry: RetryPolicy,
    icons: IconTheme,
    cancel: CancellationToken,
}

impl<E: CommandExecutor> EventingDataProvider<E> {
    pub fn new(executor: Arc<E>, registries: Arc<Registries>, config: &KnConfig) -> Self {
        Self {
            executor,
            registries,
            commands: KnCommands::from_config(config),
            retry: config.retry.clone(),
            icons: IconTheme::new(config.icon_root.clone()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn registries(&self) -> &Arc<Registries> {
        &self.registries
    }

    /// Folders at the root; each folder lists its kind; a Subscription
    /// lists its destinations. Everything else is a leaf.
    pub async fn get_children(
        &self,
        parent: Option<&Arc<TreeNode>>,
    ) -> Result<Vec<Arc<TreeNode>>, CoreError> {
        let Some(parent) = parent else {
            return Ok(folders());
        };
        match (parent.context(), parent.item()) {
            (Some(ContextType::BrokerFolder), _) => self.get_brokers(parent).await,
            (Some(ContextType::ChannelFolder), _) => self.get_channels(parent).await,
            (Some(ContextType::SubscriptionFolder), _) => self.get_subscriptions(parent).await,
            (_, NodeItem::Subscription(_)) => Ok(self.get_subscription_children(parent)),
            _ => Ok(Vec::new()),
        }
    }

    pub fn get_tree_item(&self, node: &TreeNode) -> TreeItem {
        node.tree_item(&self.icons)
    }

    pub async fn get_brokers(&self, parent: &Arc<TreeNode>) -> Result<Vec<Arc<TreeNode>>, CoreError> {
        let fetched = self.refresh_brokers().await?;
        Ok(leaf_nodes(parent, fetched, NO_BROKER, ContextType::Broker, |h| {
            NodeItem::Broker(h.downgrade())
        }))
    }

    pub async fn get_channels(&self, parent: &Arc<TreeNode>) -> Result<Vec<Arc<TreeNode>>, CoreError> {
        let fetched = self.refresh_channels().await?;
        Ok(leaf_nodes(parent, fetched, NO_CHANNEL, ContextType::Channel, |h| {
            NodeItem::Channel(h.downgrade())
        }))
    }

    /// Subscriptions, after every listed one reports conditions.
    pub async fn get_subscriptions(
        &self,
        parent: &Arc<TreeNode>,
    ) -> Result<Vec<Arc<TreeNode>>, CoreError> {
        let Fetched::Ready(handles) = self.refresh_subscriptions().await? else {
            return Ok(vec![Arc::new(TreeNode::placeholder(
                Some(Arc::clone(parent)),
                NO_SUBSCRIPTION,
                Domain::Eventing,
            ))]);
        };
        let mut nodes: Vec<Arc<TreeNode>> = handles
            .iter()
            .map(|h| {
                Arc::new(TreeNode::new(
                    Some(Arc::clone(parent)),
                    NodeItem::Subscription(h.downgrade()),
                    h.load().name.clone(),
                    Some(ContextType::Subscription),
                    Collapsible::Expanded,
                    Domain::Eventing,
                ))
            })
            .collect();
        sort_nodes(&mut nodes);
        Ok(nodes)
    }

    /// Destination nodes of a Subscription, in the fixed order Channel,
    /// Sink, DeadLetterSink, Reply. A missing Channel yields a
    /// placeholder; the other destinations are simply omitted.
    pub fn get_subscription_children(&self, parent: &Arc<TreeNode>) -> Vec<Arc<TreeNode>> {
        let NodeItem::Subscription(weak) = parent.item() else {
            return Vec::new();
        };
        let Some(subscription) = weak.load() else {
            return Vec::new();
        };

        let destinations = [
            ("Channel", subscription.channel.as_ref()),
            ("Sink", subscription.subscriber.as_ref()),
            ("DeadLetterSink", subscription.dead_letter_sink.as_ref()),
            ("Reply", subscription.reply.as_ref()),
        ];

        let mut children = Vec::with_capacity(destinations.len());
        for (index, (role, sink)) in destinations.into_iter().enumerate() {
            match sink {
                Some(sink) => children.push(Arc::new(self.sink_node(parent, role, sink))),
                None if index == 0 => children.push(Arc::new(TreeNode::placeholder(
                    Some(Arc::clone(parent)),
                    NO_CHANNEL,
                    Domain::Eventing,
                ))),
                None => {}
            }
        }
        children
    }

    /// Wrap a destination in the node type of its own domain, pointing at
    /// the canonical resource when a registry knows it.
    fn sink_node(&self, parent: &Arc<TreeNode>, role: &str, sink: &SinkRef) -> TreeNode {
        let label = format!("{role} - {}", sink.name);
        // Identity is kind, namespace, and name; a same-named resource in
        // another namespace is a different resource.
        let key = ResourceKey::new(sink.kind.resource_kind(), &sink.namespace, &sink.name);
        let (item, context, domain) = match sink.kind {
            SinkKind::Broker => (
                self.registries
                    .brokers
                    .find(&key)
                    .map_or_else(|| NodeItem::Sink(sink.clone()), |h| NodeItem::Broker(h.downgrade())),
                ContextType::Broker,
                Domain::Eventing,
            ),
            SinkKind::Channel => (
                self.registries
                    .channels
                    .find(&key)
                    .map_or_else(|| NodeItem::Sink(sink.clone()), |h| NodeItem::Channel(h.downgrade())),
                ContextType::Channel,
                Domain::Eventing,
            ),
            SinkKind::Service => (
                self.registries
                    .services
                    .find(&key)
                    .map_or_else(|| NodeItem::Sink(sink.clone()), |h| NodeItem::Service(h.downgrade())),
                ContextType::Service,
                Domain::Serving,
            ),
        };
        TreeNode::new(
            Some(Arc::clone(parent)),
            item,
            label,
            Some(context),
            Collapsible::None,
            domain,
        )
    }

    // ── Refresh ──────────────────────────────────────────────────────

    pub async fn refresh_brokers(&self) -> Result<Fetched<Broker>, CoreError> {
        self.refresh(ResourceKind::Broker, parse_brokers, &self.registries.brokers)
            .await
    }

    pub async fn refresh_channels(&self) -> Result<Fetched<Channel>, CoreError> {
        self.refresh(ResourceKind::Channel, parse_channels, &self.registries.channels)
            .await
    }

    pub async fn refresh_subscriptions(&self) -> Result<Fetched<Subscription>, CoreError> {
        self.refresh(
            ResourceKind::Subscription,
            parse_subscriptions,
            &self.registries.subscriptions,
        )
        .await
    }

    async fn refresh<T: Resource>(
        &self,
        kind: ResourceKind,
        parse: fn(&str) -> Parsed<T>,
        registry: &Registry<T>,
    ) -> Result<Fetched<T>, CoreError> {
        let command = self.commands.list(kind);
        fetch_until_ready(
            self.executor.as_ref(),
            &self.retry,
            &self.cancel.child_token(),
            Refresh {
                kind,
                command: &command,
                parse,
                reconcile: |items: Vec<T>, prune: bool| -> Result<_, CoreError> {
                    if prune {
                        return Ok(registry.reconcile(items).handles);
                    }
                    registry.add_many(items);
                    Ok(registry.snapshot())
                },
            },
        )
        .await
    }

    pub async fn describe(&self, kind: ResourceKind, name: &str) -> Result<String, CoreError> {
        let command = self.commands.describe(kind, name);
        describe(self.executor.as_ref(), &command, kind, name).await
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub async fn create_broker(&self, name: &str) -> Result<(), CoreError> {
        self.run_create(ResourceKind::Broker, name).await?;
        self.refresh_brokers().await.map(drop)
    }

    pub async fn delete_broker(&self, name: &str) -> Result<(), CoreError> {
        self.run_delete(ResourceKind::Broker, name).await?;
        forget(&self.registries.brokers, name, self.commands.namespace());
        self.refresh_brokers().await.map(drop)
    }

    pub async fn create_channel(&self, name: &str) -> Result<(), CoreError> {
        self.run_create(ResourceKind::Channel, name).await?;
        self.refresh_channels().await.map(drop)
    }

    pub async fn delete_channel(&self, name: &str) -> Result<(), CoreError> {
        self.run_delete(ResourceKind::Channel, name).await?;
        forget(&self.registries.channels, name, self.commands.namespace());
        self.refresh_channels().await.map(drop)
    }

    pub async fn delete_subscription(&self, name: &str) -> Result<(), CoreError> {
        self.run_delete(ResourceKind::Subscription, name).await?;
        forget(&self.registries.subscriptions, name, self.commands.namespace());
        self.refresh_subscriptions().await.map(drop)
    }

    async fn run_create(&self, kind: ResourceKind, name: &str) -> Result<(), CoreError> {
        let command = self.commands.create(kind, name);
        let stdout = self.executor.execute(&command).await.into_result(&command)?;
        info!(%kind, name, "created");
        debug!(%stdout, "kn output");
        Ok(())
    }

    async fn run_delete(&self, kind: ResourceKind, name: &str) -> Result<(), CoreError> {
        let command = self.commands.delete(kind, name);
        self.executor.execute(&command).await.into_result(&command)?;
        info!(%kind, name, "deleted");
        Ok(())
    }

    /// Cancel every in-flight readiness loop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Root folder nodes, in fixed order.
fn folders() -> Vec<Arc<TreeNode>> {
    [
        ("Brokers", ContextType::BrokerFolder),
        ("Channels", ContextType::ChannelFolder),
        ("Subscriptions", ContextType::SubscriptionFolder),
    ]
    .into_iter()
    .map(|(label, context)| {
        Arc::new(TreeNode::new(
            None,
            NodeItem::None,
            label,
            Some(context),
            Collapsible::Collapsed,
            Domain::Eventing,
        ))
    })
    .collect()
}

fn leaf_nodes<T: Resource>(
    parent: &Arc<TreeNode>,
    fetched: Fetched<T>,
    empty_label: &str,
    context: ContextType,
    item: impl Fn(&Handle<T>) -> NodeItem,
) -> Vec<Arc<TreeNode>> {
    let Fetched::Ready(handles) = fetched else {
        return vec![Arc::new(TreeNode::placeholder(
            Some(Arc::clone(parent)),
            empty_label,
            Domain::Eventing,
        ))];
    };
    let mut nodes: Vec<Arc<TreeNode>> = handles
        .iter()
        .map(|h| {
            Arc::new(TreeNode::new(
                Some(Arc::clone(parent)),
                item(h),
                h.load().name().to_owned(),
                Some(context),
                Collapsible::None,
                Domain::Eventing,
            ))
        })
        .collect();
    sort_nodes(&mut nodes);
    nodes
}

/// Drop a just-deleted resource from its registry ahead of the refresh.
fn forget<T: Resource>(registry: &Registry<T>, name: &str, namespace: Option<&str>) {
    let key = registry.find_by_name(name, namespace).map(|h| h.load().key());
    if let Some(key) = key {
        registry.remove(&key);
    }
}
