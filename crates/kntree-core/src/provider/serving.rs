// ── Serving data provider ──
//
// Services at the root, each expanding to its Revisions. Mutations go
// straight to `kn` and are followed by a refresh of the affected list.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Fetched, Refresh, RetryPolicy, describe, fetch_until_ready};
use crate::command::KnCommands;
use crate::config::KnConfig;
use crate::error::CoreError;
use crate::executor::CommandExecutor;
use crate::model::{Handle, Resource, ResourceKey, ResourceKind, Revision, Service};
use crate::parse::{parse_revisions, parse_services};
use crate::store::Registries;
use crate::tree::{
    Collapsible, ContextType, Domain, IconTheme, NodeItem, TreeItem, TreeNode, sort_nodes,
};

const NO_SERVICE: &str = "No Service Found";
const NO_REVISION: &str = "No Revision Found";

/// Serves the Serving tree (`getChildren` / `getTreeItem`).
pub struct ServingDataProvider<E> {
    executor: Arc<E>,
    registries: Arc<Registries>,
    commands: KnCommands,
    retry: RetryPolicy,
    icons: IconTheme,
    cancel: CancellationToken,
}

impl<E: CommandExecutor> ServingDataProvider<E> {
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

    /// Children of `parent`: Services at the root, Revisions under a
    /// Service, nothing anywhere else.
    pub async fn get_children(
        &self,
        parent: Option<&Arc<TreeNode>>,
    ) -> Result<Vec<Arc<TreeNode>>, CoreError> {
        match parent {
            None => self.get_services().await,
            Some(node) if matches!(node.item(), NodeItem::Service(_)) => {
                self.get_revisions(node).await
            }
            Some(_) => Ok(Vec::new()),
        }
    }

    pub fn get_tree_item(&self, node: &TreeNode) -> TreeItem {
        node.tree_item(&self.icons)
    }

    /// Refresh the Service list and build its sorted nodes.
    pub async fn get_services(&self) -> Result<Vec<Arc<TreeNode>>, CoreError> {
        let Fetched::Ready(handles) = self.refresh_services().await? else {
            return Ok(vec![Arc::new(TreeNode::placeholder(
                None,
                NO_SERVICE,
                Domain::Serving,
            ))]);
        };

        let mut nodes: Vec<Arc<TreeNode>> = handles
            .iter()
            .map(|h| Arc::new(service_node(None, h)))
            .collect();
        sort_nodes(&mut nodes);
        Ok(nodes)
    }

    /// Refresh the Revisions of the Service `parent` presents.
    pub async fn get_revisions(
        &self,
        parent: &Arc<TreeNode>,
    ) -> Result<Vec<Arc<TreeNode>>, CoreError> {
        let NodeItem::Service(weak) = parent.item() else {
            return Ok(Vec::new());
        };
        // The Service was removed since the parent node was built.
        let Some(service) = weak.load() else {
            return Ok(Vec::new());
        };

        let Fetched::Ready(handles) = self.refresh_revisions(&service.key()).await? else {
            return Ok(vec![Arc::new(TreeNode::placeholder(
                Some(Arc::clone(parent)),
                NO_REVISION,
                Domain::Serving,
            ))]);
        };

        let mut nodes: Vec<Arc<TreeNode>> = handles
            .iter()
            .map(|h| Arc::new(revision_node(Arc::clone(parent), h)))
            .collect();
        sort_nodes(&mut nodes);
        Ok(nodes)
    }

    /// Fetch Services until every listed one reports conditions.
    pub async fn refresh_services(&self) -> Result<Fetched<Service>, CoreError> {
        let command = self.commands.list(ResourceKind::Service);
        let services = &self.registries.services;
        fetch_until_ready(
            self.executor.as_ref(),
            &self.retry,
            &self.cancel.child_token(),
            Refresh {
                kind: ResourceKind::Service,
                command: &command,
                parse: parse_services,
                reconcile: |items: Vec<Service>, prune: bool| -> Result<_, CoreError> {
                    if prune {
                        return Ok(services.reconcile(items).handles);
                    }
                    services.add_many(items);
                    Ok(services.snapshot())
                },
            },
        )
        .await
    }

    /// Fetch one Service's Revisions until every one reports conditions.
    pub async fn refresh_revisions(
        &self,
        service: &ResourceKey,
    ) -> Result<Fetched<Revision>, CoreError> {
        let command = self.commands.list_revisions(&service.name);
        let services = &self.registries.services;
        fetch_until_ready(
            self.executor.as_ref(),
            &self.retry,
            &self.cancel.child_token(),
            Refresh {
                kind: ResourceKind::Revision,
                command: &command,
                parse: |stdout: &str| parse_revisions(stdout, &service.name),
                reconcile: |items: Vec<Revision>, prune: bool| {
                    if prune {
                        return services
                            .reconcile_revisions(service, items)
                            .map(|r| r.handles);
                    }
                    services.add_revisions(service, items)?;
                    Ok(services
                        .find(service)
                        .map(|s| s.load().revisions.clone())
                        .unwrap_or_default())
                },
            },
        )
        .await
    }

    /// YAML manifest of a Service or Revision.
    pub async fn describe(&self, kind: ResourceKind, name: &str) -> Result<String, CoreError> {
        let command = self.commands.describe(kind, name);
        describe(self.executor.as_ref(), &command, kind, name).await
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// `kn service create`, then wait for the new Service to be ready.
    pub async fn create_service(&self, name: &str, image: &str) -> Result<(), CoreError> {
        let command = self.commands.create_service(name, image);
        let stdout = self.executor.execute(&command).await.into_result(&command)?;
        info!(service = name, image, "service created");
        debug!(%stdout, "kn output");
        self.refresh_services().await.map(drop)
    }

    /// `kn service delete`. The Service and its Revisions leave the
    /// registry before the follow-up refresh runs.
    pub async fn delete_service(&self, name: &str) -> Result<(), CoreError> {
        let command = self.commands.delete(ResourceKind::Service, name);
        self.executor.execute(&command).await.into_result(&command)?;
        info!(service = name, "service deleted");

        let services = &self.registries.services;
        let key = services
            .find_by_name(name, self.commands.namespace())
            .map(|h| h.load().key());
        if let Some(key) = key {
            services.remove(&key);
        }
        self.refresh_services().await.map(drop)
    }

    /// `kn revision delete`. The Revision leaves its Service immediately.
    pub async fn delete_revision(&self, name: &str) -> Result<(), CoreError> {
        let command = self.commands.delete(ResourceKind::Revision, name);
        self.executor.execute(&command).await.into_result(&command)?;
        info!(revision = name, "revision deleted");

        let services = &self.registries.services;
        let Some(location) = services.find_pair_and_index(name) else {
            warn!(revision = name, "deleted revision was not in the registry");
            return Ok(());
        };
        services.remove_revision(name);
        let service = location.service.load().key();
        self.refresh_revisions(&service).await.map(drop)
    }

    /// Flag a Service as locally edited (or clear the flag after the
    /// edit was applied or discarded).
    pub fn mark_modified(&self, name: &str, modified: bool) -> Result<Handle<Service>, CoreError> {
        let services = &self.registries.services;
        let key = services
            .find_by_name(name, self.commands.namespace())
            .map(|h| h.load().key())
            .ok_or_else(|| CoreError::NotFound {
                kind: ResourceKind::Service,
                identifier: name.to_owned(),
            })?;
        services
            .set_modified(&key, modified)
            .ok_or_else(|| CoreError::NotFound {
                kind: ResourceKind::Service,
                identifier: key.to_string(),
            })
    }

    /// Cancel every in-flight readiness loop. Further refreshes return
    /// `Cancelled` immediately.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

fn service_node(parent: Option<Arc<TreeNode>>, handle: &Handle<Service>) -> TreeNode {
    let service = handle.load();
    let context = if service.modified {
        ContextType::ServiceModified
    } else {
        ContextType::Service
    };
    TreeNode::new(
        parent,
        NodeItem::Service(handle.downgrade()),
        service.name.clone(),
        Some(context),
        Collapsible::Expanded,
        Domain::Serving,
    )
}

fn revision_node(parent: Arc<TreeNode>, handle: &Handle<Revision>) -> TreeNode {
    let revision = handle.load();
    let context = if revision.is_tagged() {
        ContextType::RevisionTagged
    } else {
        ContextType::Revision
    };
    TreeNode::new(
        Some(parent),
        NodeItem::Revision(handle.downgrade()),
        revision.name.clone(),
        Some(context),
        Collapsible::None,
        Domain::Serving,
    )
}
