//! `kntree tree`: walk a provider the way an editor would and print it.

use std::future::Future;
use std::sync::Arc;

use kntree_core::{
    Collapsible, CommandExecutor, CoreError, EventingDataProvider, ServingDataProvider, TreeItem,
    TreeNode,
};

use super::Session;
use crate::cli::{TreeArgs, TreeDomain};
use crate::error::CliError;
use crate::output;

/// The `getChildren` / `getTreeItem` pair both providers expose.
pub trait TreeSource: Sync {
    fn children(
        &self,
        parent: Option<&Arc<TreeNode>>,
    ) -> impl Future<Output = Result<Vec<Arc<TreeNode>>, CoreError>> + Send;

    fn item(&self, node: &TreeNode) -> TreeItem;
}

impl<E: CommandExecutor> TreeSource for ServingDataProvider<E> {
    fn children(
        &self,
        parent: Option<&Arc<TreeNode>>,
    ) -> impl Future<Output = Result<Vec<Arc<TreeNode>>, CoreError>> + Send {
        self.get_children(parent)
    }

    fn item(&self, node: &TreeNode) -> TreeItem {
        self.get_tree_item(node)
    }
}

impl<E: CommandExecutor> TreeSource for EventingDataProvider<E> {
    fn children(
        &self,
        parent: Option<&Arc<TreeNode>>,
    ) -> impl Future<Output = Result<Vec<Arc<TreeNode>>, CoreError>> + Send {
        self.get_children(parent)
    }

    fn item(&self, node: &TreeNode) -> TreeItem {
        self.get_tree_item(node)
    }
}

pub async fn handle<E: CommandExecutor>(args: TreeArgs, session: &Session<E>) -> Result<(), CliError> {
    let color = session.color;
    let mut sections = Vec::new();

    if matches!(args.domain, TreeDomain::Serving | TreeDomain::All) {
        sections.push(("Serving", render_tree(&session.serving, color).await?));
    }
    if matches!(args.domain, TreeDomain::Eventing | TreeDomain::All) {
        sections.push(("Eventing", render_tree(&session.eventing, color).await?));
    }

    let titled = sections.len() > 1;
    let mut out = Vec::new();
    for (title, lines) in sections {
        if titled {
            if !out.is_empty() {
                out.push(String::new());
            }
            out.push(output::heading(title, color));
        }
        out.extend(lines);
    }
    output::print_output(&out.join("\n"));
    Ok(())
}

/// Depth-first walk from the root, expanding every node that has
/// children. Each expansion is a fresh refresh through the provider.
pub async fn render_tree<S: TreeSource>(source: &S, color: bool) -> Result<Vec<String>, CoreError> {
    let mut lines = Vec::new();
    let mut stack: Vec<(Arc<TreeNode>, usize)> = source
        .children(None)
        .await?
        .into_iter()
        .rev()
        .map(|node| (node, 0))
        .collect();

    while let Some((node, depth)) = stack.pop() {
        let item = source.item(&node);
        lines.push(output::tree_line(&item, node.context(), depth, color));
        if item.collapsible == Collapsible::None {
            continue;
        }
        let children = source.children(Some(&node)).await?;
        stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }
    Ok(lines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::{Arc, Mutex};

    use kntree_core::{CliCommand, CliExitData, CommandExecutor, KnConfig, RetryPolicy};

    use super::*;

    /// Answers each `kn` invocation with the next canned response.
    struct Canned(Mutex<VecDeque<String>>);

    impl CommandExecutor for Canned {
        fn execute(&self, _command: &CliCommand) -> impl Future<Output = CliExitData> + Send {
            let stdout = self.0.lock().unwrap().pop_front().unwrap_or_default();
            async move { CliExitData::success(stdout) }
        }
    }

    fn session(responses: &[&str]) -> Session<Canned> {
        let exec = Canned(Mutex::new(responses.iter().map(|s| (*s).to_owned()).collect()));
        let config = KnConfig {
            retry: RetryPolicy {
                max_attempts: Some(1),
                ..RetryPolicy::default()
            },
            ..KnConfig::default()
        };
        Session::new(Arc::new(exec), &config, false)
    }

    const SERVICES: &str = r#"{"items": [{
        "metadata": {"name": "hello", "namespace": "default"},
        "status": {
            "conditions": [{"type": "Ready", "status": "True"}],
            "traffic": [{"revisionName": "hello-00001", "percent": 100, "latestRevision": true}]
        }
    }]}"#;

    const REVISIONS: &str = r#"{"items": [{
        "metadata": {"name": "hello-00001", "namespace": "default",
                     "labels": {"serving.knative.dev/service": "hello"}},
        "status": {"conditions": [{"type": "Ready", "status": "True"}]}
    }]}"#;

    #[tokio::test]
    async fn serving_tree_nests_revisions() {
        let session = session(&[SERVICES, REVISIONS]);

        let lines = render_tree(&session.serving, false).await.unwrap();

        assert_eq!(lines, vec!["hello", "  hello-00001 (100%)  latest"]);
    }

    #[tokio::test]
    async fn empty_eventing_tree_shows_placeholders() {
        let session = session(&["[]", "[]", "[]"]);

        let lines = render_tree(&session.eventing, false).await.unwrap();

        assert_eq!(
            lines,
            vec![
                "Brokers",
                "  No Broker Found",
                "Channels",
                "  No Channel Found",
                "Subscriptions",
                "  No Subscription Found",
            ]
        );
    }
}
