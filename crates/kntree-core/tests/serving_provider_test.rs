// Integration tests for `ServingDataProvider` against a scripted `kn`.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{ScriptedExecutor, config, list, ready, registries, revision, service};
use kntree_core::{
    CliExitData, ContextType, CoreError, KnConfig, NodeCommand, NodeItem, Resource, ResourceKey,
    ResourceKind, RetryPolicy, ServingDataProvider, TreeNode,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn example_traffic() -> serde_json::Value {
    json!([
        { "revisionName": "example-75w7v", "latestRevision": true, "percent": 100 },
        { "revisionName": "example-75w7v", "latestRevision": false, "percent": 0, "tag": "current" },
        { "revisionName": "example-2fvz4", "latestRevision": false, "percent": 0, "tag": "old" },
    ])
}

fn provider(exec: &Arc<ScriptedExecutor>) -> ServingDataProvider<ScriptedExecutor> {
    ServingDataProvider::new(Arc::clone(exec), registries(), &config())
}

fn labels(nodes: &[Arc<TreeNode>]) -> Vec<String> {
    nodes.iter().map(|n| n.label()).collect()
}

fn key(name: &str) -> ResourceKey {
    ResourceKey::new(ResourceKind::Service, "default", name)
}

// ── Services ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_services_are_listed_sorted() {
    let exec = ScriptedExecutor::new([list(vec![
        service("b", json!([]), Some(ready())),
        service("a", json!([]), Some(ready())),
    ])]);
    let provider = provider(&exec);

    let nodes = provider.get_children(None).await.unwrap();

    assert_eq!(labels(&nodes), vec!["a", "b"]);
    assert_eq!(exec.commands(), vec!["kn service list -o json"]);
    assert_eq!(provider.registries().services.len(), 2);
    assert!(nodes.iter().all(|n| n.context() == Some(ContextType::Service)));
}

#[tokio::test]
async fn test_empty_listing_yields_single_placeholder() {
    let exec = ScriptedExecutor::new([list(Vec::new())]);
    let provider = provider(&exec);

    let nodes = provider.get_children(None).await.unwrap();

    assert_eq!(labels(&nodes), vec!["No Service Found"]);
    assert!(provider.registries().services.is_empty());
    let item = provider.get_tree_item(&nodes[0]);
    assert!(item.command.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_not_ready_service_is_polled_until_ready() {
    let exec = ScriptedExecutor::new([
        list(vec![service("fresh", json!([]), None)]),
        list(vec![service("fresh", json!([]), Some(ready()))]),
    ]);
    let provider = provider(&exec);

    let nodes = provider.get_services().await.unwrap();

    assert_eq!(exec.calls(), 2);
    assert_eq!(labels(&nodes), vec!["fresh"]);
    let canonical = provider.registries().services.find(&key("fresh")).unwrap();
    assert!(canonical.load().is_ready());
    assert_eq!(provider.registries().services.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_readiness_gives_up_after_max_attempts() {
    let exec = ScriptedExecutor::new([list(vec![service("stuck", json!([]), None)])]);
    let provider = provider(&exec);

    let err = provider.get_services().await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::NotReady {
            kind: ResourceKind::Service,
            attempts: 5
        }
    ));
    assert_eq!(exec.calls(), 5);
    // The last evaluation stays reconciled.
    assert!(provider.registries().services.find(&key("stuck")).is_some());
}

#[tokio::test]
async fn test_transport_failure_keeps_known_state() {
    let exec = ScriptedExecutor::new([
        list(vec![service("a", json!([]), Some(ready()))]),
        CliExitData::failure(1, "Error: Unable to connect to the server"),
    ]);
    let provider = provider(&exec);

    provider.get_services().await.unwrap();
    let before = provider.registries().services.find(&key("a")).unwrap();

    let err = provider.get_services().await.unwrap_err();

    assert!(err.is_transport());
    assert!(err.to_string().contains("Unable to connect"));
    let after = provider.registries().services.find(&key("a")).unwrap();
    assert!(before.ptr_eq(&after));
}

#[tokio::test]
async fn test_undecodable_output_does_not_prune() {
    let exec = ScriptedExecutor::new([
        list(vec![service("a", json!([]), Some(ready()))]),
        CliExitData::success("Error: something printed to stdout"),
    ]);
    let provider = provider(&exec);
    provider.get_services().await.unwrap();

    let nodes = provider.get_services().await.unwrap();

    assert_eq!(labels(&nodes), vec!["No Service Found"]);
    assert_eq!(provider.registries().services.len(), 1);
}

#[tokio::test]
async fn test_partially_decodable_listing_keeps_skipped_services() {
    let exec = ScriptedExecutor::new([
        list(vec![
            service("a", json!([]), Some(ready())),
            service("b", json!([]), Some(ready())),
        ]),
        list(vec![
            service("a", json!([]), Some(ready())),
            service(
                "b",
                json!([{ "revisionName": "b-00001", "percent": "100" }]),
                Some(ready()),
            ),
        ]),
    ]);
    let provider = provider(&exec);
    let first = provider.get_services().await.unwrap();
    assert_eq!(labels(&first), vec!["a", "b"]);

    let second = provider.get_services().await.unwrap();

    // `b` failed to decode this time; it keeps its last known state.
    assert_eq!(labels(&second), vec!["a", "b"]);
    assert_eq!(provider.registries().services.len(), 2);
    assert!(first[1].is_live());
    let b = provider.registries().services.find(&key("b")).unwrap();
    assert!(b.load().traffic.is_empty());
}

#[tokio::test]
async fn test_partially_decodable_revisions_keep_skipped_revisions() {
    let exec = ScriptedExecutor::new([
        list(vec![service("example", json!([]), Some(ready()))]),
        list(vec![
            revision("example-75w7v", "example", Some(ready())),
            revision("example-2fvz4", "example", Some(ready())),
        ]),
        list(vec![
            revision("example-75w7v", "example", Some(ready())),
            json!({ "metadata": { "namespace": "default" } }),
        ]),
    ]);
    let provider = provider(&exec);
    let services = provider.get_services().await.unwrap();
    provider.get_revisions(&services[0]).await.unwrap();

    let revisions = provider.get_revisions(&services[0]).await.unwrap();

    assert_eq!(revisions.len(), 2);
    assert!(provider.registries().services.find_revision("example-2fvz4").is_some());
}

#[tokio::test]
async fn test_refresh_updates_service_in_place() {
    let exec = ScriptedExecutor::new([
        list(vec![service("example", json!([]), Some(ready()))]),
        list(vec![service("example", example_traffic(), Some(ready()))]),
    ]);
    let provider = provider(&exec);

    let first = provider.get_services().await.unwrap();
    let second = provider.get_services().await.unwrap();

    let NodeItem::Service(weak_a) = first[0].item() else {
        panic!("expected a service node");
    };
    let NodeItem::Service(weak_b) = second[0].item() else {
        panic!("expected a service node");
    };
    let a = weak_a.upgrade().unwrap();
    assert!(a.ptr_eq(&weak_b.upgrade().unwrap()));
    assert_eq!(a.load().traffic.len(), 3);
    assert!(first[0].is_live());
}

#[tokio::test]
async fn test_modified_service_sorts_first_and_edits() {
    let exec = ScriptedExecutor::new([list(vec![
        service("exampleA", json!([]), Some(ready())),
        service("exampleB", json!([]), Some(ready())),
    ])]);
    let provider = provider(&exec);
    provider.get_services().await.unwrap();

    provider.mark_modified("exampleB", true).unwrap();
    let nodes = provider.get_services().await.unwrap();

    assert_eq!(labels(&nodes), vec!["exampleB", "exampleA"]);
    assert_eq!(nodes[0].context(), Some(ContextType::ServiceModified));
    let item = provider.get_tree_item(&nodes[0]);
    assert_eq!(item.description, "modified");
    assert!(matches!(item.command, Some(NodeCommand::Edit(_))));

    let err = provider.mark_modified("ghost", true).unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
}

// ── Revisions ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_revisions_carry_traffic_annotations() {
    let exec = ScriptedExecutor::new([
        list(vec![service("example", example_traffic(), Some(ready()))]),
        list(vec![
            revision("example-g4hm8", "example", Some(ready())),
            revision("example-75w7v", "example", Some(ready())),
            revision("example-2fvz4", "example", Some(ready())),
        ]),
    ]);
    let provider = provider(&exec);

    let services = provider.get_children(None).await.unwrap();
    let revisions = provider.get_children(Some(&services[0])).await.unwrap();

    assert_eq!(
        exec.commands()[1],
        "kn revision list -s example -o json".to_owned()
    );
    assert_eq!(
        labels(&revisions),
        vec!["example-2fvz4", "example-75w7v (100%)", "example-g4hm8"]
    );

    let tagged = provider.get_tree_item(&revisions[1]);
    assert_eq!(tagged.description, "latest current");
    assert_eq!(tagged.tooltip.as_deref(), Some("Revision: example-75w7v"));
    assert_eq!(
        tagged.icon.unwrap().to_string_lossy(),
        "/opt/kntree/images/context/revision.svg"
    );
    assert_eq!(revisions[1].context(), Some(ContextType::RevisionTagged));
    assert_eq!(revisions[2].context(), Some(ContextType::Revision));
    assert!(revisions[1].parent().is_some());

    // Revisions are leaves.
    assert!(provider.get_children(Some(&revisions[0])).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_service_without_revisions_shows_placeholder() {
    let exec = ScriptedExecutor::new([
        list(vec![service("example", json!([]), Some(ready()))]),
        list(Vec::new()),
    ]);
    let provider = provider(&exec);

    let services = provider.get_services().await.unwrap();
    let revisions = provider.get_revisions(&services[0]).await.unwrap();

    assert_eq!(labels(&revisions), vec!["No Revision Found"]);
}

#[tokio::test]
async fn test_find_pair_and_index_after_refresh() {
    let exec = ScriptedExecutor::new([
        list(vec![
            service("aaa", json!([]), Some(ready())),
            service("example", example_traffic(), Some(ready())),
        ]),
        list(vec![
            revision("example-75w7v", "example", Some(ready())),
            revision("example-2fvz4", "example", Some(ready())),
        ]),
    ]);
    let provider = provider(&exec);
    let services = provider.get_services().await.unwrap();
    provider.get_revisions(&services[1]).await.unwrap();

    let loc = provider
        .registries()
        .services
        .find_pair_and_index("example-2fvz4")
        .unwrap();

    assert_eq!(loc.service_index, 1);
    assert_eq!(loc.revision_index, 1);
    assert_eq!(loc.service.load().name, "example");
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_service_cascades_to_revisions() {
    let exec = ScriptedExecutor::new([
        list(vec![service("example", example_traffic(), Some(ready()))]),
        list(vec![
            revision("example-75w7v", "example", Some(ready())),
            revision("example-2fvz4", "example", Some(ready())),
        ]),
        CliExitData::success("Service 'example' successfully deleted in namespace 'default'."),
        list(Vec::new()),
    ]);
    let provider = provider(&exec);
    let services = provider.get_services().await.unwrap();
    let revisions = provider.get_revisions(&services[0]).await.unwrap();
    let mut events = provider.registries().events();

    provider.delete_service("example").await.unwrap();

    assert_eq!(exec.commands()[2], "kn service delete example");
    let regs = provider.registries();
    assert!(regs.services.find(&key("example")).is_none());
    assert!(regs.services.find_revision("example-75w7v").is_none());
    assert!(regs.services.find_revision("example-2fvz4").is_none());
    assert!(!services[0].is_live());
    assert!(revisions.iter().all(|n| !n.is_live()));

    let deleted: Vec<ResourceKind> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|e| e.key.kind)
        .collect();
    assert_eq!(
        deleted,
        vec![ResourceKind::Service, ResourceKind::Revision, ResourceKind::Revision]
    );
}

#[tokio::test]
async fn test_delete_revision_refreshes_owner() {
    let exec = ScriptedExecutor::new([
        list(vec![service("example", example_traffic(), Some(ready()))]),
        list(vec![
            revision("example-75w7v", "example", Some(ready())),
            revision("example-2fvz4", "example", Some(ready())),
        ]),
        CliExitData::success("Revision 'example-2fvz4' deleted in namespace 'default'."),
        list(vec![revision("example-75w7v", "example", Some(ready()))]),
    ]);
    let provider = provider(&exec);
    let services = provider.get_services().await.unwrap();
    provider.get_revisions(&services[0]).await.unwrap();

    provider.delete_revision("example-2fvz4").await.unwrap();

    assert_eq!(
        exec.commands()[2..],
        [
            "kn revision delete example-2fvz4".to_owned(),
            "kn revision list -s example -o json".to_owned()
        ]
    );
    let regs = provider.registries();
    assert!(regs.services.find_revision("example-2fvz4").is_none());
    assert!(regs.services.find_revision("example-75w7v").is_some());
}

#[tokio::test]
async fn test_failed_create_surfaces_stderr() {
    let exec = ScriptedExecutor::new([CliExitData::failure(
        1,
        "Error: services.serving.knative.dev \"hello\" already exists",
    )]);
    let provider = provider(&exec);

    let err = provider
        .create_service("hello", "gcr.io/knative-samples/helloworld-go")
        .await
        .unwrap_err();

    match err {
        CoreError::CommandFailed { command, stderr, .. } => {
            assert_eq!(
                command,
                "kn service create hello --image gcr.io/knative-samples/helloworld-go"
            );
            assert!(stderr.contains("already exists"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(exec.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_create_service_waits_for_readiness() {
    let exec = ScriptedExecutor::new([
        CliExitData::success("Service 'hello' created."),
        list(vec![service("hello", json!([]), None)]),
        list(vec![service("hello", json!([]), Some(ready()))]),
    ]);
    let provider = provider(&exec);

    provider
        .create_service("hello", "gcr.io/knative-samples/helloworld-go")
        .await
        .unwrap();

    assert_eq!(exec.calls(), 3);
    let svc = provider.registries().services.find(&key("hello")).unwrap();
    assert!(svc.load().is_ready());
}

// ── Namespaces and cancellation ─────────────────────────────────────

#[tokio::test]
async fn test_namespace_flag_on_every_command() {
    let exec = ScriptedExecutor::new([list(Vec::new())]);
    let cfg = KnConfig {
        namespace: Some("team-a".into()),
        ..config()
    };
    let provider = ServingDataProvider::new(Arc::clone(&exec), registries(), &cfg);

    provider.get_services().await.unwrap();

    assert_eq!(exec.commands(), vec!["kn service list -o json -n team-a"]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_in_flight_polling() {
    let exec = ScriptedExecutor::new([list(vec![service("stuck", json!([]), None)])]);
    let cfg = KnConfig {
        retry: RetryPolicy {
            initial_backoff: Duration::from_millis(100),
            ..RetryPolicy::unbounded()
        },
        ..config()
    };
    let provider = ServingDataProvider::new(Arc::clone(&exec), registries(), &cfg);

    let (result, ()) = tokio::join!(provider.get_services(), async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        provider.shutdown();
    });

    assert!(matches!(result, Err(CoreError::Cancelled)));
    assert!(exec.calls() > 1);

    let again = provider.get_services().await;
    assert!(matches!(again, Err(CoreError::Cancelled)));
}

#[tokio::test]
async fn test_describe_returns_manifest() {
    let exec = ScriptedExecutor::new([CliExitData::success(
        "apiVersion: serving.knative.dev/v1\nkind: Service\n",
    )]);
    let provider = provider(&exec);

    let yaml = provider.describe(ResourceKind::Service, "example").await.unwrap();

    assert!(yaml.starts_with("apiVersion: serving.knative.dev/v1"));
    assert_eq!(exec.commands(), vec!["kn service describe example -o yaml"]);
}
