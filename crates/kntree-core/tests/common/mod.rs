// Shared helpers for provider integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};

use kntree_core::{CliCommand, CliExitData, CommandExecutor, KnConfig, Registries, RetryPolicy};

// ── Scripted executor ───────────────────────────────────────────────

/// Replays canned responses in order and records every command it ran.
/// The final response repeats once the script runs out.
#[derive(Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<CliExitData>>,
    seen: Mutex<Vec<CliCommand>>,
}

impl ScriptedExecutor {
    pub fn new(responses: impl IntoIterator<Item = CliExitData>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, response: CliExitData) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn commands(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(ToString::to_string).collect()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, command: &CliCommand) -> CliExitData {
        self.seen.lock().unwrap().push(command.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap_or_default()
        }
    }
}

// ── Config ──────────────────────────────────────────────────────────

pub fn config() -> KnConfig {
    KnConfig {
        retry: RetryPolicy {
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(50),
            max_attempts: Some(5),
        },
        icon_root: "/opt/kntree/images".into(),
        ..KnConfig::default()
    }
}

pub fn registries() -> Arc<Registries> {
    Arc::new(Registries::new())
}

// ── Fixtures ────────────────────────────────────────────────────────

pub fn ready() -> Value {
    json!([{ "type": "Ready", "status": "True" }])
}

pub fn list(items: Vec<Value>) -> CliExitData {
    CliExitData::success(json!({ "apiVersion": "v1", "items": items, "kind": "List" }).to_string())
}

pub fn service(name: &str, traffic: Value, conditions: Option<Value>) -> Value {
    let mut status = json!({
        "url": format!("http://{name}.default.example.com"),
        "latestReadyRevisionName": format!("{name}-75w7v"),
        "traffic": traffic,
    });
    if let Some(c) = conditions {
        status["conditions"] = c;
    }
    json!({
        "apiVersion": "serving.knative.dev/v1",
        "kind": "Service",
        "metadata": { "name": name, "namespace": "default" },
        "status": status,
    })
}

pub fn revision(name: &str, service: &str, conditions: Option<Value>) -> Value {
    let mut item = json!({
        "apiVersion": "serving.knative.dev/v1",
        "kind": "Revision",
        "metadata": {
            "name": name,
            "namespace": "default",
            "labels": { "serving.knative.dev/service": service },
        },
        "status": {},
    });
    if let Some(c) = conditions {
        item["status"]["conditions"] = c;
    }
    item
}

pub fn simple(kind: &str, name: &str, conditions: Option<Value>) -> Value {
    let mut item = json!({
        "kind": kind,
        "metadata": { "name": name, "namespace": "default" },
        "status": { "address": { "url": format!("http://{name}.default.svc.cluster.local") } },
    });
    if let Some(c) = conditions {
        item["status"]["conditions"] = c;
    }
    item
}

pub fn subscription(name: &str, spec: Value, conditions: Option<Value>) -> Value {
    let mut item = json!({
        "kind": "Subscription",
        "metadata": { "name": name, "namespace": "default" },
        "spec": spec,
        "status": {},
    });
    if let Some(c) = conditions {
        item["status"]["conditions"] = c;
    }
    item
}
