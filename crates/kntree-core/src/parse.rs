// ── CLI-output-to-domain conversions ──
//
// Bridges raw `kn ... -o json` output into canonical domain types.
// Parsing never fails outright: malformed documents and malformed items
// are reported as `ParseError`s next to whatever items did decode.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::ParseError;
use crate::model::{
    Broker, Channel, Condition, Revision, Service, SinkKind, SinkRef, Subscription, Traffic,
};

/// Namespace assumed when an item omits `metadata.namespace`.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Label carrying a revision's owning service.
const SERVICE_LABEL: &str = "serving.knative.dev/service";

/// Items decoded from one CLI response, plus every failure met on the way.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub items: Vec<T>,
    pub errors: Vec<ParseError>,
}

impl<T> Parsed<T> {
    /// The response could not be decoded at all: nothing came out and
    /// something went wrong. Distinct from a genuinely empty listing.
    pub fn is_failure(&self) -> bool {
        self.items.is_empty() && !self.errors.is_empty()
    }
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            errors: Vec::new(),
        }
    }
}

// ── Wire shapes ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireItem {
    #[serde(default)]
    metadata: WireMetadata,
    #[serde(default)]
    spec: Option<Value>,
    #[serde(default)]
    status: Option<WireStatus>,
}

#[derive(Debug, Default, Deserialize)]
struct WireMetadata {
    name: Option<String>,
    namespace: Option<String>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStatus {
    #[serde(default)]
    conditions: Option<Vec<Condition>>,
    #[serde(default)]
    traffic: Vec<WireTraffic>,
    url: Option<String>,
    address: Option<WireAddress>,
    latest_ready_revision_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTraffic {
    revision_name: Option<String>,
    tag: Option<String>,
    #[serde(default)]
    percent: Option<u32>,
    #[serde(default)]
    latest_revision: Option<bool>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireAddress {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireRef {
    kind: Option<String>,
    name: Option<String>,
    namespace: Option<String>,
}

/// Common fields every item must carry.
struct Decoded {
    name: String,
    namespace: String,
    labels: BTreeMap<String, String>,
    spec: Option<Value>,
    status: WireStatus,
    raw: Value,
}

// ── Document splitting ──────────────────────────────────────────────

/// Split a CLI response into item documents.
///
/// Accepts an object with an `items` array, a bare array, a single item
/// object, or newline-delimited JSON objects.
pub fn split_items(stdout: &str) -> Parsed<Value> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Parsed::default();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(doc) => split_document(doc),
        Err(whole_err) => {
            let mut parsed = Parsed::default();
            let lines: Vec<&str> = trimmed.lines().filter(|l| !l.trim().is_empty()).collect();
            if lines.len() < 2 {
                parsed.errors.push(ParseError::from(whole_err));
                return parsed;
            }
            for line in lines {
                match serde_json::from_str::<Value>(line) {
                    Ok(doc) => {
                        let inner = split_document(doc);
                        parsed.items.extend(inner.items);
                        parsed.errors.extend(inner.errors);
                    }
                    Err(e) => parsed.errors.push(ParseError::from(e)),
                }
            }
            parsed
        }
    }
}

fn split_document(doc: Value) -> Parsed<Value> {
    let mut parsed = Parsed::default();
    match doc {
        Value::Array(items) => parsed.items = items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => parsed.items = items,
            Some(Value::Null) => {}
            Some(other) => parsed
                .errors
                .push(ParseError::Shape(format!("`items` is not an array: {other}"))),
            None if map.contains_key("metadata") => parsed.items.push(Value::Object(map)),
            None => parsed
                .errors
                .push(ParseError::Shape("object has neither `items` nor `metadata`".into())),
        },
        other => parsed
            .errors
            .push(ParseError::Shape(format!("expected object or array, got {other}"))),
    }
    parsed
}

fn decode(index: usize, raw: Value) -> Result<Decoded, ParseError> {
    let item: WireItem = serde_json::from_value(raw.clone())?;
    let name = item
        .metadata
        .name
        .filter(|n| !n.is_empty())
        .ok_or(ParseError::MissingField {
            index,
            field: "metadata.name",
        })?;
    Ok(Decoded {
        name,
        namespace: item
            .metadata
            .namespace
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned()),
        labels: item.metadata.labels,
        spec: item.spec,
        status: item.status.unwrap_or_default(),
        raw,
    })
}

/// Decode every item with `convert`, collecting failures.
fn parse_with<T>(stdout: &str, mut convert: impl FnMut(Decoded) -> T) -> Parsed<T> {
    let docs = split_items(stdout);
    let mut parsed = Parsed {
        items: Vec::with_capacity(docs.items.len()),
        errors: docs.errors,
    };
    for (index, raw) in docs.items.into_iter().enumerate() {
        match decode(index, raw) {
            Ok(decoded) => parsed.items.push(convert(decoded)),
            Err(e) => parsed.errors.push(e),
        }
    }
    parsed
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Parse an optional URL string, silently dropping unparseable values.
fn parse_url(raw: Option<&str>) -> Option<Url> {
    raw.and_then(|s| Url::parse(s).ok())
}

fn address_url(status: &WireStatus) -> Option<Url> {
    status
        .address
        .as_ref()
        .and_then(|a| parse_url(a.url.as_deref()))
        .or_else(|| parse_url(status.url.as_deref()))
}

fn convert_traffic(wire: &[WireTraffic]) -> Vec<Traffic> {
    wire.iter()
        .map(|t| Traffic {
            revision_name: t.revision_name.clone(),
            tag: t.tag.clone(),
            percent: t.percent.unwrap_or(0),
            latest_revision: t.latest_revision.unwrap_or(false),
            url: parse_url(t.url.as_deref()),
        })
        .collect()
}

/// Resolve a destination ref at `pointer` inside `spec`.
fn sink_at(spec: Option<&Value>, pointer: &str, default_namespace: &str) -> Option<SinkRef> {
    let value = spec?.pointer(pointer)?;
    let wire: WireRef = serde_json::from_value(value.clone()).ok()?;
    let (Some(kind), Some(name)) = (wire.kind, wire.name) else {
        debug!(pointer, "destination has no kind/name ref; skipping");
        return None;
    };
    let Some(kind) = SinkKind::from_ref_kind(&kind) else {
        debug!(pointer, kind = %kind, "unsupported destination kind; skipping");
        return None;
    };
    Some(SinkRef {
        kind,
        name,
        namespace: wire
            .namespace
            .unwrap_or_else(|| default_namespace.to_owned()),
    })
}

// ── Per-kind parsers ────────────────────────────────────────────────

/// Parse `kn service list -o json`.
pub fn parse_services(stdout: &str) -> Parsed<Service> {
    parse_with(stdout, |d| Service {
        url: parse_url(d.status.url.as_deref()),
        traffic: convert_traffic(&d.status.traffic),
        latest_ready_revision: d.status.latest_ready_revision_name,
        conditions: d.status.conditions,
        modified: false,
        revisions: Vec::new(),
        name: d.name,
        namespace: d.namespace,
        raw: d.raw,
    })
}

/// Parse `kn revision list -o json`.
///
/// The owning service comes from the `serving.knative.dev/service`
/// label, falling back to `service` when the label is absent. Traffic
/// slices are filled in by the service registry.
pub fn parse_revisions(stdout: &str, service: &str) -> Parsed<Revision> {
    parse_with(stdout, |d| Revision {
        service: d
            .labels
            .get(SERVICE_LABEL)
            .cloned()
            .unwrap_or_else(|| service.to_owned()),
        conditions: d.status.conditions,
        traffic: Vec::new(),
        name: d.name,
        namespace: d.namespace,
        raw: d.raw,
    })
}

/// Parse `kn broker list -o json`.
pub fn parse_brokers(stdout: &str) -> Parsed<Broker> {
    parse_with(stdout, |d| Broker {
        url: address_url(&d.status),
        conditions: d.status.conditions,
        name: d.name,
        namespace: d.namespace,
        raw: d.raw,
    })
}

/// Parse `kn channel list -o json`.
pub fn parse_channels(stdout: &str) -> Parsed<Channel> {
    parse_with(stdout, |d| Channel {
        url: address_url(&d.status),
        conditions: d.status.conditions,
        name: d.name,
        namespace: d.namespace,
        raw: d.raw,
    })
}

/// Parse `kn subscription list -o json`.
pub fn parse_subscriptions(stdout: &str) -> Parsed<Subscription> {
    parse_with(stdout, |d| {
        let spec = d.spec.as_ref();
        let ns = d.namespace.as_str();
        Subscription {
            channel: sink_at(spec, "/channel", ns),
            subscriber: sink_at(spec, "/subscriber/ref", ns),
            dead_letter_sink: sink_at(spec, "/delivery/deadLetterSink/ref", ns),
            reply: sink_at(spec, "/reply/ref", ns),
            conditions: d.status.conditions,
            name: d.name,
            namespace: d.namespace,
            raw: d.raw,
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::Resource;

    fn service_list() -> String {
        json!({
            "apiVersion": "serving.knative.dev/v1",
            "kind": "ServiceList",
            "items": [
                {
                    "metadata": { "name": "example", "namespace": "a-serverless-example" },
                    "status": {
                        "url": "http://example-a-serverless-example.apps.devcluster.openshift.com",
                        "latestReadyRevisionName": "example-75w7v",
                        "conditions": [ { "type": "Ready", "status": "True" } ],
                        "traffic": [
                            { "latestRevision": true, "percent": 100, "revisionName": "example-75w7v" },
                            {
                                "latestRevision": false,
                                "percent": 0,
                                "revisionName": "example-75w7v",
                                "tag": "current",
                                "url": "http://current-example-a-serverless-example.apps.devcluster.openshift.com"
                            }
                        ]
                    }
                },
                { "metadata": { "name": "fresh", "namespace": "a-serverless-example" } }
            ]
        })
        .to_string()
    }

    #[test]
    fn parses_item_list_document() {
        let parsed = parse_services(&service_list());
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.items.len(), 2);

        let svc = &parsed.items[0];
        assert_eq!(svc.name, "example");
        assert_eq!(svc.namespace, "a-serverless-example");
        assert!(svc.is_ready());
        assert_eq!(svc.traffic.len(), 2);
        assert_eq!(svc.traffic[1].tag.as_deref(), Some("current"));
        assert!(svc.traffic[1].url.is_some());
        assert_eq!(svc.traffic[0].percent, 100);
    }

    #[test]
    fn missing_status_leaves_dependent_fields_empty() {
        let parsed = parse_services(&service_list());
        let fresh = &parsed.items[1];
        assert!(!fresh.is_ready());
        assert!(fresh.traffic.is_empty());
        assert!(fresh.url.is_none());
        assert!(fresh.revisions.is_empty());
    }

    #[test]
    fn parses_bare_array_and_single_object() {
        let array = json!([{ "metadata": { "name": "b1" } }]).to_string();
        let parsed = parse_brokers(&array);
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].namespace, DEFAULT_NAMESPACE);

        let single = json!({ "metadata": { "name": "c1", "namespace": "ns" } }).to_string();
        let parsed = parse_channels(&single);
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].name, "c1");
    }

    #[test]
    fn parses_newline_delimited_items() {
        let ndjson = "{\"metadata\":{\"name\":\"a\"}}\n{\"metadata\":{\"name\":\"b\"}}\nnot json\n";
        let parsed = parse_brokers(ndjson);
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.errors.len(), 1);
        assert!(!parsed.is_failure());
    }

    #[test]
    fn empty_output_is_an_empty_listing() {
        let parsed = parse_subscriptions("  \n");
        assert!(parsed.items.is_empty());
        assert!(parsed.errors.is_empty());
        assert!(!parsed.is_failure());
    }

    #[test]
    fn garbage_output_is_a_failure_not_a_panic() {
        let parsed = parse_services("Error: no route to host");
        assert!(parsed.items.is_empty());
        assert!(parsed.is_failure());
        assert!(matches!(parsed.errors[0], ParseError::Json(_)));
    }

    #[test]
    fn item_without_name_is_skipped_and_reported() {
        let doc = json!({ "items": [ { "metadata": {} }, { "metadata": { "name": "ok" } } ] });
        let parsed = parse_channels(&doc.to_string());
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(
            parsed.errors,
            vec![ParseError::MissingField {
                index: 0,
                field: "metadata.name"
            }]
        );
    }

    #[test]
    fn revisions_take_owner_from_label() {
        let doc = json!({ "items": [
            { "metadata": { "name": "example-75w7v", "labels": { "serving.knative.dev/service": "example" } } },
            { "metadata": { "name": "orphan-1" } }
        ]});
        let parsed = parse_revisions(&doc.to_string(), "fallback");
        assert_eq!(parsed.items[0].service, "example");
        assert_eq!(parsed.items[1].service, "fallback");
        assert!(parsed.items[0].traffic.is_empty());
    }

    #[test]
    fn subscription_sinks_are_classified() {
        let doc = json!({ "items": [ {
            "metadata": { "name": "sub", "namespace": "events" },
            "spec": {
                "channel": { "apiVersion": "messaging.knative.dev/v1", "kind": "InMemoryChannel", "name": "chan" },
                "subscriber": { "ref": { "apiVersion": "serving.knative.dev/v1", "kind": "Service", "name": "display" } },
                "delivery": { "deadLetterSink": { "ref": { "kind": "Broker", "name": "dlq", "namespace": "other" } } },
                "reply": { "uri": "http://example.com" }
            },
            "status": { "conditions": [ { "type": "Ready", "status": "True" } ] }
        } ] });
        let parsed = parse_subscriptions(&doc.to_string());
        let sub = &parsed.items[0];

        assert_eq!(
            sub.channel,
            Some(SinkRef {
                kind: SinkKind::Channel,
                name: "chan".into(),
                namespace: "events".into()
            })
        );
        assert_eq!(sub.subscriber.as_ref().unwrap().kind, SinkKind::Service);
        let dls = sub.dead_letter_sink.as_ref().unwrap();
        assert_eq!(dls.kind, SinkKind::Broker);
        assert_eq!(dls.namespace, "other");
        assert!(sub.reply.is_none());
        assert!(sub.is_ready());
    }
}
