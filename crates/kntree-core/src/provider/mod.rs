// ── Data providers ──
//
// Refresh orchestration: execute a list command, parse, reconcile into
// the registries, and poll until every reported resource is ready.

mod eventing;
mod retry;
mod serving;

pub use eventing::EventingDataProvider;
pub use retry::RetryPolicy;
pub use serving::ServingDataProvider;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::executor::{CliCommand, CommandExecutor};
use crate::model::{Handle, Resource, ResourceKind};
use crate::parse::Parsed;

/// Terminal state of one refresh cycle.
#[derive(Debug)]
pub enum Fetched<T> {
    /// Nothing listed (or nothing decodable): render a placeholder.
    Empty,
    /// Every listed resource is ready; canonical handles in listing order.
    Ready(Vec<Handle<T>>),
}

/// One listing request: which command to run and how to fold its output
/// into the registries. `reconcile` receives the decoded items and whether
/// the listing is complete enough to prune what it no longer reports.
pub(crate) struct Refresh<'a, P, R> {
    pub kind: ResourceKind,
    pub command: &'a CliCommand,
    pub parse: P,
    pub reconcile: R,
}

/// `kn <noun> describe <name> -o yaml`, returned verbatim.
pub(crate) async fn describe<E: CommandExecutor>(
    executor: &E,
    command: &CliCommand,
    kind: ResourceKind,
    name: &str,
) -> Result<String, CoreError> {
    let yaml = executor.execute(command).await.into_result(command)?;
    debug!(%kind, name, bytes = yaml.len(), "described");
    Ok(yaml)
}

/// Run the fetch → evaluate cycle until the listing is empty or ready.
///
/// Transport failures return immediately and leave the registry as the
/// previous evaluation left it. Output that cannot be decoded at all is
/// treated as empty without pruning. A listing where only some items
/// decode is merged without pruning, so an undecodable item keeps its
/// last known state. A listing with any not-ready item is reconciled,
/// then fetched again after the policy's backoff.
pub(crate) async fn fetch_until_ready<E, T, P, R>(
    executor: &E,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut refresh: Refresh<'_, P, R>,
) -> Result<Fetched<T>, CoreError>
where
    E: CommandExecutor,
    T: Resource,
    P: FnMut(&str) -> Parsed<T> + Send,
    R: FnMut(Vec<T>, bool) -> Result<Vec<Handle<T>>, CoreError> + Send,
{
    let kind = refresh.kind;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        debug!(%kind, attempt = attempts, command = %refresh.command, "fetching");

        let output = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(CoreError::Cancelled),
            output = executor.execute(refresh.command) => output,
        };
        let stdout = output.into_result(refresh.command)?;

        let parsed = (refresh.parse)(&stdout);
        for error in &parsed.errors {
            warn!(%kind, %error, "skipping undecodable output");
        }
        if parsed.is_failure() {
            warn!(%kind, "listing could not be decoded; keeping known state");
            return Ok(Fetched::Empty);
        }

        let prune = parsed.errors.is_empty();
        if !prune {
            warn!(%kind, skipped = parsed.errors.len(), "partial listing; merging without pruning");
        }

        let handles = (refresh.reconcile)(parsed.items, prune)?;
        if handles.is_empty() {
            debug!(%kind, "listing is empty");
            return Ok(Fetched::Empty);
        }

        let pending = handles.iter().filter(|h| !h.load().is_ready()).count();
        if pending == 0 {
            debug!(%kind, count = handles.len(), attempts, "listing ready");
            return Ok(Fetched::Ready(handles));
        }

        if !policy.allows(attempts) {
            warn!(%kind, pending, attempts, "giving up waiting for readiness");
            return Err(CoreError::NotReady { kind, attempts });
        }

        let delay = policy.backoff(attempts - 1);
        debug!(
            %kind,
            pending,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "resources not ready, polling again"
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(CoreError::Cancelled),
            () = tokio::time::sleep(delay) => {}
        }
    }
}
