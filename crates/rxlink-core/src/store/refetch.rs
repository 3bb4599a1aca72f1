// ── Refetch coordination ──
//
// Name-keyed indirection between mutations and the resource stores they
// invalidate. Names resolve against the closed `ResourceKind` set; unknown
// names are reported, never raised.

use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::{BoxFuture, join_all};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ErrorInfo;
use crate::model::ResourceKind;

/// Future returned by a refresh callable.
pub type RefreshFuture = BoxFuture<'static, Result<(), ErrorInfo>>;

/// Zero-argument "refresh this resource" callable.
pub type RefreshFn = Arc<dyn Fn() -> RefreshFuture + Send + Sync>;

/// Receives refetch diagnostics.
pub trait Diagnostics: Send + Sync {
    fn warn(&self, message: &str);
}

/// Default sink: `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn warn(&self, message: &str) {
        warn!(target: "rxlink::refetch", "{message}");
    }
}

/// What happened to one requested name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefetchOutcome {
    /// Awaited and succeeded.
    Refreshed,
    /// Awaited and failed.
    Failed { error: ErrorInfo },
    /// Started without waiting.
    Started,
    /// Not a registered resource; skipped.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefetchEntry {
    pub name: String,
    pub kind: Option<ResourceKind>,
    #[serde(flatten)]
    pub outcome: RefetchOutcome,
}

/// Per-name result of one `run`, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefetchReport {
    pub entries: Vec<RefetchEntry>,
}

impl RefetchReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unknown(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.outcome == RefetchOutcome::Unknown)
            .map(|e| e.name.as_str())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &ErrorInfo)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            RefetchOutcome::Failed { error } => Some((e.name.as_str(), error)),
            _ => None,
        })
    }

    pub fn outcome(&self, name: &str) -> Option<&RefetchOutcome> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.outcome)
    }
}

/// Registry of refresh callables keyed by resource kind.
pub struct RefetchCoordinator {
    registry: DashMap<ResourceKind, RefreshFn>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl RefetchCoordinator {
    pub fn new(diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            registry: DashMap::new(),
            diagnostics,
        }
    }

    /// Register `refresh` for `kind`. A second registration replaces the
    /// first.
    pub fn register(&self, kind: ResourceKind, refresh: RefreshFn) {
        if self.registry.insert(kind, refresh).is_some() {
            debug!(%kind, "refetch registration replaced");
        }
    }

    pub fn is_registered(&self, kind: ResourceKind) -> bool {
        self.registry.contains_key(&kind)
    }

    /// Refresh every registered name concurrently.
    ///
    /// Unknown names produce one diagnostic each and are skipped. With
    /// `await_all` this returns once every refresh has settled; otherwise
    /// the refreshes are detached.
    pub async fn run<S: AsRef<str>>(&self, names: &[S], await_all: bool) -> RefetchReport {
        let mut entries = Vec::with_capacity(names.len());
        let mut pending = Vec::new();

        for name in names {
            let name = name.as_ref();
            let refresh = name
                .parse::<ResourceKind>()
                .ok()
                .and_then(|kind| self.registry.get(&kind).map(|f| (kind, Arc::clone(f.value()))));

            match refresh {
                Some((kind, refresh)) => {
                    debug!(%kind, await_all, "refetching");
                    pending.push((entries.len(), tokio::spawn(refresh())));
                    entries.push(RefetchEntry {
                        name: name.to_owned(),
                        kind: Some(kind),
                        outcome: RefetchOutcome::Started,
                    });
                }
                None => {
                    self.diagnostics
                        .warn(&format!("{name} is not a defined query"));
                    entries.push(RefetchEntry {
                        name: name.to_owned(),
                        kind: None,
                        outcome: RefetchOutcome::Unknown,
                    });
                }
            }
        }

        if await_all {
            let (indices, handles): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
            for (index, joined) in indices.into_iter().zip(join_all(handles).await) {
                entries[index].outcome = match joined {
                    Ok(Ok(())) => RefetchOutcome::Refreshed,
                    Ok(Err(error)) => RefetchOutcome::Failed { error },
                    Err(e) => RefetchOutcome::Failed {
                        error: ErrorInfo::new(format!("refresh task failed: {e}")),
                    },
                };
            }
        }

        RefetchReport { entries }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures_util::FutureExt;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::RecordingDiagnostics;

    fn counting(counter: &Arc<AtomicUsize>, delay: Duration, result: Result<(), ErrorInfo>) -> RefreshFn {
        let counter = Arc::clone(counter);
        Arc::new(move || {
            let counter = Arc::clone(&counter);
            let result = result.clone();
            async move {
                tokio::time::sleep(delay).await;
                counter.fetch_add(1, Ordering::SeqCst);
                result
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn unknown_names_warn_once_and_others_run() {
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let coordinator = RefetchCoordinator::new(diagnostics.clone());
        let hits = Arc::new(AtomicUsize::new(0));
        coordinator.register(ResourceKind::Patients, counting(&hits, Duration::ZERO, Ok(())));

        let report = coordinator.run(&["patients", "bogusName"], true).await;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(diagnostics.messages(), ["bogusName is not a defined query"]);
        assert_eq!(report.outcome("patients"), Some(&RefetchOutcome::Refreshed));
        assert_eq!(report.unknown().collect::<Vec<_>>(), ["bogusName"]);
    }

    #[tokio::test]
    async fn registered_kind_missing_from_table_is_unknown() {
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let coordinator = RefetchCoordinator::new(diagnostics.clone());

        let report = coordinator.run(&["orders"], true).await;
        assert_eq!(report.outcome("orders"), Some(&RefetchOutcome::Unknown));
        assert_eq!(diagnostics.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn awaited_run_waits_for_every_refresh() {
        let coordinator = RefetchCoordinator::new(Arc::new(TracingDiagnostics));
        let hits = Arc::new(AtomicUsize::new(0));
        coordinator.register(
            ResourceKind::Patients,
            counting(&hits, Duration::from_millis(50), Ok(())),
        );
        coordinator.register(
            ResourceKind::Orders,
            counting(&hits, Duration::from_millis(500), Err(ErrorInfo::new("down"))),
        );

        let report = coordinator.run(&["patients", "getOrders"], true).await;

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(report.outcome("patients"), Some(&RefetchOutcome::Refreshed));
        assert_eq!(
            report.failed().collect::<Vec<_>>(),
            [("getOrders", &ErrorInfo::new("down"))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn detached_run_does_not_block() {
        let coordinator = RefetchCoordinator::new(Arc::new(TracingDiagnostics));
        let hits = Arc::new(AtomicUsize::new(0));
        coordinator.register(
            ResourceKind::Clients,
            counting(&hits, Duration::from_secs(5), Ok(())),
        );

        let report = coordinator.run(&["clients"], false).await;
        assert_eq!(report.outcome("clients"), Some(&RefetchOutcome::Started));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let coordinator = RefetchCoordinator::new(Arc::new(TracingDiagnostics));
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        coordinator.register(ResourceKind::Webhooks, counting(&first, Duration::ZERO, Ok(())));
        coordinator.register(ResourceKind::Webhooks, counting(&second, Duration::ZERO, Ok(())));

        coordinator.run(&["webhooks"], true).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert!(coordinator.is_registered(ResourceKind::Webhooks));
    }
}
