// ── Per-kind resource store ──
//
// One shared `{value, loading, error}` slot per query kind. Every fetch
// runs the query and overwrites the slot when it completes. There is no
// request sequencing: a slow earlier fetch can land after a faster later
// one and win.

use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use tracing::debug;

use rxlink_api::QueryExecutor;

use super::cell::SlotCell;
use super::refetch::RefreshFn;
use super::slot::ResourceSlot;
use crate::error::{CoreError, ErrorInfo};
use crate::operations::{Query, decode_field, encode_variables};
use crate::stream::SlotStream;

/// Result of a direct execution that bypasses the slot.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome<T> {
    pub value: T,
    pub error: Option<ErrorInfo>,
}

/// Reactive cache for one query kind. Cheap to clone.
pub struct ResourceStore<Q: Query> {
    inner: Arc<StoreInner<Q>>,
}

struct StoreInner<Q: Query> {
    executor: Arc<dyn QueryExecutor>,
    slot: SlotCell<ResourceSlot<Q::Output>>,
    /// Args of the most recent `bind`, to fetch once per distinct args.
    bound: Mutex<Option<Q::Args>>,
}

impl<Q: Query> Clone for ResourceStore<Q> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<Q: Query> ResourceStore<Q> {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                executor,
                slot: SlotCell::new(ResourceSlot::default()),
                bound: Mutex::new(None),
            }),
        }
    }

    /// Snapshot of the slot.
    pub fn slot(&self) -> ResourceSlot<Q::Output> {
        self.inner.slot.get()
    }

    pub fn subscribe(&self) -> SlotStream<ResourceSlot<Q::Output>> {
        SlotStream::new(self.inner.slot.subscribe())
    }

    /// Number of slot writes so far.
    pub fn version(&self) -> u64 {
        self.inner.slot.version()
    }

    /// Mark loading, run the query, write value and error, clear loading.
    ///
    /// Returns the error written to the slot, if any.
    pub async fn fetch(&self, args: Q::Args) -> Option<ErrorInfo> {
        self.begin();
        self.complete(&args).await
    }

    /// Subscribe and fetch `args`, unless the previous bind used the same
    /// args. The fetch runs in the background; the binding sees it land.
    pub fn bind(&self, args: Q::Args) -> ResourceBinding<Q> {
        let stream = self.subscribe();

        let is_new = {
            let mut bound = self.inner.bound.lock().expect("bound args lock poisoned");
            if bound.as_ref() == Some(&args) {
                false
            } else {
                *bound = Some(args.clone());
                true
            }
        };

        if is_new {
            debug!(operation = Q::OPERATION.name, ?args, "bind triggers fetch");
            self.begin();
            let store = self.clone();
            tokio::spawn(async move {
                store.complete(&args).await;
            });
        }

        ResourceBinding {
            store: self.clone(),
            stream,
        }
    }

    /// Run the query directly. The slot is neither read nor written.
    pub async fn refetch(&self, args: &Q::Args) -> FetchOutcome<Q::Output> {
        self.execute(args).await
    }

    /// A refresh callable for the refetch coordinator: fetch with default
    /// args, failing when the slot ends up with an error.
    pub(crate) fn refresher(&self) -> RefreshFn
    where
        Q::Args: Default,
    {
        let store = self.clone();
        Arc::new(move || {
            let store = store.clone();
            async move {
                match store.fetch(Q::Args::default()).await {
                    Some(err) => Err(err),
                    None => Ok(()),
                }
            }
            .boxed()
        })
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn begin(&self) {
        self.inner.slot.update(|slot| slot.loading = true);
    }

    async fn complete(&self, args: &Q::Args) -> Option<ErrorInfo> {
        let FetchOutcome { value, error } = self.execute(args).await;
        let written = error.clone();
        self.inner.slot.update(move |slot| {
            slot.value = value;
            slot.error = error;
            slot.loading = false;
        });
        written
    }

    async fn execute(&self, args: &Q::Args) -> FetchOutcome<Q::Output> {
        let variables = match encode_variables(args) {
            Ok(vars) => vars,
            Err(e) => {
                return FetchOutcome {
                    value: Q::Output::default(),
                    error: Some(ErrorInfo::from(e)),
                };
            }
        };

        let response = self.inner.executor.query(&Q::OPERATION, variables).await;
        let mut error = response.error.map(|e| ErrorInfo::from(CoreError::from(e)));
        let value = match decode_field(response.data.as_ref(), Q::FIELD) {
            Ok(value) => value,
            Err(e) => {
                error.get_or_insert_with(|| ErrorInfo::from(e));
                Q::Output::default()
            }
        };
        FetchOutcome { value, error }
    }
}

/// A subscriber's view of a resource: the slot stream plus the imperative
/// `refetch`.
pub struct ResourceBinding<Q: Query> {
    store: ResourceStore<Q>,
    stream: SlotStream<ResourceSlot<Q::Output>>,
}

impl<Q: Query> ResourceBinding<Q> {
    /// Latest slot value.
    pub fn slot(&self) -> ResourceSlot<Q::Output> {
        self.stream.latest()
    }

    pub fn stream(&mut self) -> &mut SlotStream<ResourceSlot<Q::Output>> {
        &mut self.stream
    }

    /// Wait until the slot is not loading and return it.
    pub async fn settled(&mut self) -> Option<ResourceSlot<Q::Output>> {
        self.stream.wait_for(ResourceSlot::is_settled).await
    }

    /// Direct re-read that bypasses the shared slot.
    pub async fn refetch(&self, args: &Q::Args) -> FetchOutcome<Q::Output> {
        self.store.refetch(args).await
    }

    pub fn into_stream(self) -> SlotStream<ResourceSlot<Q::Output>> {
        self.stream
    }
}
