// ── Mutation controller ──
//
// Runs one bound write per explicit `invoke`, tracks its slot, and hands
// the configured refetch list to the coordinator once the write settles.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use rxlink_api::QueryExecutor;

use crate::error::{CoreError, ErrorInfo};
use crate::operations::{Mutation, decode_optional, encode_variables};
use crate::store::cell::SlotCell;
use crate::store::{MutationSlot, RefetchCoordinator, RefetchReport};
use crate::stream::SlotStream;

/// Which resources to refresh after the write, and whether `invoke`
/// waits for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefetchOptions {
    pub refetch_queries: Vec<String>,
    pub await_refetch_queries: bool,
}

impl RefetchOptions {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            refetch_queries: names.into_iter().map(Into::into).collect(),
            await_refetch_queries: false,
        }
    }

    #[must_use]
    pub fn awaited(mut self) -> Self {
        self.await_refetch_queries = true;
        self
    }
}

/// What one invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome<T> {
    pub data: Option<T>,
    pub error: Option<ErrorInfo>,
    /// Empty when no refetch was configured.
    pub refetch: RefetchReport,
}

/// A write operation bound to its slot.
pub struct MutationController<M: Mutation> {
    executor: Arc<dyn QueryExecutor>,
    coordinator: Arc<RefetchCoordinator>,
    slot: Arc<SlotCell<MutationSlot<M::Output>>>,
    options: RefetchOptions,
    _operation: PhantomData<fn() -> M>,
}

impl<M: Mutation> Clone for MutationController<M> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            coordinator: Arc::clone(&self.coordinator),
            slot: Arc::clone(&self.slot),
            options: self.options.clone(),
            _operation: PhantomData,
        }
    }
}

impl<M: Mutation> MutationController<M> {
    /// A controller with a slot of its own.
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        coordinator: Arc<RefetchCoordinator>,
        options: RefetchOptions,
    ) -> Self {
        Self::with_slot(
            executor,
            coordinator,
            Arc::new(SlotCell::new(MutationSlot::default())),
            options,
        )
    }

    /// A controller writing to an existing slot; every controller sharing
    /// it observes the same `{result, loading, error}`.
    pub(crate) fn with_slot(
        executor: Arc<dyn QueryExecutor>,
        coordinator: Arc<RefetchCoordinator>,
        slot: Arc<SlotCell<MutationSlot<M::Output>>>,
        options: RefetchOptions,
    ) -> Self {
        Self {
            executor,
            coordinator,
            slot,
            options,
            _operation: PhantomData,
        }
    }

    pub fn slot(&self) -> MutationSlot<M::Output> {
        self.slot.get()
    }

    pub fn subscribe(&self) -> SlotStream<MutationSlot<M::Output>> {
        SlotStream::new(self.slot.subscribe())
    }

    pub fn options(&self) -> &RefetchOptions {
        &self.options
    }

    pub async fn invoke(&self, variables: M::Variables) -> MutationOutcome<M::Output> {
        self.invoke_with(variables, |_| {}).await
    }

    /// Run the write. `on_completed` fires only when a response was
    /// received, application errors included.
    pub async fn invoke_with<F>(
        &self,
        variables: M::Variables,
        on_completed: F,
    ) -> MutationOutcome<M::Output>
    where
        F: FnOnce(Option<&M::Output>) + Send,
    {
        self.slot.update(|slot| slot.loading = true);
        debug!(mutation = %M::KIND, "invoking");

        let (data, error, structural) = self.run(&variables).await;

        self.slot.update(|slot| {
            slot.result.clone_from(&data);
            slot.error.clone_from(&error);
            slot.loading = false;
        });

        if structural {
            on_completed(data.as_ref());
        }

        let refetch = if self.options.refetch_queries.is_empty() {
            RefetchReport::default()
        } else {
            self.coordinator
                .run(
                    &self.options.refetch_queries,
                    self.options.await_refetch_queries,
                )
                .await
        };

        MutationOutcome {
            data,
            error,
            refetch,
        }
    }

    /// `(result, error, structural)`.
    async fn run(&self, variables: &M::Variables) -> (Option<M::Output>, Option<ErrorInfo>, bool) {
        let vars = match encode_variables(variables) {
            Ok(vars) => vars,
            Err(e) => return (None, Some(ErrorInfo::from(e)), false),
        };

        match self.executor.mutate(&M::OPERATION, vars).await {
            Ok(response) => {
                let mut error = response.errors.first().map(ErrorInfo::from);
                let data = match decode_optional::<M::Output>(response.data.as_ref(), M::FIELD) {
                    Ok(data) => data,
                    Err(e) => {
                        error.get_or_insert_with(|| ErrorInfo::from(e));
                        None
                    }
                };
                if let Some(err) = &error {
                    debug!(mutation = %M::KIND, error = %err, "write returned errors");
                }
                (data, error, true)
            }
            Err(e) => {
                let err = CoreError::from(e);
                warn!(mutation = %M::KIND, error = %err, "write failed");
                (None, Some(ErrorInfo::from(&err)), false)
            }
        }
    }
}
