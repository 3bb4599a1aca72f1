// ── Reactive slot streams ──
//
// Subscription handles for session, resource and mutation slots.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A subscription to one slot.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via [`changed()`](Self::changed) or by converting to a
/// `Stream`.
pub struct SlotStream<S: Clone + Send + Sync + 'static> {
    current: S,
    receiver: watch::Receiver<S>,
}

impl<S: Clone + Send + Sync + 'static> SlotStream<S> {
    pub(crate) fn new(receiver: watch::Receiver<S>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time or by the last `changed()`.
    pub fn current(&self) -> &S {
        &self.current
    }

    /// The latest value (may have changed since creation).
    pub fn latest(&self) -> S {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new value.
    /// Returns `None` if the owning controller has been dropped.
    pub async fn changed(&mut self) -> Option<S> {
        self.receiver.changed().await.ok()?;
        let value = self.receiver.borrow_and_update().clone();
        self.current = value.clone();
        Some(value)
    }

    /// Wait until the slot satisfies `predicate` (checked against the
    /// current value first).
    pub async fn wait_for(&mut self, predicate: impl FnMut(&S) -> bool) -> Option<S> {
        let value = self.receiver.wait_for(predicate).await.ok()?.clone();
        self.current = value.clone();
        Some(value)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> SlotWatchStream<S> {
        SlotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current value first, then every subsequent write.
pub struct SlotWatchStream<S: Clone + Send + Sync + 'static> {
    inner: WatchStream<S>,
}

impl<S: Clone + Send + Sync + 'static> Stream for SlotWatchStream<S> {
    type Item = S;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
