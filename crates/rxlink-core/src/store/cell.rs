// ── Single-value reactive cell ──
//
// A `watch` channel holding one slot value plus a version counter that is
// bumped on every notifying write. Subscribers read snapshots; only the
// owning controller writes.

use tokio::sync::watch;

pub(crate) struct SlotCell<S: Clone + Send + Sync + 'static> {
    state: watch::Sender<S>,

    /// Version counter, bumped on every notifying write.
    version: watch::Sender<u64>,
}

impl<S: Clone + Send + Sync + 'static> SlotCell<S> {
    pub(crate) fn new(initial: S) -> Self {
        let (state, _) = watch::channel(initial);
        let (version, _) = watch::channel(0u64);
        Self { state, version }
    }

    /// Current value (clone of the last write).
    pub(crate) fn get(&self) -> S {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    /// Number of notifying writes so far.
    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Modify in place and notify unconditionally.
    pub(crate) fn update(&self, modify: impl FnOnce(&mut S)) {
        // `send_modify` updates even with zero receivers.
        self.state.send_modify(modify);
        self.bump_version();
    }

    /// Modify in place; notify only when `modify` returns `true`.
    pub(crate) fn update_if(&self, modify: impl FnOnce(&mut S) -> bool) -> bool {
        let changed = self.state.send_if_modified(modify);
        if changed {
            self.bump_version();
        }
        changed
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}
