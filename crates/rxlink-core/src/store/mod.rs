// ── Reactive stores ──
//
// One single-slot cache per resource kind, plus the name-keyed registry
// mutations use to refresh them.

pub(crate) mod cell;
mod refetch;
mod resource;
mod slot;

pub use refetch::{
    Diagnostics, RefetchCoordinator, RefetchEntry, RefetchOutcome, RefetchReport, RefreshFn,
    RefreshFuture, TracingDiagnostics,
};
pub use resource::{FetchOutcome, ResourceBinding, ResourceStore};
pub use slot::{MutationSlot, ResourceSlot};
