//! Session lifecycle and reactive data layer between `rxlink-api` and UI
//! consumers.
//!
//! - **[`Provider`]**: the single context object a UI binding holds. It
//!   flattens the session fields, exposes the auth actions, one accessor per
//!   resource kind and one factory per mutation kind.
//!
//! - **[`SessionController`]**: the authentication state machine
//!   (`Initializing → Authenticated | Unauthenticated`, with a side-channel
//!   `error`). Drives the redirect handshake on mount and re-reads the
//!   principal after every credential refresh, notifying only when its
//!   version marker changed.
//!
//! - **[`ResourceStore`]**: one `{value, loading, error}` slot per query
//!   kind, backed by a `tokio::sync::watch` channel. Every fetch overwrites
//!   the slot; a failed fetch leaves the empty value behind.
//!
//! - **[`MutationController`]** and **[`RefetchCoordinator`]**: writes run
//!   once per `invoke`, then refresh the resources named in their
//!   [`RefetchOptions`], awaited or detached. Unknown names are reported
//!   through [`Diagnostics`] and skipped.
//!
//! - **[`SlotStream`]**: subscription handle over any slot, with
//!   `current()` / `latest()` / `changed()` and conversion into a `Stream`.

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod mutation;
pub mod operations;
pub mod provider;
pub mod session;
pub mod store;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ProviderConfig, TlsVerification};
pub use error::{CoreError, ErrorInfo};
pub use mutation::{MutationController, MutationOutcome, RefetchOptions};
pub use operations::requests::*;
pub use operations::{Mutation, Query};
pub use provider::Provider;
pub use session::{
    AccessTokenProvider, RedirectSink, SessionController, SessionEvent, SessionPhase,
    SessionState, has_auth_params,
};
pub use store::{
    Diagnostics, FetchOutcome, MutationSlot, RefetchCoordinator, RefetchEntry, RefetchOutcome,
    RefetchReport, ResourceBinding, ResourceSlot, ResourceStore, TracingDiagnostics,
};
pub use stream::{SlotStream, SlotWatchStream};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Address, ApiClient, EntityRef, Fill, FillState, MutationKind, Name, Order, OrderState,
    Organization, Patient, PatientSummary, Prescription, PrescriptionState, Principal,
    ResourceKind, SexType, WebhookConfig,
};
