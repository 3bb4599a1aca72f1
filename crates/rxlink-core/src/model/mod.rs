// ── Domain model ──
//
// Lean serde representations of the API entities the provider exposes,
// plus the authenticated principal and the resource/mutation identifiers.

pub mod client;
pub mod common;
pub mod kind;
pub mod order;
pub mod patient;
pub mod prescription;
pub mod principal;
pub mod webhook;

// ── Re-exports ──────────────────────────────────────────────────────

pub use client::ApiClient;
pub use common::{Address, EntityRef, Name};
pub use kind::{MutationKind, ResourceKind};
pub use order::{Fill, FillState, Order, OrderState};
pub use patient::{Patient, PatientSummary, SexType};
pub use prescription::{Prescription, PrescriptionState};
pub use principal::{Organization, Principal};
pub use webhook::WebhookConfig;
