// ── Prescription domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::EntityRef;
use super::patient::PatientSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum PrescriptionState {
    Ready,
    Processing,
    Depleted,
    Expired,
    Canceled,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: String,
    #[serde(default)]
    pub external_id: Option<String>,
    pub state: PrescriptionState,
    #[serde(default)]
    pub medication: Option<EntityRef>,
    #[serde(default)]
    pub patient: Option<PatientSummary>,
    #[serde(default)]
    pub prescriber: Option<EntityRef>,
    #[serde(default)]
    pub dispense_quantity: Option<u32>,
    #[serde(default)]
    pub dispense_unit: Option<String>,
    #[serde(default)]
    pub dispense_as_written: Option<bool>,
    #[serde(default)]
    pub days_supply: Option<u32>,
    #[serde(default)]
    pub refills_allowed: Option<u32>,
    #[serde(default)]
    pub refills_remaining: Option<u32>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub effective_date: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub written_at: Option<DateTime<Utc>>,
}
