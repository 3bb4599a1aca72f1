// ── Order domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{Address, EntityRef};
use super::patient::PatientSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum OrderState {
    New,
    Processing,
    Ready,
    Completed,
    Canceled,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum FillState {
    New,
    Processing,
    Sent,
    Received,
    Error,
}

/// One dispensed item of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    pub id: String,
    pub state: FillState,
    #[serde(default)]
    pub requested_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub filled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub treatment: Option<EntityRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub external_id: Option<String>,
    pub state: OrderState,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub patient: Option<PatientSummary>,
    #[serde(default)]
    pub pharmacy: Option<EntityRef>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub fills: Vec<Fill>,
}
