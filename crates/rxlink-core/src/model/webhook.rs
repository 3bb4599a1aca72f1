// ── Webhook configuration ──

use serde::{Deserialize, Serialize};

use super::common::nullable_list;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Event types delivered to this hook. Empty means all.
    #[serde(default, deserialize_with = "nullable_list")]
    pub filters: Vec<String>,
}
