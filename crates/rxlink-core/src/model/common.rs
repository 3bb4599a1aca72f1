// ── Shared building blocks ──

use serde::{Deserialize, Deserializer, Serialize};

/// Postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "US".into()
}

/// Person name as returned by the API (`full` is server-formatted).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub last: String,
    #[serde(default)]
    pub middle: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub full: String,
}

impl Name {
    /// `full` when the server provided one, else `first last`.
    pub fn display(&self) -> String {
        if self.full.is_empty() {
            format!("{} {}", self.first, self.last).trim().to_owned()
        } else {
            self.full.clone()
        }
    }
}

/// Lightweight reference to another entity embedded in a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Deserialize `[String | null] | null` into a plain list.
pub(crate) fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default().into_iter().flatten().collect())
}
