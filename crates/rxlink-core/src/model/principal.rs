// ── Principal domain type ──

use serde::{Deserialize, Serialize};

/// Organization the principal is logged in as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: Option<String>,
}

/// The authenticated identity.
///
/// Replaced wholesale whenever a new one is obtained; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Identity provider subject.
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
    /// Provider-side profile timestamp, used as the version marker.
    pub updated_at: Option<String>,
    pub organization: Option<Organization>,
}

impl Principal {
    /// The version marker compared to decide whether a re-fetched
    /// principal actually changed.
    pub fn version(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    /// Best human-readable label: name, then email, then subject.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}
