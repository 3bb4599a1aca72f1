// ── Core error types ──
//
// User-facing errors from rxlink-core. Consumers never see HTTP status
// handling or JSON parse failures directly; the `From<rxlink_api::Error>`
// impl translates transport-layer errors into domain variants.
//
// `ErrorInfo` is the cloneable record that reactive slots carry.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Login required")]
    LoginRequired,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        message: String,
        code: Option<String>,
    },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    Graphql {
        message: String,
        code: Option<String>,
        path: Option<String>,
    },

    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error("Unexpected response shape: {message}")]
    Decode { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Machine-readable code, when one is known.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::LoginRequired => Some("login_required"),
            Self::AuthenticationFailed { code, .. } | Self::Graphql { code, .. } => code.as_deref(),
            Self::Timeout => Some("timeout"),
            _ => None,
        }
    }

    /// `true` when the user has to log in (again) to proceed.
    pub fn is_login_required(&self) -> bool {
        matches!(self, Self::LoginRequired)
            || matches!(self.code(), Some("login_required" | "invalid_grant"))
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<rxlink_api::Error> for CoreError {
    fn from(err: rxlink_api::Error) -> Self {
        use rxlink_api::Error as Api;

        match err {
            Api::LoginRequired => Self::LoginRequired,
            Api::ConsentRequired => Self::AuthenticationFailed {
                message: "Consent required for the requested audience".into(),
                code: Some("consent_required".into()),
            },
            Api::OAuth { error, description } => Self::AuthenticationFailed {
                message: if description.is_empty() {
                    error.clone()
                } else {
                    description
                },
                code: Some(error),
            },
            Api::InvalidState => Self::AuthenticationFailed {
                message: "Invalid state".into(),
                code: Some("invalid_state".into()),
            },
            Api::InvalidCallback(message) => Self::AuthenticationFailed {
                message,
                code: Some("invalid_callback".into()),
            },
            Api::Authentication { message } => Self::AuthenticationFailed {
                message,
                code: None,
            },
            Api::Transport(ref e) => {
                if e.is_timeout() {
                    Self::Timeout
                } else if e.is_connect() {
                    Self::ConnectionFailed {
                        url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    Self::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            Api::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(reason) => Self::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {reason}"),
            },
            Api::Http { status, message } => Self::Api {
                message,
                status: Some(status),
            },
            Api::Graphql {
                message,
                code,
                path,
                count: _,
            } => Self::Graphql {
                message,
                code,
                path,
            },
            Api::Deserialization { message, body: _ } => Self::Decode { message },
        }
    }
}

// ── ErrorInfo ────────────────────────────────────────────────────────

/// The error record stored in session, resource and mutation slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Dotted GraphQL response path, for field-level errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            path: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}
