//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, slot `ErrorInfo` records and config failures into
//! user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use rxlink_config::ConfigError;
use rxlink_core::{CoreError, ErrorInfo};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(rxlink::connection_failed),
        help(
            "Check the domain and api_url of your profile.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(rxlink::timeout),
        help("Increase the timeout with --timeout or in your profile.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not signed in for profile '{profile}'")]
    #[diagnostic(code(rxlink::login_required), help("Run: rxlink login --profile {profile}"))]
    NotLoggedIn { profile: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(rxlink::auth_failed),
        help("Sign in again with: rxlink login")
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(rxlink::not_found),
        help("Run: rxlink {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(rxlink::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(rxlink::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(rxlink::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: rxlink config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No profile configured")]
    #[diagnostic(
        code(rxlink::no_config),
        help(
            "Create one with: rxlink config init\n\
             Or pass --domain, --client-id and --api-url.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(rxlink::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(rxlink::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotLoggedIn { .. } | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { profile } => Self::ProfileNotFound {
                available: available_profiles(),
                name: profile,
            },
            other => Self::Config(Box::new(other)),
        }
    }
}

fn available_profiles() -> String {
    let cfg = rxlink_config::load_config_or_default();
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        if err.is_login_required() {
            return Self::NotLoggedIn {
                profile: "current".into(),
            };
        }
        match err {
            CoreError::AuthenticationFailed { message, .. } => Self::AuthFailed { message },

            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::Timeout => Self::Timeout,

            CoreError::Graphql { message, code, .. } => Self::ApiError {
                code: code.unwrap_or_else(|| "graphql".into()),
                message,
            },

            CoreError::Api { message, status } => Self::ApiError {
                code: status.map_or_else(|| "http".into(), |s| s.to_string()),
                message,
            },

            CoreError::Decode { message } => Self::ApiError {
                code: "decode".into(),
                message,
            },

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => Self::ApiError {
                code: "internal".into(),
                message,
            },

            CoreError::LoginRequired => Self::NotLoggedIn {
                profile: "current".into(),
            },
        }
    }
}

/// Errors recorded in resource, mutation and session slots.
impl From<ErrorInfo> for CliError {
    fn from(err: ErrorInfo) -> Self {
        match err.code.as_deref() {
            Some("login_required" | "invalid_grant") => Self::NotLoggedIn {
                profile: "current".into(),
            },
            Some("timeout") => Self::Timeout,
            Some(code) => Self::ApiError {
                code: code.to_owned(),
                message: err.message,
            },
            None => Self::ApiError {
                code: "error".into(),
                message: err.message,
            },
        }
    }
}
