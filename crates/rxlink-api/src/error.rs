use thiserror::Error;

/// Top-level error type for the `rxlink-api` crate.
///
/// Covers every failure mode of the two transport surfaces:
/// the identity provider (OAuth2/OIDC) and the GraphQL API.
/// `rxlink-core` maps these into user-facing errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// No usable session: the user has to go through the login redirect.
    #[error("Login required")]
    LoginRequired,

    /// The user has not consented to the requested audience/scopes.
    #[error("Consent required")]
    ConsentRequired,

    /// Error response from the authorization server, either on the
    /// redirect callback (`?error=...`) or from the token endpoint.
    #[error("OAuth error `{error}`: {description}")]
    OAuth { error: String, description: String },

    /// Callback `state` does not match any pending login transaction.
    #[error("Invalid state: no pending login transaction matches the callback")]
    InvalidState,

    /// Callback URL is missing a parameter required to complete the handshake.
    #[error("Invalid redirect callback: {0}")]
    InvalidCallback(String),

    /// Generic authentication failure (malformed token response, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status without a structured error body.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // ── GraphQL ─────────────────────────────────────────────────────
    /// One or more GraphQL errors returned by the API. Only the first
    /// error is kept; `count` tells how many were returned.
    #[error("GraphQL error: {message}")]
    Graphql {
        message: String,
        code: Option<String>,
        /// Dotted response path of the failing field, e.g. `patients.0.name`.
        path: Option<String>,
        count: usize,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the failure means "there is no session" rather
    /// than "something broke". Session checks treat these as benign.
    pub fn is_login_required(&self) -> bool {
        match self {
            Self::LoginRequired => true,
            Self::OAuth { error, .. } => matches!(
                error.as_str(),
                "login_required" | "invalid_grant" | "interaction_required"
            ),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Machine-readable error code, if available.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::OAuth { error, .. } => Some(error),
            Self::Graphql { code, .. } => code.as_deref(),
            Self::LoginRequired => Some("login_required"),
            Self::ConsentRequired => Some("consent_required"),
            _ => None,
        }
    }
}
