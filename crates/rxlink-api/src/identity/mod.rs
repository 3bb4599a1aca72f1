// ── Identity provider abstraction ──
//
// The OAuth2/OIDC collaborator the session layer talks to. The trait is
// object-safe so the core can hold an `Arc<dyn IdentityProvider>` and tests
// can swap in a fake.

mod endpoints;
mod oidc;
mod pkce;
mod token;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;

pub use endpoints::OidcEndpoints;
pub use oidc::{OidcConfig, OidcProvider};
pub use pkce::{PkcePair, code_challenge_s256};
pub use token::TokenSet;

/// Options for the redirect-based login entry point.
///
/// Only the fields that are set end up on the authorize URL.
#[derive(Debug, Clone, Default)]
pub struct LoginOptions {
    /// Organization to log in as.
    pub organization: Option<String>,
    /// Invitation ticket from an organization invite link.
    pub invitation: Option<String>,
    /// Opaque state round-tripped through the redirect and returned by
    /// [`IdentityProvider::handle_redirect_callback`].
    pub app_state: Option<serde_json::Value>,
}

/// Options for logout.
#[derive(Debug, Clone, Default)]
pub struct LogoutOptions {
    /// Where the identity provider should send the browser afterwards.
    pub return_to: Option<String>,
}

/// Outcome of a completed redirect handshake.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedirectResult {
    pub app_state: Option<serde_json::Value>,
}

/// Standard OIDC userinfo claims, plus whatever custom claims the
/// provider adds (namespaced organization claims and the like).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Browser navigation: the side effect of redirect-based login/logout.
pub trait Navigator: Send + Sync {
    /// Navigate away to `url` (the equivalent of `location.assign`).
    fn assign(&self, url: &Url);
}

/// An OAuth2/OIDC identity provider client.
///
/// Every operation may fail with a provider-specific [`Error`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Start the redirect-based login. Navigates away on success.
    async fn login_with_redirect(&self, options: LoginOptions) -> Result<(), Error>;

    /// Forget the local session and navigate to the provider's logout page.
    async fn logout(&self, options: LogoutOptions) -> Result<(), Error>;

    /// A credential for `audience` (the provider default when `None`).
    async fn access_token(&self, audience: Option<&str>) -> Result<SecretString, Error>;

    /// Restore a session silently, if one can be restored.
    async fn check_session(&self) -> Result<(), Error>;

    /// Complete the authorization-code handshake from the callback URL.
    async fn handle_redirect_callback(&self, url: Option<&str>) -> Result<RedirectResult, Error>;

    /// The current user's claims, `None` when there is no session.
    async fn user(&self) -> Result<Option<UserInfo>, Error>;
}
