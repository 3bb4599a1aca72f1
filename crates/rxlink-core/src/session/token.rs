// ── Access token provider ──

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::debug;

use rxlink_api::{IdentityProvider, LoginOptions, TokenSource};

/// Identity provider plus the configured default audience and
/// organization. Holds no token state of its own.
#[derive(Clone)]
pub struct AccessTokenProvider {
    identity: Arc<dyn IdentityProvider>,
    audience: Option<String>,
    organization: Option<String>,
}

impl AccessTokenProvider {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        audience: Option<String>,
        organization: Option<String>,
    ) -> Self {
        Self {
            identity,
            audience,
            organization,
        }
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub fn default_audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    /// A credential for `audience`, or for the default audience.
    pub async fn access_token(
        &self,
        audience: Option<&str>,
    ) -> Result<SecretString, rxlink_api::Error> {
        let audience = audience.or(self.audience.as_deref());
        self.identity.access_token(audience).await
    }

    /// Login options with the default organization filled in.
    pub fn login_options(
        &self,
        organization: Option<String>,
        invitation: Option<String>,
        app_state: Option<serde_json::Value>,
    ) -> LoginOptions {
        LoginOptions {
            organization: organization.or_else(|| self.organization.clone()),
            invitation,
            app_state,
        }
    }
}

#[async_trait]
impl TokenSource for AccessTokenProvider {
    async fn token(&self) -> Result<Option<SecretString>, rxlink_api::Error> {
        match self.access_token(None).await {
            Ok(token) => Ok(Some(token)),
            Err(e) if e.is_login_required() => {
                debug!("no session, sending request without credentials");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
