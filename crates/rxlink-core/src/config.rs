// ── Runtime provider configuration ──
//
// Describes which identity tenant and which API the provider talks to.
// Built by the caller and handed in; core never reads config files.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use rxlink_api::{OidcConfig, TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Local development only.
    DangerAcceptInvalid,
}

/// Everything needed to wire a [`Provider`](crate::Provider).
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Identity provider tenant, e.g. `https://auth.example.org`.
    pub domain: Url,
    /// Public OAuth client id.
    pub client_id: String,
    /// Where the identity provider sends the browser after login.
    pub redirect_uri: Url,
    /// Organization used for login when the caller names none.
    pub organization: Option<String>,
    /// Token audience. Defaults to the origin of `api_url`.
    pub audience: Option<String>,
    /// GraphQL endpoint.
    pub api_url: Url,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(domain: Url, client_id: impl Into<String>, redirect_uri: Url, api_url: Url) -> Self {
        Self {
            domain,
            client_id: client_id.into(),
            redirect_uri,
            organization: None,
            audience: None,
            api_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// The configured audience, or the origin of the API endpoint.
    pub fn effective_audience(&self) -> String {
        self.audience
            .clone()
            .unwrap_or_else(|| self.api_url.origin().ascii_serialization())
    }

    pub fn transport_config(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }

    pub fn oidc_config(&self) -> OidcConfig {
        OidcConfig::new(
            self.domain.clone(),
            self.client_id.clone(),
            self.redirect_uri.clone(),
        )
        .with_audience(self.effective_audience())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig::new(
            Url::parse("https://auth.example.org").unwrap(),
            "client",
            Url::parse("http://localhost:3000/callback").unwrap(),
            Url::parse("https://api.example.org/graphql").unwrap(),
        )
    }

    #[test]
    fn audience_defaults_to_api_origin() {
        assert_eq!(config().effective_audience(), "https://api.example.org");
    }

    #[test]
    fn explicit_audience_wins() {
        let mut cfg = config();
        cfg.audience = Some("urn:rx".into());
        assert_eq!(cfg.effective_audience(), "urn:rx");
        assert_eq!(cfg.oidc_config().audience.as_deref(), Some("urn:rx"));
    }

    #[test]
    fn transport_mirrors_tls_mode() {
        let mut cfg = config();
        cfg.tls = TlsVerification::DangerAcceptInvalid;
        assert!(matches!(cfg.transport_config().tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(cfg.transport_config().timeout, Duration::from_secs(30));
    }
}
