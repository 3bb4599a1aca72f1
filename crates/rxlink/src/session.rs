//! Terminal session plumbing: builds a `Provider` from the resolved profile,
//! restores the keyring session and writes rotated refresh tokens back.

use std::sync::{Arc, Mutex};

use rxlink_api::{Navigator, OidcProvider};
use rxlink_core::{CoreError, Provider, ProviderConfig, RedirectSink};
use tracing::{debug, warn};
use url::Url;

use crate::cli::GlobalOpts;
use crate::config::{self, SessionStore};
use crate::error::CliError;

// ── Navigation stand-ins ─────────────────────────────────────────────

/// Records the URLs the identity provider asks to visit; the commands
/// print them for the user to open.
#[derive(Debug, Default)]
pub struct TerminalNavigator {
    visited: Mutex<Vec<Url>>,
}

impl TerminalNavigator {
    pub fn last(&self) -> Option<Url> {
        self.visited
            .lock()
            .expect("navigator lock poisoned")
            .last()
            .cloned()
    }
}

impl Navigator for TerminalNavigator {
    fn assign(&self, url: &Url) {
        debug!(%url, "navigation requested");
        self.visited
            .lock()
            .expect("navigator lock poisoned")
            .push(url.clone());
    }
}

/// There is no address bar to clean up in a terminal.
#[derive(Debug, Default)]
pub struct LogRedirect;

impl RedirectSink for LogRedirect {
    fn replace_current_location(&self, path: &str) {
        debug!(path, "redirect handshake complete");
    }
}

// ── Connection ───────────────────────────────────────────────────────

pub struct Connection {
    pub provider: Provider,
    pub navigator: Arc<TerminalNavigator>,
    pub profile: String,
    store: SessionStore,
}

impl Connection {
    /// Build the provider for the active profile. With `restore`, the
    /// stored refresh token (if any) seeds the OIDC client.
    pub fn open(global: &GlobalOpts, restore: bool) -> Result<Self, CliError> {
        let cfg = config::load_config_or_default();
        let (profile, provider_config) = config::resolve_provider_config(&cfg, global)?;
        let store = SessionStore::default();

        let seeded = if restore {
            store.load(&profile)?
        } else {
            None
        };
        debug!(profile, restored = seeded.is_some(), "opening connection");

        let navigator = Arc::new(TerminalNavigator::default());
        let provider = build_provider(provider_config, Arc::clone(&navigator), seeded)?;

        Ok(Self {
            provider,
            navigator,
            profile,
            store,
        })
    }

    /// Open and restore the stored session; fails when none is usable.
    pub async fn authenticated(global: &GlobalOpts) -> Result<Self, CliError> {
        let conn = Self::open(global, true)?;
        let location = conn.provider.config().redirect_uri.clone();
        conn.provider.initialize(&location).await;

        if let Some(err) = conn.provider.error() {
            return Err(err.into());
        }
        if !conn.provider.is_authenticated() {
            return Err(CliError::NotLoggedIn {
                profile: conn.profile.clone(),
            });
        }
        Ok(conn)
    }

    /// Write the current refresh token to the keyring.
    pub fn persist(&self) -> Result<(), CliError> {
        if let Some(token) = self.provider.refresh_token() {
            self.store.save(&self.profile, &token)?;
        }
        Ok(())
    }

    /// Like [`persist`](Self::persist), but a keyring failure only warns:
    /// the command itself already succeeded.
    pub fn persist_quietly(&self) {
        if let Err(e) = self.persist() {
            warn!(error = %e, profile = %self.profile, "could not store rotated session");
        }
    }

    pub fn forget(&self) -> Result<(), CliError> {
        self.store.clear(&self.profile)?;
        Ok(())
    }
}

fn build_provider(
    config: ProviderConfig,
    navigator: Arc<TerminalNavigator>,
    refresh_token: Option<secrecy::SecretString>,
) -> Result<Provider, CliError> {
    let oidc = OidcProvider::new(config.oidc_config(), &config.transport_config(), navigator)
        .map_err(CoreError::from)?;
    let oidc = match refresh_token {
        Some(token) => oidc.with_refresh_token(token),
        None => oidc,
    };
    Ok(Provider::with_oidc(config, Arc::new(oidc), Arc::new(LogRedirect))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn navigator_keeps_the_latest_url() {
        let nav = TerminalNavigator::default();
        assert!(nav.last().is_none());

        nav.assign(&Url::parse("https://auth.example.org/authorize?a=1").unwrap());
        nav.assign(&Url::parse("https://auth.example.org/v2/logout").unwrap());
        assert_eq!(nav.last().unwrap().path(), "/v2/logout");
    }
}
