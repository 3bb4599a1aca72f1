// Authorization-code + PKCE client for public OIDC clients.
//
// Tokens and the userinfo cache live in memory only. Callers that want a
// session to survive the process persist `refresh_token()` themselves and
// seed it back with `with_refresh_token()`.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};
use url::Url;

use super::endpoints::OidcEndpoints;
use super::pkce::{PkcePair, random_urlsafe};
use super::token::{self, CodeExchange, TokenSet};
use super::{
    IdentityProvider, LoginOptions, LogoutOptions, Navigator, RedirectResult, UserInfo,
};
use crate::error::Error;
use crate::transport::TransportConfig;

const DEFAULT_SCOPE: &str = "openid profile email offline_access";

/// Cached access tokens are reused until they are this close to expiry.
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// Abandoned logins are dropped after this long.
const PENDING_LOGIN_TTL_SECS: i64 = 600;

/// At most this many logins wait for a callback; the oldest goes first.
const MAX_PENDING_LOGINS: usize = 16;

/// Static client registration.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    /// Tenant domain, e.g. `https://auth.example.org`.
    pub domain: Url,
    pub client_id: String,
    pub redirect_uri: Url,
    /// Audience requested when the caller does not name one.
    pub audience: Option<String>,
    pub scope: String,
}

impl OidcConfig {
    pub fn new(domain: Url, client_id: impl Into<String>, redirect_uri: Url) -> Self {
        Self {
            domain,
            client_id: client_id.into(),
            redirect_uri,
            audience: None,
            scope: DEFAULT_SCOPE.to_owned(),
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

/// A login started by `login_with_redirect` and not yet completed.
#[derive(Debug)]
struct PendingLogin {
    code_verifier: String,
    redirect_uri: String,
    app_state: Option<serde_json::Value>,
    started_at: DateTime<Utc>,
}

impl PendingLogin {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.started_at >= Duration::seconds(PENDING_LOGIN_TTL_SECS)
    }
}

pub struct OidcProvider {
    http: reqwest::Client,
    config: OidcConfig,
    endpoints: OidcEndpoints,
    navigator: Arc<dyn Navigator>,
    pending: DashMap<String, PendingLogin>,
    tokens: ArcSwapOption<TokenSet>,
    refresh: ArcSwapOption<SecretString>,
    user: ArcSwapOption<UserInfo>,
}

impl std::fmt::Debug for OidcProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcProvider")
            .field("client_id", &self.config.client_id)
            .field("domain", &self.config.domain.as_str())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl OidcProvider {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build with the conventional endpoint layout under `config.domain`.
    pub fn new(
        config: OidcConfig,
        transport: &TransportConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, Error> {
        let endpoints = OidcEndpoints::from_domain(&config.domain)?;
        Self::with_endpoints(config, endpoints, transport, navigator)
    }

    /// Build with endpoints read from the discovery document.
    pub async fn discover(
        config: OidcConfig,
        transport: &TransportConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let endpoints = OidcEndpoints::discover(&http, &config.domain).await?;
        Ok(Self::from_parts(http, config, endpoints, navigator))
    }

    pub fn with_endpoints(
        config: OidcConfig,
        endpoints: OidcEndpoints,
        transport: &TransportConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::from_parts(http, config, endpoints, navigator))
    }

    fn from_parts(
        http: reqwest::Client,
        config: OidcConfig,
        endpoints: OidcEndpoints,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            http,
            config,
            endpoints,
            navigator,
            pending: DashMap::new(),
            tokens: ArcSwapOption::empty(),
            refresh: ArcSwapOption::empty(),
            user: ArcSwapOption::empty(),
        }
    }

    /// Seed a refresh token (e.g. one persisted by a previous run).
    /// `check_session` turns it into a session.
    pub fn with_refresh_token(self, refresh_token: SecretString) -> Self {
        self.refresh.store(Some(Arc::new(refresh_token)));
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The refresh token currently held, for persistence.
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.refresh.load_full().map(|rt| (*rt).clone())
    }

    pub fn endpoints(&self) -> &OidcEndpoints {
        &self.endpoints
    }

    pub fn config(&self) -> &OidcConfig {
        &self.config
    }

    // ── Authorize URL ────────────────────────────────────────────────

    /// Record a pending login transaction and return the authorize URL
    /// for it. `login_with_redirect` navigates to this URL.
    pub fn authorize_url(&self, options: LoginOptions) -> Url {
        let pkce = PkcePair::generate();
        let state = random_urlsafe(32);
        let nonce = random_urlsafe(32);

        let mut url = self.endpoints.authorization.clone();
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("response_type", "code")
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", self.config.redirect_uri.as_str())
                .append_pair("scope", &self.config.scope);
            if let Some(aud) = &self.config.audience {
                q.append_pair("audience", aud);
            }
            q.append_pair("state", &state)
                .append_pair("nonce", &nonce)
                .append_pair("code_challenge", &pkce.code_challenge)
                .append_pair("code_challenge_method", "S256");
            if let Some(org) = &options.organization {
                q.append_pair("organization", org);
            }
            if let Some(invitation) = &options.invitation {
                q.append_pair("invitation", invitation);
            }
        }

        self.record_pending(
            state,
            PendingLogin {
                code_verifier: pkce.code_verifier,
                redirect_uri: self.config.redirect_uri.to_string(),
                app_state: options.app_state,
                started_at: Utc::now(),
            },
        );
        url
    }

    fn record_pending(&self, state: String, login: PendingLogin) {
        let now = login.started_at;
        self.pending.retain(|_, p| !p.is_expired_at(now));

        while self.pending.len() >= MAX_PENDING_LOGINS {
            let oldest = self
                .pending
                .iter()
                .min_by_key(|entry| entry.started_at)
                .map(|entry| entry.key().clone());
            let Some(oldest) = oldest else { break };
            debug!("dropping oldest pending login");
            self.pending.remove(&oldest);
        }

        self.pending.insert(state, login);
    }

    // ── Token cache ──────────────────────────────────────────────────

    fn cached_token_for(&self, audience: Option<&str>) -> Option<SecretString> {
        let set = self.tokens.load_full()?;
        let leeway = Duration::seconds(EXPIRY_LEEWAY_SECS);
        (set.audience.as_deref() == audience && set.is_fresh_at(Utc::now(), leeway))
            .then(|| set.access_token.clone())
    }

    fn store_tokens(&self, set: TokenSet) {
        if let Some(rt) = &set.refresh_token {
            self.refresh.store(Some(Arc::new(rt.clone())));
        }
        self.tokens.store(Some(Arc::new(set)));
        self.user.store(None);
    }

    fn clear_session(&self) {
        self.tokens.store(None);
        self.refresh.store(None);
        self.user.store(None);
    }

    async fn refresh_for(&self, audience: Option<&str>) -> Result<SecretString, Error> {
        let refresh_token = self.refresh.load_full().ok_or(Error::LoginRequired)?;
        let set = token::refresh_access_token(
            &self.http,
            &self.endpoints.token,
            &self.config.client_id,
            &refresh_token,
            audience,
        )
        .await?;
        let access = set.access_token.clone();

        if audience == self.config.audience.as_deref() {
            self.store_tokens(set);
        } else if let Some(rotated) = set.refresh_token {
            // Foreign-audience tokens are handed out, not cached.
            self.refresh.store(Some(Arc::new(rotated)));
        }
        Ok(access)
    }

    async fn fetch_userinfo(&self, access_token: &SecretString) -> Result<UserInfo, Error> {
        let url = self.endpoints.userinfo.clone();
        debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .bearer_auth(access_token.expose_secret())
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(token::parse_oauth_error(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("invalid userinfo response: {e}"),
            body,
        })
    }
}

#[async_trait]
impl IdentityProvider for OidcProvider {
    async fn login_with_redirect(&self, options: LoginOptions) -> Result<(), Error> {
        let url = self.authorize_url(options);
        info!(client_id = %self.config.client_id, "redirecting to authorization endpoint");
        self.navigator.assign(&url);
        Ok(())
    }

    async fn logout(&self, options: LogoutOptions) -> Result<(), Error> {
        self.clear_session();
        self.pending.clear();

        let mut url = self.endpoints.end_session.clone();
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("client_id", &self.config.client_id);
            if let Some(return_to) = &options.return_to {
                q.append_pair("returnTo", return_to);
            }
        }
        info!("session cleared, redirecting to end-session endpoint");
        self.navigator.assign(&url);
        Ok(())
    }

    async fn access_token(&self, audience: Option<&str>) -> Result<SecretString, Error> {
        let audience = audience.or(self.config.audience.as_deref());
        if let Some(token) = self.cached_token_for(audience) {
            return Ok(token);
        }
        self.refresh_for(audience).await
    }

    async fn check_session(&self) -> Result<(), Error> {
        let audience = self.config.audience.as_deref();
        if self.cached_token_for(audience).is_some() || self.refresh.load().is_none() {
            return Ok(());
        }

        match self.refresh_for(audience).await {
            Ok(_) => {
                debug!("session restored from refresh token");
                Ok(())
            }
            Err(e) if e.is_login_required() => {
                debug!(error = %e, "stored session is no longer valid");
                self.clear_session();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn handle_redirect_callback(&self, url: Option<&str>) -> Result<RedirectResult, Error> {
        let raw = url.ok_or_else(|| Error::InvalidCallback("no callback URL given".into()))?;
        let url = Url::parse(raw)?;
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

        if let Some(error) = params.get("error") {
            if let Some(state) = params.get("state") {
                self.pending.remove(state);
            }
            warn!(error = %error, "authorization server returned an error");
            return Err(Error::OAuth {
                error: error.clone(),
                description: params.get("error_description").cloned().unwrap_or_default(),
            });
        }

        let state = params.get("state").ok_or(Error::InvalidState)?;
        let (_, pending) = self.pending.remove(state).ok_or(Error::InvalidState)?;
        if pending.is_expired_at(Utc::now()) {
            debug!("pending login expired");
            return Err(Error::InvalidState);
        }
        let code = params
            .get("code")
            .ok_or_else(|| Error::InvalidCallback("missing `code` parameter".into()))?;

        let set = token::exchange_authorization_code(
            &self.http,
            &self.endpoints.token,
            &CodeExchange {
                client_id: &self.config.client_id,
                code,
                redirect_uri: &pending.redirect_uri,
                code_verifier: &pending.code_verifier,
            },
            self.config.audience.as_deref(),
        )
        .await?;
        self.store_tokens(set);
        info!("authorization code exchanged");

        Ok(RedirectResult {
            app_state: pending.app_state,
        })
    }

    async fn user(&self) -> Result<Option<UserInfo>, Error> {
        if self.tokens.load().is_none() && self.refresh.load().is_none() {
            return Ok(None);
        }
        if let Some(user) = self.user.load_full() {
            return Ok(Some((*user).clone()));
        }

        let access = match self.access_token(None).await {
            Ok(token) => token,
            Err(e) if e.is_login_required() => return Ok(None),
            Err(e) => return Err(e),
        };
        let info = self.fetch_userinfo(&access).await?;
        self.user.store(Some(Arc::new(info.clone())));
        Ok(Some(info))
    }
}
