// ── Session controller ──
//
// Owns the session slot. Every public operation catches failures and
// records them in `error`; only `get_token`, `login` and `logout` also
// hand the failure back to the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use rxlink_api::{IdentityProvider, LogoutOptions};

use super::state::{SessionEvent, SessionState, transition};
use super::token::AccessTokenProvider;
use crate::error::{CoreError, ErrorInfo};
use crate::model::Principal;
use crate::store::cell::SlotCell;
use crate::stream::SlotStream;

static CODE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]code=[^&]+").expect("Invalid code param regex"));
static STATE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]state=[^&]+").expect("Invalid state param regex"));
static ERROR_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]error=[^&]+").expect("Invalid error param regex"));

/// Whether a query string (`?a=b&...`) looks like a redirect callback:
/// `code` or `error`, plus `state`.
pub fn has_auth_params(search: &str) -> bool {
    (CODE_PARAM.is_match(search) || ERROR_PARAM.is_match(search)) && STATE_PARAM.is_match(search)
}

fn search_of(location: &Url) -> String {
    location.query().map(|q| format!("?{q}")).unwrap_or_default()
}

/// Strips redirect parameters from the visible location after a
/// successful handshake.
pub trait RedirectSink: Send + Sync {
    fn replace_current_location(&self, path: &str);
}

/// The authentication state machine.
pub struct SessionController {
    identity: Arc<dyn IdentityProvider>,
    tokens: AccessTokenProvider,
    redirect: Arc<dyn RedirectSink>,
    state: SlotCell<SessionState>,
    initialized: AtomicBool,
}

impl SessionController {
    pub fn new(tokens: AccessTokenProvider, redirect: Arc<dyn RedirectSink>) -> Self {
        Self {
            identity: Arc::clone(tokens.identity()),
            tokens,
            redirect,
            state: SlotCell::new(SessionState::initializing()),
            initialized: AtomicBool::new(false),
        }
    }

    // ── Snapshot access ──────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    pub fn subscribe(&self) -> SlotStream<SessionState> {
        SlotStream::new(self.state.subscribe())
    }

    /// Number of state notifications so far.
    pub fn version(&self) -> u64 {
        self.state.version()
    }

    pub fn tokens(&self) -> &AccessTokenProvider {
        &self.tokens
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Resolve the initial session for `location`. Runs once; later calls
    /// return immediately.
    pub async fn initialize(&self, location: &Url) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("session already initialized");
            return;
        }

        if has_auth_params(&search_of(location)) {
            match self
                .identity
                .handle_redirect_callback(Some(location.as_str()))
                .await
            {
                Ok(result) => {
                    let target = return_to(result.app_state.as_ref()).unwrap_or(location.path());
                    self.redirect.replace_current_location(target);
                }
                Err(e) => {
                    warn!(error = %e, "redirect handshake failed");
                    self.fail(e);
                }
            }
        }

        if let Err(e) = self.identity.check_session().await {
            self.fail(e);
            return;
        }

        match self.identity.user().await {
            Ok(user) => {
                let principal = user.map(Principal::from);
                info!(
                    authenticated = principal.is_some(),
                    "session initialized"
                );
                self.dispatch(SessionEvent::Initialised(principal));
            }
            Err(e) => self.fail(e),
        }
    }

    /// Complete a redirect handshake after mount. Failures land in
    /// `error`; the principal is re-read either way.
    pub async fn handle_redirect(&self, url: Option<&str>) {
        if let Err(e) = self.identity.handle_redirect_callback(url).await {
            warn!(error = %e, "redirect handshake failed");
            self.fail(e);
        }
        match self.identity.user().await {
            Ok(user) => self.dispatch(SessionEvent::RedirectComplete(user.map(Principal::from))),
            Err(e) => self.fail(e),
        }
    }

    /// Navigation hook: runs [`handle_redirect`](Self::handle_redirect)
    /// when `location` carries callback parameters. Returns whether it did.
    pub async fn observe_location(&self, location: &Url) -> bool {
        if !has_auth_params(&search_of(location)) {
            return false;
        }
        self.handle_redirect(Some(location.as_str())).await;
        true
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Start redirect-based login. Local state is left alone.
    pub async fn login(
        &self,
        organization: Option<String>,
        invitation: Option<String>,
        app_state: Option<Value>,
    ) -> Result<(), CoreError> {
        let options = self.tokens.login_options(organization, invitation, app_state);
        self.identity.login_with_redirect(options).await?;
        Ok(())
    }

    /// Log out at the provider. Local state is left alone.
    pub async fn logout(&self, return_to: Option<String>) -> Result<(), CoreError> {
        self.identity.logout(LogoutOptions { return_to }).await?;
        Ok(())
    }

    /// A fresh credential. The principal is re-read afterwards and only
    /// replaced when its version marker changed.
    pub async fn get_token(&self, audience: Option<&str>) -> Result<SecretString, CoreError> {
        let token = match self.tokens.access_token(audience).await {
            Ok(token) => token,
            Err(e) => {
                let err = CoreError::from(e);
                self.dispatch(SessionEvent::Failed(ErrorInfo::from(&err)));
                return Err(err);
            }
        };

        match self.identity.user().await {
            Ok(user) => self.dispatch(SessionEvent::TokenRefreshed(user.map(Principal::from))),
            Err(e) => self.fail(e),
        }
        Ok(token)
    }

    pub fn clear_error(&self) {
        self.dispatch(SessionEvent::ErrorCleared);
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn fail(&self, err: rxlink_api::Error) {
        self.dispatch(SessionEvent::Failed(ErrorInfo::from(err)));
    }

    fn dispatch(&self, event: SessionEvent) {
        let changed = self.state.update_if(|state| match transition(state, event) {
            Some(next) => {
                *state = next;
                true
            }
            None => false,
        });
        debug!(changed, "session event");
    }
}

fn return_to(app_state: Option<&Value>) -> Option<&str> {
    app_state?.get("returnTo")?.as_str()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::session::SessionPhase;
    use crate::test_support::{FakeIdentity, RecordingRedirect, user};

    fn controller(identity: &Arc<FakeIdentity>) -> (SessionController, Arc<RecordingRedirect>) {
        let redirect = Arc::new(RecordingRedirect::default());
        let tokens = AccessTokenProvider::new(identity.clone(), Some("https://api".into()), None);
        (SessionController::new(tokens, redirect.clone()), redirect)
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    // ── Callback detection ──

    #[test]
    fn auth_params_detection() {
        assert!(has_auth_params("?code=abc&state=xyz"));
        assert!(has_auth_params("?error=access_denied&state=xyz"));
        assert!(has_auth_params("?foo=1&state=xyz&code=abc"));
        assert!(!has_auth_params("?code=abc"));
        assert!(!has_auth_params("?state=xyz"));
        assert!(!has_auth_params("?code=&state=xyz"));
        assert!(!has_auth_params(""));
    }

    // ── Initialization ──

    #[tokio::test]
    async fn no_params_no_session() {
        let identity = FakeIdentity::new();
        let (session, redirect) = controller(&identity);

        session.initialize(&url("http://localhost:3000/")).await;

        let state = session.state();
        assert!(!state.is_authenticated());
        assert!(!state.is_loading());
        assert!(state.principal().is_none());
        assert!(state.error.is_none());
        assert_eq!(identity.redirect_calls.load(Ordering::SeqCst), 0);
        assert!(redirect.paths().is_empty());
    }

    #[tokio::test]
    async fn restored_session_authenticates() {
        let identity = FakeIdentity::signed_in(user("auth0|1", "v1"));
        let (session, _) = controller(&identity);

        session.initialize(&url("http://localhost:3000/")).await;

        let state = session.state();
        assert!(state.is_authenticated());
        assert_eq!(state.principal().unwrap().id, "auth0|1");
    }

    #[tokio::test]
    async fn successful_handshake_cleans_location() {
        let identity = FakeIdentity::new();
        identity.on_redirect(user("auth0|1", "v1"), Some(json!({ "returnTo": "/orders" })));
        let (session, redirect) = controller(&identity);

        session
            .initialize(&url("http://localhost:3000/callback?code=abc&state=xyz"))
            .await;

        assert!(session.state().is_authenticated());
        assert_eq!(redirect.paths(), ["/orders"]);
    }

    #[tokio::test]
    async fn handshake_without_return_to_uses_path() {
        let identity = FakeIdentity::new();
        identity.on_redirect(user("auth0|1", "v1"), None);
        let (session, redirect) = controller(&identity);

        session
            .initialize(&url("http://localhost:3000/callback?code=abc&state=xyz"))
            .await;

        assert_eq!(redirect.paths(), ["/callback"]);
    }

    #[tokio::test]
    async fn failed_handshake_is_recorded_and_init_continues() {
        let identity = FakeIdentity::new();
        identity.fail_redirect("access_denied", "User cancelled");
        let (session, redirect) = controller(&identity);

        session
            .initialize(&url("http://localhost:3000/?error=access_denied&state=xyz"))
            .await;

        let state = session.state();
        assert!(!state.is_loading());
        assert!(!state.is_authenticated());
        assert_eq!(state.error().unwrap().code.as_deref(), Some("access_denied"));
        assert_eq!(identity.check_session_calls.load(Ordering::SeqCst), 1);
        assert!(redirect.paths().is_empty());
    }

    #[tokio::test]
    async fn failed_handshake_keeps_restored_session() {
        let identity = FakeIdentity::signed_in(user("auth0|1", "v1"));
        identity.fail_redirect("invalid_request", "stale callback");
        let (session, _) = controller(&identity);

        session
            .initialize(&url("http://localhost:3000/?code=abc&state=old"))
            .await;

        let state = session.state();
        assert!(state.is_authenticated());
        assert_eq!(state.error().unwrap().message, "Authentication failed: stale callback");
    }

    #[tokio::test]
    async fn check_session_failure_ends_loading() {
        let identity = FakeIdentity::new();
        identity.fail_check_session("server_error", "tenant down");
        let (session, _) = controller(&identity);

        session.initialize(&url("http://localhost:3000/")).await;

        let state = session.state();
        assert_eq!(state.phase, SessionPhase::Unauthenticated);
        assert!(state.error.is_some());
        assert_eq!(identity.user_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn initialize_runs_once() {
        let identity = FakeIdentity::new();
        let (session, _) = controller(&identity);
        let location = url("http://localhost:3000/");

        session.initialize(&location).await;
        session.initialize(&location).await;
        assert_eq!(identity.check_session_calls.load(Ordering::SeqCst), 1);
    }

    // ── Tokens ──

    #[tokio::test]
    async fn unchanged_principal_does_not_notify() {
        let identity = FakeIdentity::signed_in(user("auth0|1", "v1"));
        let (session, _) = controller(&identity);
        session.initialize(&url("http://localhost:3000/")).await;
        let before = session.version();

        session.get_token(None).await.unwrap();
        session.get_token(None).await.unwrap();
        assert_eq!(session.version(), before);

        identity.set_user(Some(user("auth0|1", "v2")));
        session.get_token(None).await.unwrap();
        assert_eq!(session.version(), before + 1);
        assert_eq!(session.state().principal().unwrap().version(), Some("v2"));
    }

    #[tokio::test]
    async fn token_failure_is_recorded_and_returned() {
        let identity = FakeIdentity::new();
        let (session, _) = controller(&identity);
        session.initialize(&url("http://localhost:3000/")).await;

        let err = session.get_token(None).await.unwrap_err();
        assert!(err.is_login_required());
        assert_eq!(
            session.state().error().unwrap().code.as_deref(),
            Some("login_required")
        );

        session.clear_error();
        assert!(session.state().error.is_none());
        assert!(!session.state().is_loading());
    }

    // ── Redirects after mount ──

    #[tokio::test]
    async fn handle_redirect_failure_still_reads_principal() {
        let identity = FakeIdentity::signed_in(user("auth0|1", "v1"));
        let (session, _) = controller(&identity);
        session.initialize(&url("http://localhost:3000/")).await;
        identity.fail_redirect("invalid_state", "Invalid state");
        let user_calls = identity.user_calls.load(Ordering::SeqCst);

        session.handle_redirect(Some("http://localhost:3000/?code=a&state=b")).await;

        assert_eq!(identity.user_calls.load(Ordering::SeqCst), user_calls + 1);
        assert!(session.state().error.is_some());
        assert!(session.state().is_authenticated());
    }

    #[tokio::test]
    async fn observe_location_ignores_plain_navigation() {
        let identity = FakeIdentity::new();
        identity.on_redirect(user("auth0|2", "v1"), None);
        let (session, _) = controller(&identity);
        session.initialize(&url("http://localhost:3000/")).await;

        assert!(!session.observe_location(&url("http://localhost:3000/orders")).await);
        assert!(
            session
                .observe_location(&url("http://localhost:3000/cb?code=a&state=b"))
                .await
        );
        assert_eq!(session.state().principal().unwrap().id, "auth0|2");
    }

    #[tokio::test]
    async fn login_and_logout_delegate_without_state_change() {
        let identity = FakeIdentity::new();
        let (session, _) = controller(&identity);
        session.initialize(&url("http://localhost:3000/")).await;
        let before = session.version();

        session
            .login(Some("org_1".into()), None, Some(json!({ "returnTo": "/x" })))
            .await
            .unwrap();
        session.logout(Some("http://localhost:3000".into())).await.unwrap();

        assert_eq!(session.version(), before);
        assert_eq!(identity.logins.lock().unwrap()[0].organization.as_deref(), Some("org_1"));
        assert_eq!(
            identity.logouts.lock().unwrap()[0].return_to.as_deref(),
            Some("http://localhost:3000")
        );
    }
}
