// ── In-process fakes for unit tests ──

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Value, json};

use rxlink_api::{
    Error, GraphqlError, IdentityProvider, LoginOptions, LogoutOptions, MutationResponse,
    Operation, QueryExecutor, QueryResponse, RedirectResult, UserInfo,
};

use crate::session::RedirectSink;
use crate::store::Diagnostics;

pub(crate) fn patient_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": { "first": "Ada", "last": "Lovelace", "full": "Ada Lovelace" },
        "dateOfBirth": "1815-12-10",
        "sex": "FEMALE",
        "phone": "+15555550100"
    })
}

pub(crate) fn user(sub: &str, updated_at: &str) -> UserInfo {
    UserInfo {
        sub: sub.into(),
        name: Some("Dr. Ada".into()),
        nickname: None,
        email: Some("ada@example.org".into()),
        picture: None,
        updated_at: Some(updated_at.into()),
        org_id: Some("org_1".into()),
        extra: serde_json::Map::new(),
    }
}

fn graphql_error(message: &str) -> Error {
    Error::Graphql {
        message: message.into(),
        code: None,
        path: None,
        count: 1,
    }
}

// ── Query executor ──────────────────────────────────────────────────

#[derive(Clone)]
enum Script {
    Query {
        data: Option<Value>,
        error: Option<String>,
        delay: Duration,
    },
    Mutation {
        data: Option<Value>,
        errors: Vec<String>,
    },
    Unreachable,
}

/// Scripted executor keyed by operation name. A script answers every
/// call until replaced.
#[derive(Default)]
pub(crate) struct FakeExecutor {
    scripts: Mutex<HashMap<&'static str, Script>>,
    calls: Mutex<Vec<(&'static str, Value)>>,
}

impl FakeExecutor {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn set(&self, name: &'static str, script: Script) {
        self.scripts.lock().unwrap().insert(name, script);
    }

    pub(crate) fn respond(&self, name: &'static str, data: Value) {
        self.respond_after(name, data, Duration::ZERO);
    }

    pub(crate) fn respond_after(&self, name: &'static str, data: Value, delay: Duration) {
        self.set(
            name,
            Script::Query {
                data: Some(data),
                error: None,
                delay,
            },
        );
    }

    pub(crate) fn respond_partial(&self, name: &'static str, data: Value, error: &str) {
        self.set(
            name,
            Script::Query {
                data: Some(data),
                error: Some(error.into()),
                delay: Duration::ZERO,
            },
        );
    }

    pub(crate) fn fail(&self, name: &'static str, error: &str) {
        self.set(
            name,
            Script::Query {
                data: None,
                error: Some(error.into()),
                delay: Duration::ZERO,
            },
        );
    }

    pub(crate) fn mutation(&self, name: &'static str, data: Value, errors: &[&str]) {
        self.set(
            name,
            Script::Mutation {
                data: Some(data),
                errors: errors.iter().map(|e| (*e).to_owned()).collect(),
            },
        );
    }

    /// No response at all: `mutate` returns `Err`.
    pub(crate) fn unreachable(&self, name: &'static str) {
        self.set(name, Script::Unreachable);
    }

    /// Variables of every call to `name`, in call order.
    pub(crate) fn calls(&self, name: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn take(&self, operation: &Operation, variables: Value) -> Option<Script> {
        self.calls.lock().unwrap().push((operation.name, variables));
        self.scripts.lock().unwrap().get(operation.name).cloned()
    }
}

#[async_trait]
impl QueryExecutor for FakeExecutor {
    async fn query(&self, operation: &Operation, variables: Value) -> QueryResponse {
        match self.take(operation, variables) {
            Some(Script::Query { data, error, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                QueryResponse {
                    data,
                    error: error.as_deref().map(graphql_error),
                }
            }
            _ => QueryResponse {
                data: None,
                error: Some(Error::Http {
                    status: 503,
                    message: format!("no script for {}", operation.name),
                }),
            },
        }
    }

    async fn mutate(
        &self,
        operation: &Operation,
        variables: Value,
    ) -> Result<MutationResponse, Error> {
        match self.take(operation, variables) {
            Some(Script::Mutation { data, errors }) => Ok(MutationResponse {
                data,
                errors: errors
                    .into_iter()
                    .map(|message| GraphqlError {
                        message,
                        path: None,
                        extensions: None,
                    })
                    .collect(),
            }),
            _ => Err(Error::Http {
                status: 502,
                message: "Bad Gateway".into(),
            }),
        }
    }
}

// ── Identity provider ───────────────────────────────────────────────

/// Scripted identity provider. Failures are `(error, description)` pairs
/// turned into `Error::OAuth` on every call.
#[derive(Default)]
pub(crate) struct FakeIdentity {
    user: Mutex<Option<UserInfo>>,
    /// User that becomes current after a successful redirect handshake.
    redirect_user: Mutex<Option<UserInfo>>,
    redirect_app_state: Mutex<Option<Value>>,
    redirect_failure: Mutex<Option<(String, String)>>,
    check_session_failure: Mutex<Option<(String, String)>>,
    user_failure: Mutex<Option<(String, String)>>,
    pub(crate) logins: Mutex<Vec<LoginOptions>>,
    pub(crate) logouts: Mutex<Vec<LogoutOptions>>,
    pub(crate) audiences: Mutex<Vec<Option<String>>>,
    pub(crate) check_session_calls: AtomicUsize,
    pub(crate) user_calls: AtomicUsize,
    pub(crate) redirect_calls: AtomicUsize,
}

impl FakeIdentity {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn signed_in(user: UserInfo) -> Arc<Self> {
        let fake = Self::new();
        fake.set_user(Some(user));
        fake
    }

    pub(crate) fn set_user(&self, user: Option<UserInfo>) {
        *self.user.lock().unwrap() = user;
    }

    pub(crate) fn on_redirect(&self, user: UserInfo, app_state: Option<Value>) {
        *self.redirect_user.lock().unwrap() = Some(user);
        *self.redirect_app_state.lock().unwrap() = app_state;
    }

    pub(crate) fn fail_redirect(&self, error: &str, description: &str) {
        *self.redirect_failure.lock().unwrap() = Some((error.into(), description.into()));
    }

    pub(crate) fn fail_check_session(&self, error: &str, description: &str) {
        *self.check_session_failure.lock().unwrap() = Some((error.into(), description.into()));
    }

    pub(crate) fn fail_user(&self, error: &str, description: &str) {
        *self.user_failure.lock().unwrap() = Some((error.into(), description.into()));
    }

    fn failure(slot: &Mutex<Option<(String, String)>>) -> Result<(), Error> {
        match slot.lock().unwrap().as_ref() {
            Some((error, description)) => Err(Error::OAuth {
                error: error.clone(),
                description: description.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn login_with_redirect(&self, options: LoginOptions) -> Result<(), Error> {
        self.logins.lock().unwrap().push(options);
        Ok(())
    }

    async fn logout(&self, options: LogoutOptions) -> Result<(), Error> {
        self.logouts.lock().unwrap().push(options);
        self.set_user(None);
        Ok(())
    }

    async fn access_token(&self, audience: Option<&str>) -> Result<SecretString, Error> {
        self.audiences
            .lock()
            .unwrap()
            .push(audience.map(str::to_owned));
        if self.user.lock().unwrap().is_some() {
            Ok(SecretString::from("token-abc"))
        } else {
            Err(Error::LoginRequired)
        }
    }

    async fn check_session(&self) -> Result<(), Error> {
        self.check_session_calls.fetch_add(1, Ordering::SeqCst);
        Self::failure(&self.check_session_failure)
    }

    async fn handle_redirect_callback(&self, _url: Option<&str>) -> Result<RedirectResult, Error> {
        self.redirect_calls.fetch_add(1, Ordering::SeqCst);
        Self::failure(&self.redirect_failure)?;
        if let Some(user) = self.redirect_user.lock().unwrap().take() {
            self.set_user(Some(user));
        }
        Ok(RedirectResult {
            app_state: self.redirect_app_state.lock().unwrap().take(),
        })
    }

    async fn user(&self) -> Result<Option<UserInfo>, Error> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        Self::failure(&self.user_failure)?;
        Ok(self.user.lock().unwrap().clone())
    }
}

// ── Redirect sink and diagnostics ───────────────────────────────────

#[derive(Default)]
pub(crate) struct RecordingRedirect {
    paths: Mutex<Vec<String>>,
}

impl RecordingRedirect {
    pub(crate) fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl RedirectSink for RecordingRedirect {
    fn replace_current_location(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_owned());
    }
}

#[derive(Default)]
pub(crate) struct RecordingDiagnostics {
    messages: Mutex<Vec<String>>,
}

impl RecordingDiagnostics {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn warn(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_owned());
    }
}
