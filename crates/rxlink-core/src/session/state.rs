// ── Session state machine ──
//
// Pure transitions: `transition` never performs I/O, and returns `None`
// when the event leaves the state unchanged so no notification goes out.

use std::sync::Arc;

use serde::Serialize;

use crate::error::ErrorInfo;
use crate::model::Principal;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "principal", rename_all = "snake_case")]
pub enum SessionPhase {
    Unauthenticated,
    /// Before the first resolution of `initialize`.
    Initializing,
    Authenticated(Arc<Principal>),
}

/// The session as subscribers see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    /// Side channel, independent of the phase.
    pub error: Option<ErrorInfo>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initializing()
    }
}

impl SessionState {
    pub fn initializing() -> Self {
        Self {
            phase: SessionPhase::Initializing,
            error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.phase, SessionPhase::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, SessionPhase::Initializing)
    }

    pub fn principal(&self) -> Option<&Principal> {
        match &self.phase {
            SessionPhase::Authenticated(p) => Some(p),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }
}

/// Inputs to [`transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Initialization resolved with this principal.
    Initialised(Option<Principal>),
    /// A later redirect handshake completed.
    RedirectComplete(Option<Principal>),
    /// A credential was obtained.
    TokenRefreshed(Option<Principal>),
    Failed(ErrorInfo),
    ErrorCleared,
}

fn phase_for(principal: Option<Principal>) -> SessionPhase {
    match principal {
        Some(p) => SessionPhase::Authenticated(Arc::new(p)),
        None => SessionPhase::Unauthenticated,
    }
}

/// Apply `event` to `state`. `None` means unchanged.
pub fn transition(state: &SessionState, event: SessionEvent) -> Option<SessionState> {
    match event {
        SessionEvent::Initialised(principal) => Some(SessionState {
            phase: phase_for(principal),
            error: state.error.clone(),
        }),
        SessionEvent::RedirectComplete(principal) | SessionEvent::TokenRefreshed(principal) => {
            // Initialised reads the principal last; nothing to do until then.
            if state.is_loading() {
                return None;
            }
            let current = state.principal().map(Principal::version);
            let next = principal.as_ref().map(Principal::version);
            if current == next {
                return None;
            }
            Some(SessionState {
                phase: phase_for(principal),
                error: state.error.clone(),
            })
        }
        SessionEvent::Failed(error) => {
            let phase = match &state.phase {
                SessionPhase::Initializing => SessionPhase::Unauthenticated,
                other => other.clone(),
            };
            Some(SessionState {
                phase,
                error: Some(error),
            })
        }
        SessionEvent::ErrorCleared => state.error.as_ref().map(|_| SessionState {
            phase: state.phase.clone(),
            error: None,
        }),
    }
}
