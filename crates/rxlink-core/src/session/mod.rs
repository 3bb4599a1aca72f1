// ── Session lifecycle ──
//
// Who is logged in, the redirect handshake, and credential access.

mod controller;
mod state;
mod token;

pub use controller::{RedirectSink, SessionController, has_auth_params};
pub use state::{SessionEvent, SessionPhase, SessionState, transition};
pub use token::AccessTokenProvider;
