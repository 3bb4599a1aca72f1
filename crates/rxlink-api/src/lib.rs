//! Transport layer for the rxlink SDK.
//!
//! Two surfaces, both usable on their own:
//!
//! - [`identity`]: an OAuth2/OIDC identity provider client
//!   ([`IdentityProvider`] trait, with [`OidcProvider`] implementing the
//!   authorization-code flow with PKCE).
//! - [`graphql`]: a [`QueryExecutor`] that runs named GraphQL operations
//!   ([`GraphqlClient`] over HTTP).
//!
//! Nothing here holds reactive state; that lives in `rxlink-core`.

pub mod error;
pub mod graphql;
pub mod identity;
pub mod transport;

pub use error::Error;
pub use graphql::{
    GraphqlClient, GraphqlError, MutationResponse, Operation, QueryExecutor, QueryResponse,
    TokenSource,
};
pub use identity::{
    IdentityProvider, LoginOptions, LogoutOptions, Navigator, OidcConfig, OidcEndpoints,
    OidcProvider, RedirectResult, TokenSet, UserInfo,
};
pub use transport::{TlsMode, TransportConfig};
