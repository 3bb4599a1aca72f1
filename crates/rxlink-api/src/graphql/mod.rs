// ── Query executor ──
//
// Runs named GraphQL operations. Reads always resolve and fold every
// failure into the response; writes report "no response received" as
// `Err` and application errors as data.

mod client;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

pub use client::GraphqlClient;

/// A named GraphQL operation: `name` is sent as `operationName`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub document: &'static str,
}

impl Operation {
    pub const fn new(name: &'static str, document: &'static str) -> Self {
        Self { name, document }
    }
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphqlError {
    /// `extensions.code`, when the server sets one.
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
    }

    /// The response path joined with dots.
    pub fn dotted_path(&self) -> Option<String> {
        self.path.as_ref().map(|segments| {
            segments
                .iter()
                .map(|seg| match seg {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        })
    }

    /// Collapse an `errors` array into a single [`Error::Graphql`] carrying
    /// the first entry. `None` for an empty array.
    pub fn first_as_error(errors: &[Self]) -> Option<Error> {
        errors.first().map(|first| Error::Graphql {
            message: first.message.clone(),
            code: first.code().map(str::to_owned),
            path: first.dotted_path(),
            count: errors.len(),
        })
    }
}

/// Result of a read. `data` may be partial when `error` is set.
#[derive(Debug, Default)]
pub struct QueryResponse {
    pub data: Option<Value>,
    pub error: Option<Error>,
}

/// A structurally received write response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationResponse {
    pub data: Option<Value>,
    pub errors: Vec<GraphqlError>,
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a read. Never fails; failures surface in [`QueryResponse::error`].
    async fn query(&self, operation: &Operation, variables: Value) -> QueryResponse;

    /// Run a write. `Err` only when no response was received.
    async fn mutate(&self, operation: &Operation, variables: Value)
    -> Result<MutationResponse, Error>;
}

/// Supplies the credential for each API request.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// `Ok(None)` sends the request without credentials.
    async fn token(&self) -> Result<Option<SecretString>, Error>;
}
