// GraphQL-over-HTTP client.
//
// Every request is a POST of `{query, variables, operationName}` with the
// credential from the token source sent as the raw `authorization` value.
// Nothing is cached; every read goes to the network.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{GraphqlError, MutationResponse, Operation, QueryExecutor, QueryResponse, TokenSource};
use crate::error::Error;
use crate::transport::TransportConfig;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request<'a> {
    query: &'a str,
    variables: &'a Value,
    operation_name: &'a str,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

pub struct GraphqlClient {
    http: reqwest::Client,
    endpoint: Url,
    tokens: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl GraphqlClient {
    pub fn new(
        endpoint: Url,
        transport: &TransportConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::from_reqwest(endpoint, http, tokens))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(endpoint: Url, http: reqwest::Client, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http,
            endpoint,
            tokens,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send(&self, operation: &Operation, variables: &Value) -> Result<Envelope, Error> {
        let mut req = self.http.post(self.endpoint.clone()).json(&Request {
            query: operation.document,
            variables,
            operation_name: operation.name,
        });

        if let Some(token) = self.tokens.token().await? {
            let mut value =
                HeaderValue::from_str(token.expose_secret()).map_err(|e| Error::Authentication {
                    message: format!("invalid authorization header value: {e}"),
                })?;
            value.set_sensitive(true);
            req = req.header(AUTHORIZATION, value);
        }

        debug!(operation = operation.name, "POST {}", self.endpoint);
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        // GraphQL servers report validation failures with a 4xx status and
        // a regular `errors` body.
        match (status.is_success(), serde_json::from_str::<Envelope>(&body)) {
            (true, Ok(envelope)) => Ok(envelope),
            (false, Ok(envelope)) if !envelope.errors.is_empty() => Ok(envelope),
            (false, _) => Err(Error::Http {
                status: status.as_u16(),
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    body
                },
            }),
            (true, Err(e)) => Err(Error::Deserialization {
                message: format!("invalid GraphQL response: {e}"),
                body,
            }),
        }
    }
}

#[async_trait]
impl QueryExecutor for GraphqlClient {
    async fn query(&self, operation: &Operation, variables: Value) -> QueryResponse {
        match self.send(operation, &variables).await {
            Ok(envelope) => {
                let error = GraphqlError::first_as_error(&envelope.errors);
                if let Some(err) = &error {
                    warn!(operation = operation.name, error = %err, "query returned errors");
                }
                QueryResponse {
                    data: envelope.data,
                    error,
                }
            }
            Err(e) => {
                warn!(operation = operation.name, error = %e, "query failed");
                QueryResponse {
                    data: None,
                    error: Some(e),
                }
            }
        }
    }

    async fn mutate(
        &self,
        operation: &Operation,
        variables: Value,
    ) -> Result<MutationResponse, Error> {
        let envelope = self.send(operation, &variables).await?;
        if !envelope.errors.is_empty() {
            debug!(
                operation = operation.name,
                count = envelope.errors.len(),
                "mutation returned errors"
            );
        }
        Ok(MutationResponse {
            data: envelope.data,
            errors: envelope.errors,
        })
    }
}
