// ── Token endpoint ──
//
// authorization_code and refresh_token grants, form-encoded, plus parsing
// of the token response and of OAuth error bodies.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Tokens granted by the token endpoint.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub id_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Audience the access token was issued for.
    pub audience: Option<String>,
}

impl TokenSet {
    /// `true` when the access token stays valid for longer than `leeway`.
    /// Tokens without an expiry are treated as valid.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        self.expires_at.is_none_or(|exp| exp - leeway > now)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

pub(crate) struct CodeExchange<'a> {
    pub client_id: &'a str,
    pub code: &'a str,
    pub redirect_uri: &'a str,
    pub code_verifier: &'a str,
}

pub(crate) async fn exchange_authorization_code(
    http: &reqwest::Client,
    token_url: &Url,
    req: &CodeExchange<'_>,
    audience: Option<&str>,
) -> Result<TokenSet, Error> {
    let form = [
        ("grant_type", "authorization_code"),
        ("client_id", req.client_id),
        ("code", req.code.trim()),
        ("redirect_uri", req.redirect_uri),
        ("code_verifier", req.code_verifier),
    ];
    debug!(%token_url, "exchanging authorization code");

    let resp = http.post(token_url.clone()).form(&form).send().await?;
    parse_token_response(resp, audience).await
}

pub(crate) async fn refresh_access_token(
    http: &reqwest::Client,
    token_url: &Url,
    client_id: &str,
    refresh_token: &SecretString,
    audience: Option<&str>,
) -> Result<TokenSet, Error> {
    let mut form = vec![
        ("grant_type", "refresh_token"),
        ("client_id", client_id),
        ("refresh_token", refresh_token.expose_secret()),
    ];
    if let Some(aud) = audience {
        form.push(("audience", aud));
    }
    debug!(%token_url, audience, "refreshing access token");

    let resp = http.post(token_url.clone()).form(&form).send().await?;
    parse_token_response(resp, audience).await
}

async fn parse_token_response(
    resp: reqwest::Response,
    audience: Option<&str>,
) -> Result<TokenSet, Error> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(parse_oauth_error(status.as_u16(), body));
    }

    let parsed: TokenResponse =
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("invalid token response: {e}"),
            body: String::new(),
        })?;

    if parsed.access_token.trim().is_empty() {
        return Err(Error::Authentication {
            message: "token response missing access_token".into(),
        });
    }

    Ok(TokenSet {
        access_token: SecretString::from(parsed.access_token),
        refresh_token: parsed
            .refresh_token
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from),
        id_token: parsed.id_token,
        expires_at: parsed
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs)),
        audience: audience.map(str::to_owned),
    })
}

/// Map an error body from the token or userinfo endpoint. Structured OAuth
/// errors become [`Error::OAuth`]; anything else is a plain HTTP error.
pub(crate) fn parse_oauth_error(status: u16, body: String) -> Error {
    match serde_json::from_str::<OAuthErrorBody>(&body) {
        Ok(err) => match err.error.as_str() {
            "login_required" => Error::LoginRequired,
            "consent_required" => Error::ConsentRequired,
            _ => Error::OAuth {
                description: err.error_description.unwrap_or_default(),
                error: err.error,
            },
        },
        Err(_) => Error::Http {
            status,
            message: if body.is_empty() {
                format!("status {status}")
            } else {
                body
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_respects_leeway() {
        let now = Utc::now();
        let mut set = TokenSet {
            access_token: SecretString::from("t"),
            refresh_token: None,
            id_token: None,
            expires_at: Some(now + Duration::seconds(90)),
            audience: None,
        };
        assert!(set.is_fresh_at(now, Duration::seconds(60)));
        set.expires_at = Some(now + Duration::seconds(30));
        assert!(!set.is_fresh_at(now, Duration::seconds(60)));
        set.expires_at = None;
        assert!(set.is_fresh_at(now, Duration::seconds(60)));
    }

    #[test]
    fn oauth_error_bodies() {
        let err = parse_oauth_error(
            403,
            r#"{"error":"invalid_grant","error_description":"Unknown or invalid refresh token."}"#
                .into(),
        );
        assert!(matches!(err, Error::OAuth { ref error, .. } if error == "invalid_grant"));
        assert!(err.is_login_required());

        let err = parse_oauth_error(400, r#"{"error":"login_required"}"#.into());
        assert!(matches!(err, Error::LoginRequired));

        let err = parse_oauth_error(502, "Bad Gateway".into());
        assert!(matches!(err, Error::Http { status: 502, .. }));
    }
}
