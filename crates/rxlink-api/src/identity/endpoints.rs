use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// The four endpoints the authorization-code flow needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcEndpoints {
    pub authorization: Url,
    pub token: Url,
    pub userinfo: Url,
    pub end_session: Url,
}

#[derive(Deserialize)]
struct DiscoveryDocument {
    authorization_endpoint: Url,
    token_endpoint: Url,
    userinfo_endpoint: Url,
    #[serde(default)]
    end_session_endpoint: Option<Url>,
}

impl OidcEndpoints {
    /// Conventional layout under a tenant domain:
    /// `/authorize`, `/oauth/token`, `/userinfo`, `/v2/logout`.
    pub fn from_domain(domain: &Url) -> Result<Self, Error> {
        let base = with_trailing_slash(domain);
        Ok(Self {
            authorization: base.join("authorize")?,
            token: base.join("oauth/token")?,
            userinfo: base.join("userinfo")?,
            end_session: base.join("v2/logout")?,
        })
    }

    /// Read `/.well-known/openid-configuration`. Providers that do not
    /// advertise an end-session endpoint get the conventional one.
    pub async fn discover(http: &reqwest::Client, domain: &Url) -> Result<Self, Error> {
        let base = with_trailing_slash(domain);
        let url = base.join(".well-known/openid-configuration")?;
        debug!("GET {url}");

        let resp = http.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                message: body,
            });
        }

        let doc: DiscoveryDocument =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("invalid discovery document: {e}"),
                body,
            })?;

        let end_session = match doc.end_session_endpoint {
            Some(url) => url,
            None => base.join("v2/logout")?,
        };

        Ok(Self {
            authorization: doc.authorization_endpoint,
            token: doc.token_endpoint,
            userinfo: doc.userinfo_endpoint,
            end_session,
        })
    }
}

fn with_trailing_slash(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
