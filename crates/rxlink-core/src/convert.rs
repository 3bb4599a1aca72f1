// ── Transport to domain conversions ──

use rxlink_api::{GraphqlError, UserInfo};

use crate::error::{CoreError, ErrorInfo};
use crate::model::{Organization, Principal};

/// Claim carrying the organization's display name.
const ORG_NAME_CLAIM: &str = "org_name";

impl From<UserInfo> for Principal {
    fn from(info: UserInfo) -> Self {
        let org_name = info
            .extra
            .get(ORG_NAME_CLAIM)
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);
        Self {
            id: info.sub,
            name: info.name.or(info.nickname),
            email: info.email,
            picture: info.picture,
            updated_at: info.updated_at,
            organization: info.org_id.map(|id| Organization { id, name: org_name }),
        }
    }
}

impl From<&CoreError> for ErrorInfo {
    fn from(err: &CoreError) -> Self {
        let path = match err {
            CoreError::Graphql { path, .. } => path.clone(),
            _ => None,
        };
        Self {
            message: err.to_string(),
            code: err.code().map(str::to_owned),
            path,
        }
    }
}

impl From<CoreError> for ErrorInfo {
    fn from(err: CoreError) -> Self {
        Self::from(&err)
    }
}

impl From<rxlink_api::Error> for ErrorInfo {
    fn from(err: rxlink_api::Error) -> Self {
        Self::from(CoreError::from(err))
    }
}

impl From<&GraphqlError> for ErrorInfo {
    fn from(err: &GraphqlError) -> Self {
        Self {
            message: err.message.clone(),
            code: err.code().map(str::to_owned),
            path: err.dotted_path(),
        }
    }
}
