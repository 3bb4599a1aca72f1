// ── Typed operation catalog ──
//
// Each read or write the provider exposes is a zero-sized type binding its
// GraphQL operation, variables type, output type and the response field
// the output lives under.

pub mod mutations;
pub mod queries;
pub mod requests;

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use rxlink_api::Operation;

use crate::error::CoreError;
use crate::model::MutationKind;

/// A read whose result is cached in a [`ResourceStore`](crate::ResourceStore).
pub trait Query: Send + Sync + 'static {
    type Args: Clone + PartialEq + fmt::Debug + Serialize + Send + Sync + 'static;
    /// Slot value. `Default` is what the slot holds before the first fetch
    /// and after a failed one.
    type Output: DeserializeOwned + Default + Clone + fmt::Debug + Send + Sync + 'static;

    const OPERATION: Operation;
    /// Response field holding the result, e.g. `patients`.
    const FIELD: &'static str;
}

/// A write run by a [`MutationController`](crate::MutationController).
pub trait Mutation: Send + Sync + 'static {
    type Variables: Serialize + Send + Sync + 'static;
    type Output: DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static;

    const KIND: MutationKind;
    const OPERATION: Operation;
    const FIELD: &'static str;
}

pub(crate) fn encode_variables<A: Serialize>(args: &A) -> Result<Value, CoreError> {
    serde_json::to_value(args)
        .map_err(|e| CoreError::Internal(format!("cannot encode variables: {e}")))
}

/// `data[field]`, with a missing or null field read as the default value.
pub(crate) fn decode_field<T: DeserializeOwned + Default>(
    data: Option<&Value>,
    field: &str,
) -> Result<T, CoreError> {
    match data.and_then(|d| d.get(field)) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => T::deserialize(value).map_err(|e| CoreError::Decode {
            message: format!("`{field}`: {e}"),
        }),
    }
}

/// `data[field]` for outputs without a meaningful default.
pub(crate) fn decode_optional<T: DeserializeOwned>(
    data: Option<&Value>,
    field: &str,
) -> Result<Option<T>, CoreError> {
    decode_field::<Option<T>>(data, field)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Patient;
    use serde_json::json;

    #[test]
    fn missing_or_null_field_is_default() {
        let empty: Vec<Patient> = decode_field(None, "patients").unwrap();
        assert!(empty.is_empty());

        let data = json!({ "patients": null });
        let empty: Vec<Patient> = decode_field(Some(&data), "patients").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn wrong_shape_is_a_decode_error() {
        let data = json!({ "patients": "nope" });
        let result: Result<Vec<Patient>, _> = decode_field(Some(&data), "patients");
        assert!(matches!(result, Err(CoreError::Decode { .. })));
    }

    #[test]
    fn optional_output() {
        let data = json!({ "deleteWebhookConfig": true });
        let deleted: Option<bool> = decode_optional(Some(&data), "deleteWebhookConfig").unwrap();
        assert_eq!(deleted, Some(true));
        let none: Option<bool> = decode_optional(None, "deleteWebhookConfig").unwrap();
        assert_eq!(none, None);
    }
}
