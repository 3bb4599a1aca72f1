// ── Resource and mutation identifiers ──
//
// Closed enumerations replacing free-form names. Resource kinds parse from
// both the short store name (`patients`) and the accessor name
// (`getPatients`) so refetch lists written either way resolve.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// A refetchable list resource.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[strum(to_string = "patients", serialize = "getPatients")]
    Patients,
    #[strum(to_string = "orders", serialize = "getOrders")]
    Orders,
    #[strum(to_string = "prescriptions", serialize = "getPrescriptions")]
    Prescriptions,
    #[strum(to_string = "webhooks", serialize = "getWebhooks")]
    Webhooks,
    #[strum(to_string = "clients", serialize = "getClients")]
    Clients,
}

/// A write operation exposed by the provider.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MutationKind {
    CreatePatient,
    UpdatePatient,
    CreateOrder,
    CreatePrescription,
    CreateWebhook,
    DeleteWebhook,
    RotateSecret,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn resource_kinds_parse_short_and_accessor_names() {
        assert_eq!("patients".parse::<ResourceKind>().unwrap(), ResourceKind::Patients);
        assert_eq!("getPatients".parse::<ResourceKind>().unwrap(), ResourceKind::Patients);
        assert_eq!("getWebhooks".parse::<ResourceKind>().unwrap(), ResourceKind::Webhooks);
        assert!("bogusName".parse::<ResourceKind>().is_err());
        assert!("patient".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn resource_kind_display_is_short_name() {
        let names: Vec<String> = ResourceKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(
            names,
            ["patients", "orders", "prescriptions", "webhooks", "clients"]
        );
    }

    #[test]
    fn mutation_kind_names() {
        assert_eq!(MutationKind::RotateSecret.to_string(), "rotateSecret");
        assert_eq!(
            "createPrescription".parse::<MutationKind>().unwrap(),
            MutationKind::CreatePrescription
        );
    }
}
