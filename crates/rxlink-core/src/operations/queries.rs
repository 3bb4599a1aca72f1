// ── Read operations ──

use rxlink_api::Operation;

use super::Query;
use super::requests::{ByIdArgs, NoArgs, OrdersArgs, PatientsArgs, PrescriptionsArgs};
use crate::model::{ApiClient, Order, Patient, Prescription, WebhookConfig};

// Selection sets are macros so `concat!` can splice them into documents.

macro_rules! patient_fields {
    () => {
        "{ id externalId name { first last middle title full } \
         dateOfBirth sex gender email phone \
         address { street1 street2 city state postalCode country } }"
    };
}

macro_rules! order_fields {
    () => {
        "{ id externalId state createdAt \
         patient { id name { full } } pharmacy { id name } \
         address { street1 street2 city state postalCode country } \
         fills { id state requestedAt filledAt treatment { id name } } }"
    };
}

macro_rules! prescription_fields {
    () => {
        "{ id externalId state \
         medication { id name } patient { id name { full } } prescriber { id name } \
         dispenseQuantity dispenseUnit dispenseAsWritten daysSupply \
         refillsAllowed refillsRemaining instructions notes \
         effectiveDate expirationDate writtenAt }"
    };
}
pub(crate) use {order_fields, patient_fields, prescription_fields};

pub struct GetPatients;

impl Query for GetPatients {
    type Args = PatientsArgs;
    type Output = Vec<Patient>;

    const OPERATION: Operation = Operation::new(
        "patients",
        concat!(
            "query patients($after: ID, $first: Int, $filter: PatientFilter) \
             { patients(after: $after, first: $first, filter: $filter)",
            patient_fields!(),
            " }"
        ),
    );
    const FIELD: &'static str = "patients";
}

pub struct GetPatient;

impl Query for GetPatient {
    type Args = ByIdArgs;
    type Output = Option<Patient>;

    const OPERATION: Operation = Operation::new(
        "patient",
        concat!(
            "query patient($id: ID!) { patient(id: $id)",
            patient_fields!(),
            " }"
        ),
    );
    const FIELD: &'static str = "patient";
}

pub struct GetOrders;

impl Query for GetOrders {
    type Args = OrdersArgs;
    type Output = Vec<Order>;

    const OPERATION: Operation = Operation::new(
        "orders",
        concat!(
            "query orders($after: ID, $first: Int, $filter: OrderFilter) \
             { orders(after: $after, first: $first, filter: $filter)",
            order_fields!(),
            " }"
        ),
    );
    const FIELD: &'static str = "orders";
}

pub struct GetOrder;

impl Query for GetOrder {
    type Args = ByIdArgs;
    type Output = Option<Order>;

    const OPERATION: Operation = Operation::new(
        "order",
        concat!(
            "query order($id: ID!) { order(id: $id)",
            order_fields!(),
            " }"
        ),
    );
    const FIELD: &'static str = "order";
}

pub struct GetPrescriptions;

impl Query for GetPrescriptions {
    type Args = PrescriptionsArgs;
    type Output = Vec<Prescription>;

    const OPERATION: Operation = Operation::new(
        "prescriptions",
        concat!(
            "query prescriptions($after: ID, $first: Int, $filter: PrescriptionFilter) \
             { prescriptions(after: $after, first: $first, filter: $filter)",
            prescription_fields!(),
            " }"
        ),
    );
    const FIELD: &'static str = "prescriptions";
}

pub struct GetPrescription;

impl Query for GetPrescription {
    type Args = ByIdArgs;
    type Output = Option<Prescription>;

    const OPERATION: Operation = Operation::new(
        "prescription",
        concat!(
            "query prescription($id: ID!) { prescription(id: $id)",
            prescription_fields!(),
            " }"
        ),
    );
    const FIELD: &'static str = "prescription";
}

pub struct GetWebhooks;

impl Query for GetWebhooks {
    type Args = NoArgs;
    type Output = Vec<WebhookConfig>;

    const OPERATION: Operation = Operation::new(
        "webhooks",
        "query webhooks { webhooks { id name url filters } }",
    );
    const FIELD: &'static str = "webhooks";
}

pub struct GetClients;

impl Query for GetClients {
    type Args = NoArgs;
    type Output = Vec<ApiClient>;

    const OPERATION: Operation = Operation::new(
        "clients",
        "query clients { clients { id name appType } }",
    );
    const FIELD: &'static str = "clients";
}
