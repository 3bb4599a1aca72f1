// ── Write operations ──

use rxlink_api::Operation;

use super::Mutation;
use super::queries::{order_fields, patient_fields, prescription_fields};
use super::requests::{
    ByIdArgs, CreateOrderRequest, CreatePatientRequest, CreatePrescriptionRequest,
    CreateWebhookRequest, UpdatePatientRequest,
};
use crate::model::{ApiClient, MutationKind, Order, Patient, Prescription, WebhookConfig};

pub struct CreatePatient;

impl Mutation for CreatePatient {
    type Variables = CreatePatientRequest;
    type Output = Patient;

    const KIND: MutationKind = MutationKind::CreatePatient;
    const OPERATION: Operation = Operation::new(
        "createPatient",
        concat!(
            "mutation createPatient($name: NameInput!, $dateOfBirth: AWSDate!, $sex: SexType!, \
             $phone: AWSPhone!, $email: AWSEmail, $gender: String, $externalId: ID, \
             $address: AddressInput) { createPatient(name: $name, dateOfBirth: $dateOfBirth, \
             sex: $sex, phone: $phone, email: $email, gender: $gender, externalId: $externalId, \
             address: $address)",
            patient_fields!(),
            " }"
        ),
    );
    const FIELD: &'static str = "createPatient";
}

pub struct UpdatePatient;

impl Mutation for UpdatePatient {
    type Variables = UpdatePatientRequest;
    type Output = Patient;

    const KIND: MutationKind = MutationKind::UpdatePatient;
    const OPERATION: Operation = Operation::new(
        "updatePatient",
        concat!(
            "mutation updatePatient($id: ID!, $name: NameInput, $email: AWSEmail, \
             $phone: AWSPhone, $gender: String, $externalId: ID) { updatePatient(id: $id, \
             name: $name, email: $email, phone: $phone, gender: $gender, externalId: $externalId)",
            patient_fields!(),
            " }"
        ),
    );
    const FIELD: &'static str = "updatePatient";
}

pub struct CreateOrder;

impl Mutation for CreateOrder {
    type Variables = CreateOrderRequest;
    type Output = Order;

    const KIND: MutationKind = MutationKind::CreateOrder;
    const OPERATION: Operation = Operation::new(
        "createOrder",
        concat!(
            "mutation createOrder($patientId: ID!, $fills: [FillInput!]!, \
             $address: AddressInput!, $pharmacyId: ID, $externalId: ID) { \
             createOrder(patientId: $patientId, fills: $fills, address: $address, \
             pharmacyId: $pharmacyId, externalId: $externalId)",
            order_fields!(),
            " }"
        ),
    );
    const FIELD: &'static str = "createOrder";
}

pub struct CreatePrescription;

impl Mutation for CreatePrescription {
    type Variables = CreatePrescriptionRequest;
    type Output = Prescription;

    const KIND: MutationKind = MutationKind::CreatePrescription;
    const OPERATION: Operation = Operation::new(
        "createPrescription",
        concat!(
            "mutation createPrescription($patientId: ID!, $medicationId: ID!, \
             $dispenseQuantity: Int!, $dispenseUnit: DispenseUnit!, \
             $dispenseAsWritten: Boolean!, $refillsAllowed: Int!, $daysSupply: Int!, \
             $instructions: String!, $notes: String, $effectiveDate: AWSDate, \
             $externalId: ID, $diagnoses: [ID]) { createPrescription(patientId: $patientId, \
             medicationId: $medicationId, dispenseQuantity: $dispenseQuantity, \
             dispenseUnit: $dispenseUnit, dispenseAsWritten: $dispenseAsWritten, \
             refillsAllowed: $refillsAllowed, daysSupply: $daysSupply, \
             instructions: $instructions, notes: $notes, effectiveDate: $effectiveDate, \
             externalId: $externalId, diagnoses: $diagnoses)",
            prescription_fields!(),
            " }"
        ),
    );
    const FIELD: &'static str = "createPrescription";
}

pub struct CreateWebhook;

impl Mutation for CreateWebhook {
    type Variables = CreateWebhookRequest;
    type Output = WebhookConfig;

    const KIND: MutationKind = MutationKind::CreateWebhook;
    const OPERATION: Operation = Operation::new(
        "createWebhook",
        "mutation createWebhook($name: String, $filters: [String], $sharedSecret: String, \
         $url: String!) { createWebhookConfig(name: $name, filters: $filters, \
         sharedSecret: $sharedSecret, url: $url) { id name url filters } }",
    );
    const FIELD: &'static str = "createWebhookConfig";
}

pub struct DeleteWebhook;

impl Mutation for DeleteWebhook {
    type Variables = ByIdArgs;
    type Output = bool;

    const KIND: MutationKind = MutationKind::DeleteWebhook;
    const OPERATION: Operation = Operation::new(
        "deleteWebhookConfig",
        "mutation deleteWebhookConfig($id: String!) { deleteWebhookConfig(id: $id) }",
    );
    const FIELD: &'static str = "deleteWebhookConfig";
}

pub struct RotateSecret;

impl Mutation for RotateSecret {
    type Variables = ByIdArgs;
    type Output = ApiClient;

    const KIND: MutationKind = MutationKind::RotateSecret;
    const OPERATION: Operation = Operation::new(
        "rotateSecret",
        "mutation rotateSecret($id: ID!) { rotateSecret(id: $id) { id name appType secret } }",
    );
    const FIELD: &'static str = "rotateSecret";
}
