// ── Provider facade ──
//
// Composes the session controller, one resource store per query kind,
// the refetch coordinator and the mutation factories behind one cheaply
// cloneable handle.

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use rxlink_api::{GraphqlClient, IdentityProvider, Navigator, OidcProvider, QueryExecutor};

use crate::config::ProviderConfig;
use crate::error::{CoreError, ErrorInfo};
use crate::model::{Principal, ResourceKind};
use crate::mutation::{MutationController, RefetchOptions};
use crate::operations::Mutation;
use crate::operations::mutations::{
    CreateOrder, CreatePatient, CreatePrescription, CreateWebhook, DeleteWebhook, RotateSecret,
    UpdatePatient,
};
use crate::operations::queries::{
    GetClients, GetOrder, GetOrders, GetPatient, GetPatients, GetPrescription, GetPrescriptions,
    GetWebhooks,
};
use crate::operations::requests::{ByIdArgs, NoArgs, OrdersArgs, PatientsArgs, PrescriptionsArgs};
use crate::session::{AccessTokenProvider, RedirectSink, SessionController, SessionState};
use crate::store::cell::SlotCell;
use crate::store::{
    Diagnostics, MutationSlot, RefetchCoordinator, RefetchReport, ResourceBinding, ResourceStore,
    TracingDiagnostics,
};
use crate::stream::SlotStream;

/// The context object UI bindings consume.
#[derive(Clone)]
pub struct Provider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    config: ProviderConfig,
    session: SessionController,
    executor: Arc<dyn QueryExecutor>,
    coordinator: Arc<RefetchCoordinator>,
    /// Set when built from a concrete OIDC client, for session persistence.
    oidc: Option<Arc<OidcProvider>>,

    patients: ResourceStore<GetPatients>,
    patient: ResourceStore<GetPatient>,
    orders: ResourceStore<GetOrders>,
    order: ResourceStore<GetOrder>,
    prescriptions: ResourceStore<GetPrescriptions>,
    prescription: ResourceStore<GetPrescription>,
    webhooks: ResourceStore<GetWebhooks>,
    clients: ResourceStore<GetClients>,

    mutations: MutationSlots,
}

type MutationCell<M> = Arc<SlotCell<MutationSlot<<M as Mutation>::Output>>>;

fn mutation_cell<M: Mutation>() -> MutationCell<M> {
    Arc::new(SlotCell::new(MutationSlot::default()))
}

/// One slot per mutation kind, shared by every controller of that kind.
struct MutationSlots {
    create_patient: MutationCell<CreatePatient>,
    update_patient: MutationCell<UpdatePatient>,
    create_order: MutationCell<CreateOrder>,
    create_prescription: MutationCell<CreatePrescription>,
    create_webhook: MutationCell<CreateWebhook>,
    delete_webhook: MutationCell<DeleteWebhook>,
    rotate_secret: MutationCell<RotateSecret>,
}

impl MutationSlots {
    fn new() -> Self {
        Self {
            create_patient: mutation_cell::<CreatePatient>(),
            update_patient: mutation_cell::<UpdatePatient>(),
            create_order: mutation_cell::<CreateOrder>(),
            create_prescription: mutation_cell::<CreatePrescription>(),
            create_webhook: mutation_cell::<CreateWebhook>(),
            delete_webhook: mutation_cell::<DeleteWebhook>(),
            rotate_secret: mutation_cell::<RotateSecret>(),
        }
    }
}

impl Provider {
    // ── Construction ─────────────────────────────────────────────────

    /// Wire every component around the given collaborators.
    pub fn new(
        config: ProviderConfig,
        identity: Arc<dyn IdentityProvider>,
        executor: Arc<dyn QueryExecutor>,
        redirect: Arc<dyn RedirectSink>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self::assemble(config, identity, executor, redirect, diagnostics, None)
    }

    /// Build the OIDC client and GraphQL client described by `config`.
    pub fn connect(
        config: ProviderConfig,
        navigator: Arc<dyn Navigator>,
        redirect: Arc<dyn RedirectSink>,
    ) -> Result<Self, CoreError> {
        let oidc = OidcProvider::new(config.oidc_config(), &config.transport_config(), navigator)?;
        Self::with_oidc(config, Arc::new(oidc), redirect)
    }

    /// Like [`connect`](Self::connect), around an already-built OIDC
    /// client (discovered endpoints, a seeded refresh token).
    pub fn with_oidc(
        config: ProviderConfig,
        oidc: Arc<OidcProvider>,
        redirect: Arc<dyn RedirectSink>,
    ) -> Result<Self, CoreError> {
        let identity: Arc<dyn IdentityProvider> = oidc.clone();
        let tokens = Self::token_provider(&config, Arc::clone(&identity));
        let client = GraphqlClient::new(
            config.api_url.clone(),
            &config.transport_config(),
            Arc::new(tokens),
        )?;
        info!(api = %config.api_url, domain = %config.domain, "provider connected");
        Ok(Self::assemble(
            config,
            identity,
            Arc::new(client),
            redirect,
            Arc::new(TracingDiagnostics),
            Some(oidc),
        ))
    }

    fn token_provider(
        config: &ProviderConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> AccessTokenProvider {
        AccessTokenProvider::new(
            identity,
            Some(config.effective_audience()),
            config.organization.clone(),
        )
    }

    fn assemble(
        config: ProviderConfig,
        identity: Arc<dyn IdentityProvider>,
        executor: Arc<dyn QueryExecutor>,
        redirect: Arc<dyn RedirectSink>,
        diagnostics: Arc<dyn Diagnostics>,
        oidc: Option<Arc<OidcProvider>>,
    ) -> Self {
        let session = SessionController::new(Self::token_provider(&config, identity), redirect);
        let coordinator = Arc::new(RefetchCoordinator::new(diagnostics));

        let patients = ResourceStore::new(Arc::clone(&executor));
        let orders = ResourceStore::new(Arc::clone(&executor));
        let prescriptions = ResourceStore::new(Arc::clone(&executor));
        let webhooks = ResourceStore::new(Arc::clone(&executor));
        let clients = ResourceStore::new(Arc::clone(&executor));

        coordinator.register(ResourceKind::Patients, patients.refresher());
        coordinator.register(ResourceKind::Orders, orders.refresher());
        coordinator.register(ResourceKind::Prescriptions, prescriptions.refresher());
        coordinator.register(ResourceKind::Webhooks, webhooks.refresher());
        coordinator.register(ResourceKind::Clients, clients.refresher());
        debug!("resource stores registered");

        Self {
            inner: Arc::new(ProviderInner {
                config,
                session,
                patient: ResourceStore::new(Arc::clone(&executor)),
                order: ResourceStore::new(Arc::clone(&executor)),
                prescription: ResourceStore::new(Arc::clone(&executor)),
                executor,
                coordinator,
                oidc,
                patients,
                orders,
                prescriptions,
                webhooks,
                clients,
                mutations: MutationSlots::new(),
            }),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.inner.config
    }

    /// Refresh token held by the OIDC client, for persistence.
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.inner.oidc.as_ref().and_then(|oidc| oidc.refresh_token())
    }

    /// Authorize URL for a new login transaction, without navigating.
    /// `None` when not built from an OIDC client.
    pub fn authorize_url(
        &self,
        organization: Option<String>,
        invitation: Option<String>,
        app_state: Option<Value>,
    ) -> Option<Url> {
        let options = self
            .inner
            .session
            .tokens()
            .login_options(organization, invitation, app_state);
        self.inner.oidc.as_ref().map(|oidc| oidc.authorize_url(options))
    }

    // ── Session ──────────────────────────────────────────────────────

    pub fn session(&self) -> SessionState {
        self.inner.session.state()
    }

    pub fn subscribe_session(&self) -> SlotStream<SessionState> {
        self.inner.session.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.session().is_loading()
    }

    pub fn user(&self) -> Option<Principal> {
        self.session().principal().cloned()
    }

    pub fn error(&self) -> Option<ErrorInfo> {
        self.session().error
    }

    pub async fn initialize(&self, location: &Url) {
        self.inner.session.initialize(location).await;
    }

    pub async fn login(
        &self,
        organization: Option<String>,
        invitation: Option<String>,
        app_state: Option<Value>,
    ) -> Result<(), CoreError> {
        self.inner
            .session
            .login(organization, invitation, app_state)
            .await
    }

    pub async fn logout(&self, return_to: Option<String>) -> Result<(), CoreError> {
        self.inner.session.logout(return_to).await
    }

    pub async fn get_token(&self, audience: Option<&str>) -> Result<SecretString, CoreError> {
        self.inner.session.get_token(audience).await
    }

    pub async fn handle_redirect(&self, url: Option<&str>) {
        self.inner.session.handle_redirect(url).await;
    }

    pub async fn observe_location(&self, location: &Url) -> bool {
        self.inner.session.observe_location(location).await
    }

    pub fn clear_error(&self) {
        self.inner.session.clear_error();
    }

    // ── Resources ────────────────────────────────────────────────────

    pub fn patients(&self, args: PatientsArgs) -> ResourceBinding<GetPatients> {
        self.inner.patients.bind(args)
    }

    pub fn patient(&self, id: impl Into<String>) -> ResourceBinding<GetPatient> {
        self.inner.patient.bind(ByIdArgs::new(id))
    }

    pub fn orders(&self, args: OrdersArgs) -> ResourceBinding<GetOrders> {
        self.inner.orders.bind(args)
    }

    pub fn order(&self, id: impl Into<String>) -> ResourceBinding<GetOrder> {
        self.inner.order.bind(ByIdArgs::new(id))
    }

    pub fn prescriptions(&self, args: PrescriptionsArgs) -> ResourceBinding<GetPrescriptions> {
        self.inner.prescriptions.bind(args)
    }

    pub fn prescription(&self, id: impl Into<String>) -> ResourceBinding<GetPrescription> {
        self.inner.prescription.bind(ByIdArgs::new(id))
    }

    pub fn webhooks(&self) -> ResourceBinding<GetWebhooks> {
        self.inner.webhooks.bind(NoArgs::default())
    }

    pub fn clients(&self) -> ResourceBinding<GetClients> {
        self.inner.clients.bind(NoArgs::default())
    }

    // ── Refetchable stores ──

    pub fn patients_store(&self) -> &ResourceStore<GetPatients> {
        &self.inner.patients
    }

    pub fn orders_store(&self) -> &ResourceStore<GetOrders> {
        &self.inner.orders
    }

    pub fn prescriptions_store(&self) -> &ResourceStore<GetPrescriptions> {
        &self.inner.prescriptions
    }

    pub fn webhooks_store(&self) -> &ResourceStore<GetWebhooks> {
        &self.inner.webhooks
    }

    pub fn clients_store(&self) -> &ResourceStore<GetClients> {
        &self.inner.clients
    }

    // ── Mutations ────────────────────────────────────────────────────

    fn mutation<M: Mutation>(
        &self,
        slot: &MutationCell<M>,
        options: RefetchOptions,
    ) -> MutationController<M> {
        MutationController::with_slot(
            Arc::clone(&self.inner.executor),
            Arc::clone(&self.inner.coordinator),
            Arc::clone(slot),
            options,
        )
    }

    pub fn create_patient(&self, options: RefetchOptions) -> MutationController<CreatePatient> {
        self.mutation(&self.inner.mutations.create_patient, options)
    }

    pub fn update_patient(&self, options: RefetchOptions) -> MutationController<UpdatePatient> {
        self.mutation(&self.inner.mutations.update_patient, options)
    }

    pub fn create_order(&self, options: RefetchOptions) -> MutationController<CreateOrder> {
        self.mutation(&self.inner.mutations.create_order, options)
    }

    pub fn create_prescription(
        &self,
        options: RefetchOptions,
    ) -> MutationController<CreatePrescription> {
        self.mutation(&self.inner.mutations.create_prescription, options)
    }

    pub fn create_webhook(&self, options: RefetchOptions) -> MutationController<CreateWebhook> {
        self.mutation(&self.inner.mutations.create_webhook, options)
    }

    pub fn delete_webhook(&self, options: RefetchOptions) -> MutationController<DeleteWebhook> {
        self.mutation(&self.inner.mutations.delete_webhook, options)
    }

    pub fn rotate_secret(&self, options: RefetchOptions) -> MutationController<RotateSecret> {
        self.mutation(&self.inner.mutations.rotate_secret, options)
    }

    /// Refresh the named resources directly.
    pub async fn refetch<S: AsRef<str>>(&self, names: &[S], await_all: bool) -> RefetchReport {
        self.inner.coordinator.run(names, await_all).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::SexType;
    use crate::operations::requests::{CreatePatientRequest, NameInput};
    use crate::store::RefetchOutcome;
    use crate::test_support::{
        FakeExecutor, FakeIdentity, RecordingDiagnostics, RecordingRedirect, patient_json, user,
    };

    fn config() -> ProviderConfig {
        ProviderConfig::new(
            Url::parse("https://auth.example.org").unwrap(),
            "client",
            Url::parse("http://localhost:3000/callback").unwrap(),
            Url::parse("https://api.example.org/graphql").unwrap(),
        )
    }

    struct Harness {
        provider: Provider,
        identity: Arc<FakeIdentity>,
        executor: Arc<FakeExecutor>,
        diagnostics: Arc<RecordingDiagnostics>,
    }

    fn harness(identity: Arc<FakeIdentity>) -> Harness {
        let executor = FakeExecutor::new();
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let provider = Provider::new(
            config(),
            identity.clone(),
            executor.clone(),
            Arc::new(RecordingRedirect::default()),
            diagnostics.clone(),
        );
        Harness {
            provider,
            identity,
            executor,
            diagnostics,
        }
    }

    fn new_patient() -> CreatePatientRequest {
        CreatePatientRequest {
            name: NameInput {
                first: "Ada".into(),
                last: "Lovelace".into(),
                middle: None,
                title: None,
            },
            date_of_birth: "1815-12-10".into(),
            sex: SexType::Female,
            phone: "+15555550100".into(),
            email: None,
            gender: None,
            external_id: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn fresh_provider_without_session() {
        let h = harness(FakeIdentity::new());
        assert!(h.provider.is_loading());

        h.provider
            .initialize(&Url::parse("http://localhost:3000/").unwrap())
            .await;

        assert!(!h.provider.is_authenticated());
        assert!(!h.provider.is_loading());
        assert!(h.provider.user().is_none());
        assert!(h.provider.error().is_none());
    }

    #[tokio::test]
    async fn mutation_refetches_and_warns_on_unknown_name() {
        let h = harness(FakeIdentity::signed_in(user("auth0|1", "v1")));
        h.executor.respond("patients", json!({ "patients": [] }));
        h.executor.mutation(
            "createPatient",
            json!({ "createPatient": patient_json("pat_new") }),
            &[],
        );

        let mut list = h.provider.patients(PatientsArgs::default());
        list.settled().await;
        assert_eq!(h.executor.calls("patients").len(), 1);

        h.executor
            .respond("patients", json!({ "patients": [patient_json("pat_new")] }));
        let create = h
            .provider
            .create_patient(RefetchOptions::new(["patients", "bogusName"]).awaited());
        let outcome = create.invoke(new_patient()).await;

        assert_eq!(outcome.data.unwrap().id, "pat_new");
        assert_eq!(
            outcome.refetch.outcome("patients"),
            Some(&RefetchOutcome::Refreshed)
        );
        assert_eq!(h.executor.calls("patients").len(), 2);
        assert_eq!(h.provider.patients_store().slot().value[0].id, "pat_new");
        assert_eq!(
            h.diagnostics.messages(),
            ["bogusName is not a defined query"]
        );
    }

    #[tokio::test]
    async fn repeated_tokens_with_same_principal_notify_once() {
        let h = harness(FakeIdentity::signed_in(user("auth0|1", "v1")));
        let mut session = h.provider.subscribe_session();

        h.provider
            .initialize(&Url::parse("http://localhost:3000/").unwrap())
            .await;
        let state = session.changed().await.unwrap();
        assert!(state.is_authenticated());

        h.provider.get_token(None).await.unwrap();
        h.provider.get_token(None).await.unwrap();

        let next = tokio::time::timeout(std::time::Duration::from_millis(50), session.changed()).await;
        assert!(next.is_err(), "no further notification expected");
        assert_eq!(
            *h.identity.audiences.lock().unwrap(),
            [
                Some("https://api.example.org".to_owned()),
                Some("https://api.example.org".to_owned())
            ]
        );
    }

    #[tokio::test]
    async fn single_entity_accessors_are_not_refetchable() {
        let h = harness(FakeIdentity::new());
        let report = h.provider.refetch(&["patient", "orders"], true).await;

        assert_eq!(report.outcome("patient"), Some(&RefetchOutcome::Unknown));
        assert!(matches!(
            report.outcome("orders"),
            Some(RefetchOutcome::Failed { .. })
        ));
        assert_eq!(h.diagnostics.messages().len(), 1);
    }

    #[tokio::test]
    async fn refetch_defaults_to_first_page() {
        let h = harness(FakeIdentity::new());
        h.executor.respond("orders", json!({ "orders": [] }));

        h.provider.refetch(&["getOrders"], true).await;
        assert_eq!(h.executor.calls("orders")[0], json!({ "first": 25 }));
    }

    #[tokio::test]
    async fn controllers_of_one_kind_share_a_slot() {
        let h = harness(FakeIdentity::new());
        h.executor
            .mutation("deleteWebhookConfig", json!({ "deleteWebhookConfig": true }), &[]);

        let first = h.provider.delete_webhook(RefetchOptions::default());
        let second = h
            .provider
            .delete_webhook(RefetchOptions::new(["webhooks"]).awaited());
        let watching = second.subscribe();

        first.invoke(ByIdArgs::new("wh_1")).await;

        assert_eq!(second.slot().result, Some(true));
        assert_eq!(watching.latest().result, Some(true));
        assert!(second.options().await_refetch_queries);
        assert!(first.options().refetch_queries.is_empty());

        let other_kind = h.provider.rotate_secret(RefetchOptions::default());
        assert!(other_kind.slot().result.is_none());
    }
}
