use super::{DraftPhase, FormMode, FormModel, FormSettings, SubmissionState, ValidationErrors};
use crate::cache::QueryKey;
use crate::coordinator::CacheCoordinator;
use crate::notify::NotificationCenter;
use crate::transport::ApiError;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of one submit call
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Written; carries the backend's response body
    Saved(Value),
    /// A submission of this draft is already in flight; nothing was sent
    Busy,
    /// Client-side validation failed; nothing was sent
    Invalid(ValidationErrors),
    /// The backend call failed; the draft is preserved
    Failed(ApiError),
}

struct FormState<M> {
    draft: M,
    mode: FormMode,
    phase: DraftPhase,
    submission: SubmissionState,
    field_errors: ValidationErrors,
}

/// Drives one draft from editing to a settled submission
///
/// Clones share the same draft.
pub struct FormController<M: FormModel> {
    state: Arc<Mutex<FormState<M>>>,
    coordinator: CacheCoordinator,
    notifications: NotificationCenter,
    settings: FormSettings,
}

impl<M: FormModel> Clone for FormController<M> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            coordinator: self.coordinator.clone(),
            notifications: self.notifications.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<M: FormModel> FormController<M> {
    /// Controller holding an empty add-mode draft
    pub fn new(
        coordinator: CacheCoordinator,
        notifications: NotificationCenter,
        settings: FormSettings,
    ) -> Self {
        let state = FormState {
            draft: M::empty(&settings),
            mode: FormMode::Add,
            phase: DraftPhase::Empty,
            submission: SubmissionState::default(),
            field_errors: ValidationErrors::default(),
        };
        Self { state: Arc::new(Mutex::new(state)), coordinator, notifications, settings }
    }

    fn lock(&self) -> MutexGuard<'_, FormState<M>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &FormSettings {
        &self.settings
    }

    /// Copy of the current draft
    pub fn draft(&self) -> M {
        self.lock().draft.clone()
    }

    pub fn mode(&self) -> FormMode {
        self.lock().mode
    }

    pub fn phase(&self) -> DraftPhase {
        self.lock().phase
    }

    pub fn submission(&self) -> SubmissionState {
        self.lock().submission.clone()
    }

    /// Inline errors from the last rejected submit
    pub fn field_errors(&self) -> ValidationErrors {
        self.lock().field_errors.clone()
    }

    /// Change the draft
    pub fn edit<R>(&self, change: impl FnOnce(&mut M) -> R) -> R {
        let mut state = self.lock();
        match state.phase {
            DraftPhase::Submitting => {
                log::warn!("{} draft edited while a submission is in flight", M::LABEL)
            }
            DraftPhase::Empty => state.phase = DraftPhase::Editing,
            DraftPhase::Editing => {}
        }
        change(&mut state.draft)
    }

    /// Flatten the current draft
    pub fn build_dto(&self) -> M::Dto {
        self.lock().draft.build_dto()
    }

    /// Switch to editing an existing entity
    pub fn hydrate(&self, id: i64, dto: &M::Dto) {
        let mut state = self.lock();
        state.draft = M::hydrate(dto, &self.settings);
        state.mode = FormMode::Edit { id };
        state.phase = DraftPhase::Editing;
        state.field_errors = ValidationErrors::default();
        state.submission.last_error = None;
    }

    /// Fetch an entity through the coordinator and edit it
    pub async fn load(&self, id: i64) -> Result<(), ApiError> {
        let dto: M::Dto = self.coordinator.read_as(QueryKey::by_id(M::RESOURCE, id)).await?;
        self.hydrate(id, &dto);
        log::debug!("Loaded {} {} for editing", M::LABEL, id);
        Ok(())
    }

    /// Discard the draft and return to an empty add form
    pub fn cancel(&self) {
        let mut state = self.lock();
        state.draft = M::empty(&self.settings);
        state.mode = FormMode::Add;
        state.field_errors = ValidationErrors::default();
        state.submission.last_error = None;
        if state.phase != DraftPhase::Submitting {
            state.phase = DraftPhase::Empty;
        }
    }

    /// Validate and write the draft
    ///
    /// The write and its settlement run on their own task. Dropping the
    /// returned future does not cancel either: the form stays busy until the
    /// write settles, then resets or keeps the draft as usual.
    pub async fn submit(&self) -> SubmitOutcome {
        let (dto, mode) = {
            let mut state = self.lock();
            if state.submission.in_flight {
                log::debug!("{} submit ignored: already in flight", M::LABEL);
                return SubmitOutcome::Busy;
            }
            if let Err(errors) = state.draft.validate() {
                log::debug!("{} draft rejected: {}", M::LABEL, errors);
                state.field_errors = errors.clone();
                return SubmitOutcome::Invalid(errors);
            }
            state.field_errors = ValidationErrors::default();
            state.submission.in_flight = true;
            state.phase = DraftPhase::Submitting;
            (state.draft.build_dto(), state.mode)
        };

        let controller = self.clone();
        let task = tokio::spawn(async move {
            let result = match mode {
                FormMode::Add => controller.coordinator.create_as(M::RESOURCE, &dto).await,
                FormMode::Edit { id } => {
                    controller.coordinator.update_as(M::RESOURCE, &id.to_string(), &dto).await
                }
            };
            controller.settle(mode, result)
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let err = ApiError::Transport(format!("{} submission aborted: {}", M::LABEL, e));
                self.settle(mode, Err(err))
            }
        }
    }

    /// Record the end of a write and release the busy flag
    fn settle(&self, mode: FormMode, result: Result<Value, ApiError>) -> SubmitOutcome {
        let mut state = self.lock();
        state.submission.in_flight = false;
        match result {
            Ok(saved) => {
                state.draft = M::empty(&self.settings);
                state.mode = FormMode::Add;
                state.phase = DraftPhase::Empty;
                state.submission.last_error = None;
                let verb = if mode == FormMode::Add { "created" } else { "updated" };
                self.notifications.success(format!("{} {}", M::LABEL, verb));
                SubmitOutcome::Saved(saved)
            }
            Err(err) => {
                state.submission.last_error = Some(err.clone());
                state.phase = DraftPhase::Editing;
                self.notifications.error(err.user_message());
                SubmitOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{CoordinatorConfig, Resource};
    use crate::forms::{ProductMasterDraft, VendorDraft};
    use crate::model::{TaxUpdate, UomUpdate};
    use crate::notify::Level;
    use crate::session::{MemoryClientStore, Session};
    use crate::testing::{MemoryBackend, ScriptedTransport};
    use crate::transport::Method;
    use serde_json::json;
    use tokio::time::Duration;

    async fn setup(backend: MemoryBackend) -> (CacheCoordinator, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(backend));
        let session = Session::new(Arc::new(MemoryClientStore::new()));
        session.set_token("tok").await.unwrap();
        let config = CoordinatorConfig { write_retries: 0, ..CoordinatorConfig::default() };
        (CacheCoordinator::new(transport.clone(), session, config), transport)
    }

    fn product_form(coordinator: &CacheCoordinator) -> FormController<ProductMasterDraft> {
        FormController::new(coordinator.clone(), NotificationCenter::new(), FormSettings::default())
    }

    fn fill_product(form: &FormController<ProductMasterDraft>) {
        form.edit(|draft| {
            draft.product_code = "P-1".into();
            draft.product_name = "Hex bolt".into();
            let line = draft.uoms.rows()[0].id;
            draft.uoms.update_field(line, UomUpdate::Uom(Some(4)));
            draft.uoms.update_field(line, UomUpdate::ConversionFactor(Some(1.0)));
        });
    }

    #[tokio::test]
    async fn test_successful_add_resets_draft_and_invalidates_list() {
        let (coordinator, transport) = setup(MemoryBackend::new()).await;
        let list = QueryKey::list(Resource::ProductMaster);
        coordinator.read(list.clone()).await.unwrap();
        let form = product_form(&coordinator);
        fill_product(&form);
        assert_eq!(form.phase(), DraftPhase::Editing);

        let outcome = form.submit().await;

        assert!(matches!(outcome, SubmitOutcome::Saved(_)));
        assert_eq!(form.phase(), DraftPhase::Empty);
        assert!(form.draft().product_code.is_empty());
        assert!(!form.submission().in_flight);
        assert!(!coordinator.is_fresh(&list));
        assert_eq!(transport.backend().items("/product-master-forms").len(), 1);
        assert_eq!(form.notifications.active()[0].level, Level::Success);
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_network() {
        let (coordinator, transport) = setup(MemoryBackend::new()).await;
        let form = product_form(&coordinator);

        let outcome = form.submit().await;

        let SubmitOutcome::Invalid(errors) = outcome else {
            panic!("expected validation failure, got {:?}", outcome);
        };
        assert!(errors.contains("productCode"));
        assert_eq!(form.field_errors(), errors);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_server_failure_preserves_draft() {
        let (coordinator, transport) = setup(MemoryBackend::new()).await;
        let form = product_form(&coordinator);
        fill_product(&form);
        transport.respond_next(Method::Post, "/product-master-forms", 500, json!({}));

        let outcome = form.submit().await;

        assert!(matches!(outcome, SubmitOutcome::Failed(ApiError::Server { status: 500, .. })));
        assert_eq!(form.draft().product_code, "P-1");
        assert_eq!(form.phase(), DraftPhase::Editing);
        let submission = form.submission();
        assert!(!submission.in_flight);
        assert!(submission.last_error.is_some());
        let notification = &form.notifications.active()[0];
        assert_eq!(notification.level, Level::Error);
        assert_eq!(notification.message, crate::transport::GENERIC_FAILURE_MESSAGE);

        assert!(matches!(form.submit().await, SubmitOutcome::Saved(_)));
        assert_eq!(transport.count(Method::Post, "/product-master-forms"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_submit_while_in_flight_is_refused() {
        let (coordinator, transport) = setup(MemoryBackend::new()).await;
        transport.set_delay(Duration::from_millis(100));
        let form = product_form(&coordinator);
        fill_product(&form);

        let (first, second) = tokio::join!(form.submit(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            form.submit().await
        });

        assert!(matches!(first, SubmitOutcome::Saved(_)));
        assert_eq!(second, SubmitOutcome::Busy);
        assert_eq!(transport.count(Method::Post, "/product-master-forms"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_submit_stays_busy_until_the_write_settles() {
        let (coordinator, transport) = setup(MemoryBackend::new()).await;
        transport.set_delay(Duration::from_millis(100));
        let list = QueryKey::list(Resource::ProductMaster);
        coordinator.read(list.clone()).await.unwrap();
        let form = product_form(&coordinator);
        fill_product(&form);

        let submit = {
            let form = form.clone();
            tokio::spawn(async move { form.submit().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        submit.abort();
        let _ = submit.await;

        assert!(form.submission().in_flight);
        assert_eq!(form.phase(), DraftPhase::Submitting);
        assert_eq!(form.submit().await, SubmitOutcome::Busy);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(transport.count(Method::Post, "/product-master-forms"), 1);
        assert_eq!(transport.backend().items("/product-master-forms").len(), 1);
        assert!(!form.submission().in_flight);
        assert_eq!(form.phase(), DraftPhase::Empty);
        assert!(form.draft().product_code.is_empty());
        assert!(!coordinator.is_fresh(&list));
        let notification = &form.notifications.active()[0];
        assert_eq!(notification.level, Level::Success);
        assert_eq!(notification.message, "Product master created");
    }

    #[tokio::test]
    async fn test_edit_mode_updates_loaded_vendor() {
        let backend = MemoryBackend::new().with_collection(
            "/vendor-forms",
            vec![json!({
                "id": 7,
                "vendorCode": "V-7",
                "vendorName": "Acme",
                "taxInformationDto": [
                    {"taxType": "GST", "taxNumber": "T-1"},
                    {"taxType": "CESS", "taxNumber": "T-2"},
                    {"taxType": "TDS", "taxNumber": "T-3"}
                ]
            })],
        );
        let (coordinator, transport) = setup(backend).await;
        let form: FormController<VendorDraft> =
            FormController::new(coordinator, NotificationCenter::new(), FormSettings::default());

        form.load(7).await.unwrap();
        assert_eq!(form.mode(), FormMode::Edit { id: 7 });
        form.edit(|draft| {
            let middle = draft.taxes.rows()[1].id;
            draft.taxes.delete_row(middle);
            let last = draft.taxes.rows()[1].id;
            draft.taxes.update_field(last, TaxUpdate::Percentage(Some(2.0)));
        });

        assert!(matches!(form.submit().await, SubmitOutcome::Saved(_)));

        let stored = transport.backend().item("/vendor-forms", 7).unwrap();
        let numbers: Vec<_> = stored["taxInformationDto"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["taxNumber"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(numbers, vec!["T-1", "T-3"]);
        assert_eq!(form.mode(), FormMode::Add);
    }

    #[tokio::test]
    async fn test_cancel_discards_draft() {
        let (coordinator, _transport) = setup(MemoryBackend::new()).await;
        let form = product_form(&coordinator);
        fill_product(&form);

        form.cancel();

        assert_eq!(form.phase(), DraftPhase::Empty);
        assert!(form.draft().product_name.is_empty());
    }
}
