use cucumber::World as CucumberWorld;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use stockroom_core::app::{App, AppCommand, AppEvent};
use stockroom_core::cache::FetchResult;
use stockroom_core::coordinator::{CacheCoordinator, CoordinatorConfig};
use stockroom_core::fields::{AttributeGroup, RowChange, RowGroup};
use stockroom_core::forms::{FormController, FormSettings, ProductMasterDraft, SubmitOutcome, VendorDraft};
use stockroom_core::model::ProductMasterUomDto;
use stockroom_core::session::{Credentials, MemoryClientStore};
use stockroom_core::testing::{MemoryBackend, ScriptedTransport};

pub const CLIENT_ID: &str = "web-client";
pub const CLIENT_SECRET: &str = "s3cret";

#[derive(CucumberWorld, Default)]
pub struct StockroomWorld {
    pub app: Option<App>,
    pub transport: Option<Arc<ScriptedTransport>>,

    // Field groups
    pub uoms: Option<RowGroup<ProductMasterUomDto>>,
    pub texts: Option<AttributeGroup>,
    pub last_change: Option<RowChange>,

    // Cache
    pub reads: Vec<FetchResult>,

    // Forms
    pub product_form: Option<FormController<ProductMasterDraft>>,
    pub vendor_form: Option<FormController<VendorDraft>>,
    pub outcomes: Vec<SubmitOutcome>,
}

impl fmt::Debug for StockroomWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StockroomWorld")
            .field("started", &self.app.is_some())
            .field("uoms", &self.uoms.as_ref().map(RowGroup::len))
            .field("texts", &self.texts.as_ref().map(RowGroup::len))
            .field("last_change", &self.last_change)
            .field("reads", &self.reads.len())
            .field("outcomes", &self.outcomes)
            .finish()
    }
}

impl StockroomWorld {
    /// Start an app against an in-memory backend and sign in
    pub async fn start(&mut self) {
        let backend = MemoryBackend::new()
            .with_credentials(CLIENT_ID, CLIENT_SECRET)
            .with_collection(
                "/product-types",
                vec![json!({"name": "Finished goods"}), json!({"name": "Raw material"})],
            )
            .with_collection("/product-master-forms", Vec::new())
            .with_collection(
                "/vendor-forms",
                vec![json!({
                    "vendorCode": "V-1",
                    "vendorName": "Acme Supplies",
                    "taxInformationDto": [
                        {"id": 11, "taxType": "GST", "taxNumber": "T-1", "taxPercentage": 18.0},
                        {"id": 12, "taxType": "CESS", "taxNumber": "T-2", "taxPercentage": 1.0},
                        {"id": 13, "taxType": "TDS", "taxNumber": "T-3", "taxPercentage": 2.0}
                    ],
                    "bankDetailDto": [
                        {"id": 21, "bankName": "First", "accountNumber": "001"},
                        {"id": 22, "bankName": "Second", "accountNumber": "002"}
                    ]
                })],
            );
        let transport = Arc::new(ScriptedTransport::new(backend));
        let app = App::new(
            transport.clone(),
            Arc::new(MemoryClientStore::new()),
            CoordinatorConfig::default(),
            FormSettings::default(),
        )
        .await
        .expect("Failed to build app");

        let event = app
            .dispatch(AppCommand::SignIn(Credentials::new(CLIENT_ID, CLIENT_SECRET)))
            .await;
        assert_eq!(event, AppEvent::SignedIn, "Sign-in failed");

        self.transport = Some(transport);
        self.app = Some(app);
    }

    pub fn app(&self) -> &App {
        self.app.as_ref().expect("App not started")
    }

    pub fn coordinator(&self) -> &CacheCoordinator {
        self.app().coordinator()
    }

    pub fn transport(&self) -> &ScriptedTransport {
        self.transport.as_ref().expect("App not started")
    }

    pub fn product_form(&mut self) -> FormController<ProductMasterDraft> {
        let app = self.app.as_ref().expect("App not started");
        self.product_form.get_or_insert_with(|| app.product_master_form()).clone()
    }

    pub fn vendor_form(&mut self) -> FormController<VendorDraft> {
        let app = self.app.as_ref().expect("App not started");
        self.vendor_form.get_or_insert_with(|| app.vendor_form()).clone()
    }

    pub fn uoms(&mut self) -> &mut RowGroup<ProductMasterUomDto> {
        self.uoms.as_mut().expect("No UOM group")
    }

    pub fn texts(&mut self) -> &mut AttributeGroup {
        self.texts.as_mut().expect("No text attribute group")
    }

    pub fn last_outcome(&self) -> &SubmitOutcome {
        self.outcomes.last().expect("Nothing submitted")
    }
}
