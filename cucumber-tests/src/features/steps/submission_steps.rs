use crate::features::world::StockroomWorld;
use cucumber::{given, then, when};
use serde_json::json;
use stockroom_core::cache::QueryKey;
use stockroom_core::coordinator::Resource;
use stockroom_core::fields::{AttributeKind, AttributeUpdate, AttributeValue};
use stockroom_core::forms::{DraftPhase, FormMode, SubmitOutcome};
use stockroom_core::model::UomUpdate;
use stockroom_core::notify::Level;
use stockroom_core::transport::Method;

const PRODUCT_MASTERS: &str = "/product-master-forms";

// ==================== PRODUCT MASTER ====================

#[given("an add-mode product master draft with one UOM row and one text attribute")]
async fn given_product_draft(world: &mut StockroomWorld) {
    let form = world.product_form();
    form.edit(|draft| {
        draft.product_code = "P-100".into();
        draft.product_name = "Hex bolt".into();
        let line = draft.uoms.rows()[0].id;
        draft.uoms.update_field(line, UomUpdate::Dimension(Some(1)));
        draft.uoms.update_field(line, UomUpdate::Uom(Some(4)));
        draft.uoms.update_field(line, UomUpdate::ConversionFactor(Some(1.0)));
        draft.uoms.update_field(line, UomUpdate::BaseUom(true));

        let texts = draft.attributes.group_mut(AttributeKind::Text);
        let first = texts.rows()[0].id;
        texts.update_field(first, AttributeUpdate::Value(AttributeValue::Text("steel".into())));
    });
    assert_eq!(form.mode(), FormMode::Add);
}

#[given("the product master list has been read")]
async fn given_product_list_read(world: &mut StockroomWorld) {
    world
        .coordinator()
        .read(QueryKey::list(Resource::ProductMaster))
        .await
        .expect("Failed to read product masters");
}

#[given(expr = "the server will answer the next product master create with status {int}")]
async fn given_create_fails(world: &mut StockroomWorld, status: u16) {
    world.transport().respond_next(
        Method::Post,
        PRODUCT_MASTERS,
        status,
        json!({"message": "Database unavailable"}),
    );
}

#[when("I submit the product master")]
async fn when_submit_product(world: &mut StockroomWorld) {
    let outcome = world.product_form().submit().await;
    world.outcomes.push(outcome);
}

#[when("I submit the product master twice at the same time")]
async fn when_submit_product_twice(world: &mut StockroomWorld) {
    let form = world.product_form();
    let (first, second) = futures::join!(form.submit(), form.submit());
    world.outcomes.extend([first, second]);
}

#[then("the submission is saved")]
async fn then_saved(world: &mut StockroomWorld) {
    assert!(matches!(world.last_outcome(), SubmitOutcome::Saved(_)), "{:?}", world.last_outcome());
}

#[then("the submission fails")]
async fn then_failed(world: &mut StockroomWorld) {
    assert!(matches!(world.last_outcome(), SubmitOutcome::Failed(_)), "{:?}", world.last_outcome());
}

#[then("one submission is saved and the other is reported busy")]
async fn then_one_saved_one_busy(world: &mut StockroomWorld) {
    let saved = world.outcomes.iter().filter(|o| matches!(o, SubmitOutcome::Saved(_))).count();
    let busy = world.outcomes.iter().filter(|o| **o == SubmitOutcome::Busy).count();
    assert_eq!((saved, busy), (1, 1), "{:?}", world.outcomes);
}

#[then(regex = r"^exactly (\d+) product master writes? reached the server$")]
async fn then_write_count(world: &mut StockroomWorld, count: usize) {
    assert_eq!(world.transport().count(Method::Post, PRODUCT_MASTERS), count);
}

#[then("the product master draft is reset to an empty add form")]
async fn then_product_reset(world: &mut StockroomWorld) {
    let form = world.product_form();
    assert_eq!(form.mode(), FormMode::Add);
    assert_eq!(form.phase(), DraftPhase::Empty);
    let draft = form.draft();
    assert!(draft.product_code.is_empty());
    assert_eq!(draft.uoms.len(), 1);
    assert_eq!(draft.attributes.texts.len(), 1);
}

#[then(expr = "the product master draft still has code {string}")]
async fn then_product_kept(world: &mut StockroomWorld, code: String) {
    let form = world.product_form();
    assert_eq!(form.draft().product_code, code);
    assert_eq!(form.phase(), DraftPhase::Editing);
}

#[then("the last error is recorded and the form is not busy")]
async fn then_last_error(world: &mut StockroomWorld) {
    let submission = world.product_form().submission();
    assert!(submission.last_error.is_some());
    assert!(!submission.in_flight);
}

#[then("the product master list is no longer cached as fresh")]
async fn then_product_list_stale(world: &mut StockroomWorld) {
    assert!(!world.coordinator().is_fresh(&QueryKey::list(Resource::ProductMaster)));
}

#[then(expr = "the next product master list read fetches {int} product master(s)")]
async fn then_next_read_fetches(world: &mut StockroomWorld, count: usize) {
    let before = world.transport().count(Method::Get, PRODUCT_MASTERS);
    let list = world
        .coordinator()
        .read(QueryKey::list(Resource::ProductMaster))
        .await
        .expect("Failed to read product masters");
    assert_eq!(world.transport().count(Method::Get, PRODUCT_MASTERS), before + 1);
    assert_eq!(list.as_array().map(Vec::len), Some(count));
}

// ==================== NOTIFICATIONS ====================

#[then(expr = "a success notification reads {string}")]
async fn then_success_notification(world: &mut StockroomWorld, message: String) {
    let active = world.app().notifications().active();
    assert!(
        active.iter().any(|n| n.level == Level::Success && n.message == message),
        "{:?}",
        active
    );
}

#[then(expr = "an error notification reads {string}")]
async fn then_error_notification(world: &mut StockroomWorld, message: String) {
    let active = world.app().notifications().active();
    assert!(
        active.iter().any(|n| n.level == Level::Error && n.message == message),
        "{:?}",
        active
    );
}

// ==================== VENDOR ====================

#[given(expr = "I edit vendor {int}")]
async fn given_edit_vendor(world: &mut StockroomWorld, id: i64) {
    world.vendor_form().load(id).await.expect("Failed to load vendor");
}

#[when(expr = "I delete tax row {int}")]
async fn when_delete_tax_row(world: &mut StockroomWorld, position: usize) {
    let change = world.vendor_form().edit(|draft| {
        let id = draft.taxes.rows()[position - 1].id;
        draft.taxes.delete_row(id)
    });
    world.last_change = Some(change);
}

#[then(expr = "the vendor has {int} tax rows with distinct ids")]
async fn then_tax_rows(world: &mut StockroomWorld, count: usize) {
    let draft = world.vendor_form().draft();
    let mut ids: Vec<_> = draft.taxes.rows().iter().map(|row| row.id).collect();
    assert_eq!(ids.len(), count);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), count);
}

#[then(expr = "the vendor DTO lists tax numbers {string}")]
async fn then_tax_numbers(world: &mut StockroomWorld, expected: String) {
    let dto = world.vendor_form().build_dto();
    let numbers: Vec<_> = dto.tax_information_dto.iter().map(|t| t.tax_number.as_str()).collect();
    assert_eq!(numbers.join(", "), expected);
}

#[then(expr = "the vendor DTO lists {int} bank details")]
async fn then_bank_count(world: &mut StockroomWorld, count: usize) {
    assert_eq!(world.vendor_form().build_dto().bank_detail_dto.len(), count);
}
