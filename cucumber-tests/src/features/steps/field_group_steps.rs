use crate::features::world::StockroomWorld;
use cucumber::{given, then, when};
use stockroom_core::fields::{attribute_group, AttributeKind, RowGroup};
use stockroom_core::model::ProductMasterUomDto;

// ==================== REPEATABLE ROWS ====================

#[given(regex = r"^a UOM group with (\d+) rows? and capacity (\d+)$")]
async fn given_uom_group(world: &mut StockroomWorld, rows: usize, capacity: usize) {
    let mut group = RowGroup::with_max_rows(ProductMasterUomDto::default(), capacity);
    while group.len() < rows {
        group.add_row(group.len() - 1);
    }
    world.uoms = Some(group);
}

#[when("I delete the first UOM row")]
async fn when_delete_first_uom(world: &mut StockroomWorld) {
    let group = world.uoms();
    let first = group.rows()[0].id;
    let change = group.delete_row(first);
    world.last_change = Some(change);
}

#[when("I add a UOM row at the end")]
async fn when_add_uom(world: &mut StockroomWorld) {
    let group = world.uoms();
    let change = group.add_row(group.len() - 1);
    world.last_change = Some(change);
}

#[then(regex = r"^the UOM group has (\d+) rows?$")]
async fn then_uom_count(world: &mut StockroomWorld, rows: usize) {
    assert_eq!(world.uoms().len(), rows);
}

#[then(expr = "the change is reported as {word}")]
async fn then_change_reported(world: &mut StockroomWorld, expected: String) {
    let change = world.last_change.expect("No change recorded");
    assert_eq!(format!("{:?}", change), expected);
}

// ==================== TYPED ATTRIBUTES ====================

#[given(regex = r"^a text attribute group with (\d+) attributes?$")]
async fn given_text_group(world: &mut StockroomWorld, count: usize) {
    let mut group = attribute_group(AttributeKind::Text);
    while group.len() < count {
        group.add_row(group.len() - 1);
    }
    world.texts = Some(group);
}

#[when(expr = "I delete text attribute {int}")]
async fn when_delete_text(world: &mut StockroomWorld, position: usize) {
    let group = world.texts();
    let id = group.rows()[position - 1].id;
    let change = group.delete_row(id);
    world.last_change = Some(change);
}

#[when(expr = "I add a text attribute after attribute {int}")]
async fn when_add_text(world: &mut StockroomWorld, position: usize) {
    let change = world.texts().add_row(position - 1);
    world.last_change = Some(change);
}

#[then(expr = "the text attributes are named {string}")]
async fn then_text_names(world: &mut StockroomWorld, expected: String) {
    let names: Vec<_> = world.texts().fields().map(|a| a.name.clone()).collect();
    assert_eq!(names.join(", "), expected);
}

#[then(expr = "the text attributes are labelled {string}")]
async fn then_text_labels(world: &mut StockroomWorld, expected: String) {
    let labels: Vec<_> = world.texts().fields().map(|a| a.label.clone()).collect();
    assert_eq!(labels.join(", "), expected);
}
