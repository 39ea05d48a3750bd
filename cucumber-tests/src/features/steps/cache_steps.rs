use crate::features::world::StockroomWorld;
use cucumber::{given, then, when};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use stockroom_core::cache::QueryKey;
use stockroom_core::coordinator::Resource;
use stockroom_core::transport::Method;

// ==================== BACKGROUND ====================

#[given("a signed-in client backed by an in-memory server")]
async fn given_signed_in_client(world: &mut StockroomWorld) {
    world.start().await;
}

#[given(expr = "the server takes {int} ms to answer")]
async fn given_server_delay(world: &mut StockroomWorld, millis: u64) {
    world.transport().set_delay(Duration::from_millis(millis));
}

// ==================== SINGLE FLIGHT ====================

#[when("two views read the product types at the same time")]
async fn when_two_views_read(world: &mut StockroomWorld) {
    let coordinator = world.coordinator().clone();
    let key = QueryKey::list(Resource::ProductType);
    let (first, second) =
        futures::join!(coordinator.read(key.clone()), coordinator.read(key));
    world.reads = vec![first, second];
}

#[then(regex = r#"^exactly (\d+) GET requests? reached "([^"]+)"$"#)]
async fn then_get_count(world: &mut StockroomWorld, count: usize, path: String) {
    assert_eq!(world.transport().count(Method::Get, &path), count);
}

#[then("both views received the same product types")]
async fn then_same_data(world: &mut StockroomWorld) {
    let [first, second] = world.reads.as_slice() else {
        panic!("Expected two reads, got {}", world.reads.len());
    };
    let first = first.as_ref().expect("First read failed");
    let second = second.as_ref().expect("Second read failed");
    assert!(Arc::ptr_eq(first, second));
    assert_eq!(first.as_array().map(Vec::len), Some(2));
}

// ==================== WRITES ====================

#[given("the product types have been read")]
async fn given_types_read(world: &mut StockroomWorld) {
    world
        .coordinator()
        .read(QueryKey::list(Resource::ProductType))
        .await
        .expect("Failed to read product types");
}

#[when(expr = "I create a product type named {string}")]
async fn when_create_type(world: &mut StockroomWorld, name: String) {
    world
        .coordinator()
        .create(Resource::ProductType, json!({ "name": name }))
        .await
        .expect("Failed to create product type");
}

#[then(expr = "reading the product types includes {string}")]
async fn then_types_include(world: &mut StockroomWorld, name: String) {
    let types = world
        .coordinator()
        .read(QueryKey::list(Resource::ProductType))
        .await
        .expect("Failed to read product types");
    let names = names(&types);
    assert!(names.contains(&name), "{:?} missing from {:?}", name, names);
}

#[then("the product type list is no longer cached as fresh")]
async fn then_types_stale(world: &mut StockroomWorld) {
    assert!(!world.coordinator().is_fresh(&QueryKey::list(Resource::ProductType)));
}

fn names(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(|t| t["name"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}
