use anyhow::ensure;
use serde_json::{json, Value};
use stockroom_core::cache::QueryKey;
use stockroom_core::coordinator::Resource;
use stockroom_core::App;

pub async fn list(app: &App, resource: Resource, dimension: Option<i64>) -> anyhow::Result<Value> {
    let key = match dimension {
        Some(dimension) => {
            ensure!(resource == Resource::Uom, "--dimension only applies to uoms");
            QueryKey::uoms_by_dimension(dimension)
        }
        None => QueryKey::list(resource),
    };
    let value = app.coordinator().read(key).await?;
    Ok(Value::clone(&value))
}

pub async fn get(app: &App, resource: Resource, id: &str) -> anyhow::Result<Value> {
    let value = app.coordinator().read(QueryKey::by_id(resource, id)).await?;
    Ok(Value::clone(&value))
}

pub async fn delete(app: &App, resource: Resource, id: &str) -> anyhow::Result<Value> {
    app.coordinator().delete(resource, id).await?;
    Ok(json!({ "deleted": id, "resource": resource.to_string() }))
}
