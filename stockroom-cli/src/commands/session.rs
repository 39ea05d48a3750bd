use super::succeeded;
use serde_json::{json, Value};
use stockroom_core::app::AppCommand;
use stockroom_core::session::Credentials;
use stockroom_core::App;

pub async fn sign_in(app: &App, credentials: Credentials) -> anyhow::Result<Value> {
    let client_id = credentials.client_id.clone();
    succeeded(app.dispatch(AppCommand::SignIn(credentials)).await)?;
    Ok(json!({ "signedIn": true, "clientId": client_id }))
}

pub async fn sign_out(app: &App) -> anyhow::Result<Value> {
    succeeded(app.dispatch(AppCommand::SignOut).await)?;
    Ok(json!({ "signedIn": false }))
}
