use super::succeeded;
use serde_json::Value;
use stockroom_core::app::AppCommand;
use stockroom_core::session::{Density, Theme};
use stockroom_core::App;

/// Apply the given changes, then print the resulting preferences
pub async fn run(app: &App, theme: Option<Theme>, density: Option<Density>) -> anyhow::Result<Value> {
    if let Some(theme) = theme {
        succeeded(app.dispatch(AppCommand::SetTheme(theme)).await)?;
    }
    if let Some(density) = density {
        succeeded(app.dispatch(AppCommand::SetDensity(density)).await)?;
    }
    Ok(serde_json::to_value(app.preferences())?)
}
