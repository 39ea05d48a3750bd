//! Subcommands. Each one returns the JSON value printed on success.

mod prefs;
mod resources;
mod session;

use clap::Subcommand;
use serde_json::Value;
use stockroom_core::app::AppEvent;
use stockroom_core::coordinator::Resource;
use stockroom_core::session::{Credentials, Density, Theme};
use stockroom_core::App;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Exchange client credentials for a bearer token
    SignIn {
        client_id: String,

        #[arg(long, env = "STOCKROOM_CLIENT_SECRET", hide_env_values = true)]
        secret: String,
    },
    /// Forget the stored bearer token
    SignOut,
    /// List a resource (e.g. languages, uoms, product-master)
    List {
        resource: Resource,

        /// Only UOMs of this dimension
        #[arg(long)]
        dimension: Option<i64>,
    },
    /// Fetch one entity
    Get { resource: Resource, id: String },
    /// Delete one entity
    Delete { resource: Resource, id: String },
    /// Show or change display preferences
    Prefs {
        #[arg(long)]
        theme: Option<Theme>,

        #[arg(long)]
        density: Option<Density>,
    },
}

pub async fn run(app: &App, command: Command) -> anyhow::Result<Value> {
    match command {
        Command::SignIn { client_id, secret } => {
            session::sign_in(app, Credentials::new(client_id, secret)).await
        }
        Command::SignOut => session::sign_out(app).await,
        Command::List { resource, dimension } => resources::list(app, resource, dimension).await,
        Command::Get { resource, id } => resources::get(app, resource, &id).await,
        Command::Delete { resource, id } => resources::delete(app, resource, &id).await,
        Command::Prefs { theme, density } => prefs::run(app, theme, density).await,
    }
}

/// Turn a failed command into an error
fn succeeded(event: AppEvent) -> anyhow::Result<AppEvent> {
    match event {
        AppEvent::Failed(message) => Err(anyhow::anyhow!(message)),
        event => Ok(event),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use stockroom_core::coordinator::CoordinatorConfig;
    use stockroom_core::forms::FormSettings;
    use stockroom_core::session::MemoryClientStore;
    use stockroom_core::testing::{MemoryBackend, ScriptedTransport};

    async fn app() -> App {
        let backend = MemoryBackend::new()
            .with_credentials("web", "s3cret")
            .with_collection("/languages", vec![json!({"name": "English", "code": "en"})])
            .with_collection(
                "/uoms",
                vec![
                    json!({"name": "kg", "uomDimensionId": 1}),
                    json!({"name": "m", "uomDimensionId": 2}),
                    json!({"name": "cm", "uomDimensionId": 2}),
                ],
            );
        App::new(
            Arc::new(ScriptedTransport::new(backend)),
            Arc::new(MemoryClientStore::new()),
            CoordinatorConfig::default(),
            FormSettings::default(),
        )
        .await
        .unwrap()
    }

    async fn signed_in() -> App {
        let app = app().await;
        let sign_in = Command::SignIn { client_id: "web".into(), secret: "s3cret".into() };
        run(&app, sign_in).await.unwrap();
        app
    }

    #[tokio::test]
    async fn test_list_requires_sign_in() {
        let app = app().await;
        let err = run(&app, Command::List { resource: Resource::Language, dimension: None })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Not signed in"));
    }

    #[tokio::test]
    async fn test_wrong_secret_is_reported() {
        let app = app().await;
        let sign_in = Command::SignIn { client_id: "web".into(), secret: "nope".into() };
        assert!(run(&app, sign_in).await.is_err());
        assert!(!app.session().is_signed_in().await);
    }

    #[tokio::test]
    async fn test_list_uoms_by_dimension() {
        let app = signed_in().await;

        let output = run(&app, Command::List { resource: Resource::Uom, dimension: Some(2) })
            .await
            .unwrap();

        let names: Vec<_> = output.as_array().unwrap().iter().map(|u| u["name"].clone()).collect();
        assert_eq!(names, vec![json!("m"), json!("cm")]);
    }

    #[tokio::test]
    async fn test_dimension_only_applies_to_uoms() {
        let app = signed_in().await;
        let list = Command::List { resource: Resource::Language, dimension: Some(2) };
        assert!(run(&app, list).await.is_err());
    }

    #[tokio::test]
    async fn test_unsupported_get_is_rejected() {
        let app = signed_in().await;
        let get = Command::Get { resource: Resource::Language, id: "1".into() };
        let err = run(&app, get).await.unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[tokio::test]
    async fn test_prefs_are_saved_and_shown() {
        let app = app().await;
        let output = run(&app, Command::Prefs { theme: None, density: Some(Density::Compact) })
            .await
            .unwrap();
        assert_eq!(output, json!({"theme": "light", "density": "compact"}));

        let output = run(&app, Command::Prefs { theme: None, density: None }).await.unwrap();
        assert_eq!(output["density"], "compact");
    }
}
