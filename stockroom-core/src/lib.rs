//! Stockroom - Core
//!
//! Client-side state synchronization for inventory and master-data back
//! offices: product masters, product types/groups/categories, vendors with
//! tax and bank sub-records, and the lookup lists they reference.
//!
//! # Overview
//!
//! Three cooperating pieces sit between the user's edits and the REST
//! backend:
//!
//! - [`fields`] - repeatable field groups (UOM lines, tax rows, bank rows)
//!   and typed dynamic attributes with dense positional naming
//! - [`coordinator`] - cached, retried, single-flight reads and invalidating
//!   writes per resource, with bearer-credential handling
//! - [`forms`] - drafts, DTO assembly and hydration, and the guarded submit
//!   lifecycle
//!
//! Supporting modules:
//!
//! - [`transport`] - the HTTP collaborator (reqwest) behind a trait
//! - [`session`] - durable client store, credential exchange, preferences
//! - [`cache`] - cache entries and query keys
//! - [`notify`] - dismissible user notifications
//! - [`app`] - typed command dispatcher owning the application state
//! - [`config`] - TOML + environment configuration
//! - [`logging`] - `log` facade backend with human/JSON/logfmt output
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use stockroom_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StockroomConfig::load()?;
//!     let app = App::from_config(&config).await?;
//!
//!     let languages: Vec<Language> =
//!         app.coordinator().read_as(QueryKey::list(Resource::Language)).await?;
//!     println!("{} languages", languages.len());
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod cache;
pub mod config; // Configuration system with TOML support
pub mod coordinator;
pub mod fields;
pub mod forms;
pub mod logging;
pub mod model; // Wire DTOs of the backend entities
pub mod notify;
pub mod session;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub mod prelude;

pub use app::App;
pub use coordinator::CacheCoordinator;
pub use forms::FormController;
pub use transport::ApiError;

/// Main result type for the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Stockroom
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Network, server or authorization failure
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Client-side validation failure
    #[error(transparent)]
    Validation(#[from] forms::ValidationErrors),
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Config(format!("{:#}", err))
    }
}
