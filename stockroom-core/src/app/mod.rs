//! Application state and command dispatch
//!
//! [`App`] owns the process-wide pieces (transport, session, coordinator,
//! notifications, preferences). Everything a front end asks of it is an
//! [`AppCommand`] handled by one explicit async function; the reply is an
//! [`AppEvent`]. Side effects such as persisting preferences or clearing the
//! cache after a session change happen in those handlers, not in middleware.
//!
//! [`App::spawn`] moves the app onto a worker task fed by a command queue.

mod worker;

pub use worker::AppHandle;

use crate::cache::QueryKey;
use crate::config::StockroomConfig;
use crate::coordinator::{CacheCoordinator, CoordinatorConfig, Resource};
use crate::forms::{FormController, FormSettings, ProductMasterDraft, VendorDraft};
use crate::logging::{LogLevel, LoggingConfig};
use crate::notify::NotificationCenter;
use crate::session::{
    ClientStore, Credentials, Density, FileClientStore, Preferences, Session, SessionEvent,
    Theme,
};
use crate::transport::{ApiError, HttpTransport, Transport};
use anyhow::Context;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Something the user or a view asked for
#[derive(Debug, Clone)]
pub enum AppCommand {
    SignIn(Credentials),
    SignOut,
    /// Warm the cache for a key
    Prefetch(QueryKey),
    Invalidate(Resource),
    SetTheme(Theme),
    SetDensity(Density),
    Dismiss(Uuid),
}

/// Result of one command
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    SignedIn,
    SignedOut,
    Prefetched(QueryKey),
    Invalidated(Resource),
    PreferencesChanged(Preferences),
    Dismissed { id: Uuid, found: bool },
    Failed(String),
}

/// Process-wide application state
pub struct App {
    transport: Arc<dyn Transport>,
    session: Session,
    coordinator: CacheCoordinator,
    notifications: NotificationCenter,
    preferences: Arc<Mutex<Preferences>>,
    forms: FormSettings,
    session_listener: JoinHandle<()>,
}

impl App {
    /// Build the app from configuration: reqwest transport, file-backed store
    pub async fn from_config(config: &StockroomConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.client.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        let transport = Arc::new(HttpTransport::with_client(client, &config.client.base_url));
        let store = FileClientStore::open(&config.client.store_path)
            .with_context(|| format!("Failed to open client store {}", config.client.store_path))?;

        Self::new(
            transport,
            Arc::new(store),
            CoordinatorConfig::from_config(&config.cache, &config.client),
            FormSettings::from_config(&config.forms),
        )
        .await
    }

    pub async fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn ClientStore>,
        coordinator_config: CoordinatorConfig,
        forms: FormSettings,
    ) -> anyhow::Result<Self> {
        let preferences = Preferences::load(store.as_ref()).await?;
        let session = Session::new(store).with_request_timeout(coordinator_config.request_timeout);
        let coordinator =
            CacheCoordinator::new(Arc::clone(&transport), session.clone(), coordinator_config);
        let notifications = NotificationCenter::new();
        let session_listener = watch_session(&session, &coordinator, &notifications);

        Ok(Self {
            transport,
            session,
            coordinator,
            notifications,
            preferences: Arc::new(Mutex::new(preferences)),
            forms,
            session_listener,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn coordinator(&self) -> &CacheCoordinator {
        &self.coordinator
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn preferences(&self) -> Preferences {
        *self.lock_preferences()
    }

    fn lock_preferences(&self) -> MutexGuard<'_, Preferences> {
        self.preferences.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Logger settings matching a config file's `[logging]` section
    pub fn logging_config(config: &StockroomConfig, verbose: bool) -> LoggingConfig {
        let logging = LoggingConfig::from_section(&config.logging);
        if verbose {
            logging.with_level(LogLevel::Debug)
        } else {
            logging
        }
    }

    pub fn product_master_form(&self) -> FormController<ProductMasterDraft> {
        FormController::new(
            self.coordinator.clone(),
            self.notifications.clone(),
            self.forms.clone(),
        )
    }

    pub fn vendor_form(&self) -> FormController<VendorDraft> {
        FormController::new(
            self.coordinator.clone(),
            self.notifications.clone(),
            self.forms.clone(),
        )
    }

    /// Handle one command
    pub async fn dispatch(&self, command: AppCommand) -> AppEvent {
        log::debug!("Dispatching {:?}", command);
        match command {
            AppCommand::SignIn(credentials) => self.sign_in(credentials).await,
            AppCommand::SignOut => self.sign_out().await,
            AppCommand::Prefetch(key) => self.prefetch(key).await,
            AppCommand::Invalidate(resource) => {
                self.coordinator.invalidate(resource);
                AppEvent::Invalidated(resource)
            }
            AppCommand::SetTheme(theme) => self.update_preferences(|p| p.theme = theme).await,
            AppCommand::SetDensity(density) => {
                self.update_preferences(|p| p.density = density).await
            }
            AppCommand::Dismiss(id) => {
                AppEvent::Dismissed { id, found: self.notifications.dismiss(id) }
            }
        }
    }

    async fn sign_in(&self, credentials: Credentials) -> AppEvent {
        match self.session.sign_in(self.transport.as_ref(), &credentials).await {
            Ok(()) => {
                self.coordinator.clear();
                self.notifications.success("Signed in");
                AppEvent::SignedIn
            }
            Err(ApiError::Unauthorized) => {
                let message = "Invalid client id or secret";
                self.notifications.error(message);
                AppEvent::Failed(message.to_string())
            }
            Err(err) => {
                self.notifications.error(err.user_message());
                AppEvent::Failed(err.to_string())
            }
        }
    }

    async fn sign_out(&self) -> AppEvent {
        if let Err(e) = self.session.sign_out().await {
            log::error!("Sign-out failed: {:#}", e);
            return AppEvent::Failed(format!("{:#}", e));
        }
        self.coordinator.clear();
        self.notifications.info("Signed out");
        AppEvent::SignedOut
    }

    async fn prefetch(&self, key: QueryKey) -> AppEvent {
        match self.coordinator.read(key.clone()).await {
            Ok(_) => AppEvent::Prefetched(key),
            Err(err) => AppEvent::Failed(err.to_string()),
        }
    }

    async fn update_preferences(&self, change: impl FnOnce(&mut Preferences)) -> AppEvent {
        let updated = {
            let mut preferences = self.lock_preferences();
            change(&mut preferences);
            *preferences
        };
        match updated.save(self.session.store().as_ref()).await {
            Ok(()) => {
                log::info!("Preferences saved: theme={} density={}", updated.theme, updated.density);
                AppEvent::PreferencesChanged(updated)
            }
            Err(e) => {
                log::error!("Failed to save preferences: {:#}", e);
                AppEvent::Failed(format!("{:#}", e))
            }
        }
    }

    /// Run the app on a worker task fed by a command queue
    pub fn spawn(self) -> AppHandle {
        AppHandle::spawn(self)
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.session_listener.abort();
    }
}

/// Clear cached data and tell the user when the backend rejects the session
fn watch_session(
    session: &Session,
    coordinator: &CacheCoordinator,
    notifications: &NotificationCenter,
) -> JoinHandle<()> {
    let mut events = session.subscribe();
    let coordinator = coordinator.clone();
    let notifications = notifications.clone();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::SignInRequired) => {
                    coordinator.clear();
                    notifications.error(ApiError::Unauthorized.user_message());
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Session listener skipped {} events", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
