//! Session management for Stockroom
//!
//! The session is process-wide: one bearer token, held in a durable
//! [`ClientStore`], written only by the sign-in flow and by the coordinator's
//! 401 handler. Every change is broadcast as a [`SessionEvent`] so the
//! application can route the user back to sign-in.
//!
//! # Example
//!
//! ```rust,ignore
//! use stockroom_core::session::{Credentials, FileClientStore, Session};
//!
//! let store = FileClientStore::open("./.stockroom/session.json")?;
//! let session = Session::new(std::sync::Arc::new(store));
//! session.sign_in(&transport, &Credentials::new("client", "secret")).await?;
//! ```

mod file;
mod memory;
mod preferences;
mod store;

pub use file::FileClientStore;
pub use memory::MemoryClientStore;
pub use preferences::{Density, Preferences, Theme};
pub use store::ClientStore;

use crate::transport::{ApiError, ApiRequest, Transport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Store key of the bearer token
pub const TOKEN_KEY: &str = "session.token";

/// Credential-exchange endpoint
pub const SIGN_IN_PATH: &str = "/auth/token";

/// Default limit on the credential exchange
pub const DEFAULT_SIGN_IN_TIMEOUT: Duration = Duration::from_secs(30);

/// Client credentials exchanged for a bearer token
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub client_id: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self { client_id: client_id.into(), secret: secret.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("secret", &"***")
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// Why the user was signed out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    /// Explicit sign-out
    UserRequested,
    /// The backend rejected the credential (401)
    Expired,
}

/// Session change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut(SignOutReason),
    /// The user must be routed to the sign-in entry point
    SignInRequired,
}

/// Process-wide session handle
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn ClientStore>,
    events: broadcast::Sender<SessionEvent>,
    request_timeout: Duration,
}

impl Session {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self { store, events, request_timeout: DEFAULT_SIGN_IN_TIMEOUT }
    }

    /// Limit how long the credential exchange may take
    pub fn with_request_timeout(mut self, limit: Duration) -> Self {
        self.request_timeout = limit;
        self
    }

    pub fn store(&self) -> &Arc<dyn ClientStore> {
        &self.store
    }

    /// Listen for session changes
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Current bearer token, if signed in
    ///
    /// A store that cannot be read counts as signed out.
    pub async fn token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                log::warn!("Failed to read session token: {:#}", e);
                None
            }
        }
    }

    pub async fn is_signed_in(&self) -> bool {
        self.token().await.is_some()
    }

    /// Store a token obtained elsewhere
    pub async fn set_token(&self, token: &str) -> anyhow::Result<()> {
        self.store.set(TOKEN_KEY, token).await?;
        let _ = self.events.send(SessionEvent::SignedIn);
        Ok(())
    }

    /// Exchange client credentials for a bearer token and store it
    pub async fn sign_in(
        &self,
        transport: &dyn Transport,
        credentials: &Credentials,
    ) -> Result<(), ApiError> {
        let body = serde_json::to_value(credentials)
            .map_err(|e| ApiError::Decode(format!("Failed to encode credentials: {}", e)))?;
        let limit = self.request_timeout;
        let response =
            tokio::time::timeout(limit, transport.execute(ApiRequest::post(SIGN_IN_PATH, body)))
                .await
                .map_err(|_| {
                    log::warn!("Sign-in for client {} timed out", credentials.client_id);
                    ApiError::Timeout(limit)
                })??;

        if response.status == 401 {
            log::warn!("Sign-in rejected for client {}", credentials.client_id);
            return Err(ApiError::Unauthorized);
        }
        if !response.is_success() {
            return Err(ApiError::from_response(response.status, &response.body));
        }

        let TokenResponse { token } = serde_json::from_value(response.body)
            .map_err(|e| ApiError::Decode(format!("Failed to parse token response: {}", e)))?;

        self.set_token(&token)
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to persist session: {:#}", e)))?;
        log::info!("Signed in as client {}", credentials.client_id);
        Ok(())
    }

    /// Explicit sign-out
    pub async fn sign_out(&self) -> anyhow::Result<()> {
        self.store.remove(TOKEN_KEY).await?;
        let _ = self.events.send(SessionEvent::SignedOut(SignOutReason::UserRequested));
        log::info!("Signed out");
        Ok(())
    }

    /// Clear a credential the backend rejected and request a new sign-in
    pub async fn expire(&self) {
        if let Err(e) = self.store.remove(TOKEN_KEY).await {
            log::error!("Failed to clear expired session token: {:#}", e);
        }
        let _ = self.events.send(SessionEvent::SignedOut(SignOutReason::Expired));
        let _ = self.events.send(SessionEvent::SignInRequired);
        log::warn!("Session expired, sign-in required");
    }
}
