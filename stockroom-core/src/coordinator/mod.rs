//! Server-state cache coordinator
//!
//! Every backend resource sits behind one read path and three write paths:
//!
//! - [`CacheCoordinator::read`] serves fresh cached data, otherwise joins the
//!   single in-flight fetch for the key (starting one if needed). Transient
//!   failures are retried with exponential backoff.
//! - [`CacheCoordinator::create`], [`update`](CacheCoordinator::update) and
//!   [`delete`](CacheCoordinator::delete) run on a spawned task, so dropping
//!   the caller never cancels a write. On success every key of the resource
//!   and its dependents is invalidated; on failure the cache is untouched.
//!
//! Every request carries the session's bearer token. A 401 clears the
//! session and broadcasts [`SessionEvent::SignInRequired`].
//!
//! [`SessionEvent::SignInRequired`]: crate::session::SessionEvent::SignInRequired

mod resources;
mod subscription;

pub use resources::{Operation, Resource};
pub use subscription::Subscription;

use crate::cache::store::SharedFetch;
use crate::cache::{FetchResult, QueryCache, QueryKey, Scope};
use crate::config::{CacheConfig, ClientConfig};
use crate::session::Session;
use crate::transport::{ApiError, ApiRequest, Transport};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::time::{sleep, timeout, Duration};

/// Coordinator tuning
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    /// How long a fetched value is served without refetching
    pub stale_after: Duration,
    /// Extra attempts for transient read failures
    pub read_retries: u32,
    /// Extra attempts for transient update/delete failures (never for creates)
    pub write_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub backoff_base: Duration,
    /// Upper bound on one request
    pub request_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(300),
            read_retries: 1,
            write_retries: 1,
            backoff_base: Duration::from_millis(200),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl CoordinatorConfig {
    pub fn from_config(cache: &CacheConfig, client: &ClientConfig) -> Self {
        Self {
            stale_after: Duration::from_secs(cache.stale_after_secs),
            read_retries: cache.read_retries,
            write_retries: cache.write_retries,
            backoff_base: Duration::from_millis(cache.backoff_base_ms),
            request_timeout: Duration::from_secs(client.timeout_secs),
        }
    }

    /// Backoff before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * (1u32 << attempt.saturating_sub(1).min(5))
    }
}

/// How a request may be retried
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    retries: u32,
    retry_timeouts: bool,
}

/// Cache coordinator handle (cheap to clone, shares one cache)
#[derive(Clone)]
pub struct CacheCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    session: Session,
    cache: Mutex<QueryCache>,
    config: CoordinatorConfig,
}

impl CacheCoordinator {
    pub fn new(transport: Arc<dyn Transport>, session: Session, config: CoordinatorConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                session,
                cache: Mutex::new(QueryCache::new()),
                config,
            }),
        }
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    fn cache(&self) -> MutexGuard<'_, QueryCache> {
        self.inner.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last fetched value for `key`, fresh or stale, without fetching
    pub fn peek(&self, key: &QueryKey) -> Option<Arc<Value>> {
        self.cache().peek(key)
    }

    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.cache().is_fresh(key)
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.cache().is_fetching(key)
    }

    pub fn cached_keys(&self) -> Vec<QueryKey> {
        self.cache().keys()
    }

    fn ensure_supported(&self, resource: Resource, operation: Operation) -> Result<(), ApiError> {
        if resource.supports(operation) {
            Ok(())
        } else {
            Err(ApiError::Unsupported { resource, operation })
        }
    }

    fn ensure_readable(&self, key: &QueryKey) -> Result<(), ApiError> {
        let operation = match key.scope {
            Scope::Id(_) => Operation::Get,
            Scope::All | Scope::Filter { .. } => Operation::List,
        };
        self.ensure_supported(key.resource, operation)
    }

    /// Read `key`, sharing any fetch already in flight for it
    pub async fn read(&self, key: QueryKey) -> FetchResult {
        self.ensure_readable(&key)?;

        let fetch = {
            let mut cache = self.cache();
            let slot = cache.slot_mut(&key);
            if let Some(value) = slot.fresh_value() {
                log::trace!("Cache hit for {}", key);
                return Ok(value);
            }
            match &slot.in_flight {
                Some(fetch) => {
                    log::trace!("Joining in-flight fetch for {}", key);
                    fetch.clone()
                }
                None => {
                    let fetch = self.start_fetch(key.clone(), slot.generation);
                    slot.in_flight = Some(fetch.clone());
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Read `key` and decode it
    pub async fn read_as<T: DeserializeOwned>(&self, key: QueryKey) -> Result<T, ApiError> {
        let value = self.read(key.clone()).await?;
        T::deserialize(value.as_ref())
            .map_err(|e| ApiError::Decode(format!("Failed to decode {}: {}", key, e)))
    }

    /// Keep a live view of `key`, refreshed after every invalidation
    pub fn subscribe(&self, key: QueryKey) -> Result<Subscription, ApiError> {
        self.ensure_readable(&key)?;
        let receiver = self.cache().slot_mut(&key).watch.subscribe();
        if !self.is_fresh(&key) {
            self.spawn_refetch(vec![key.clone()]);
        }
        Ok(Subscription::new(key, receiver, self.clone()))
    }

    fn start_fetch(&self, key: QueryKey, generation: u64) -> SharedFetch {
        // Weak so an abandoned fetch parked in the cache does not keep the
        // coordinator alive
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        async move {
            let Some(inner) = inner.upgrade() else {
                return Err(ApiError::Transport("Coordinator shut down".to_string()));
            };
            let this = CacheCoordinator { inner };

            log::debug!("Fetching {}", key);
            let policy =
                RetryPolicy { retries: this.inner.config.read_retries, retry_timeouts: true };
            let result = this.send(read_request(&key), policy).await.map(Arc::new);

            let stale_after = this.inner.config.stale_after;
            if !this.cache().settle(&key, generation, &result, stale_after) {
                log::debug!("Result for {} not cached: invalidated during fetch", key);
            }
            result
        }
        .boxed()
        .shared()
    }

    /// Create an entity; creates are never retried
    pub async fn create(&self, resource: Resource, payload: Value) -> Result<Value, ApiError> {
        self.ensure_supported(resource, Operation::Create)?;
        let policy = RetryPolicy { retries: 0, retry_timeouts: false };
        self.mutate(resource, ApiRequest::post(resource.path(), payload), policy).await
    }

    pub async fn update(
        &self,
        resource: Resource,
        id: &str,
        payload: Value,
    ) -> Result<Value, ApiError> {
        self.ensure_supported(resource, Operation::Update)?;
        let policy = RetryPolicy { retries: self.inner.config.write_retries, retry_timeouts: false };
        self.mutate(resource, ApiRequest::put(resource.item_path(id), payload), policy).await
    }

    pub async fn delete(&self, resource: Resource, id: &str) -> Result<Value, ApiError> {
        self.ensure_supported(resource, Operation::Delete)?;
        let policy = RetryPolicy { retries: self.inner.config.write_retries, retry_timeouts: false };
        self.mutate(resource, ApiRequest::delete(resource.item_path(id)), policy).await
    }

    /// Serialize `payload` and create it
    pub async fn create_as<T: Serialize>(
        &self,
        resource: Resource,
        payload: &T,
    ) -> Result<Value, ApiError> {
        let payload = encode(payload)?;
        self.create(resource, payload).await
    }

    pub async fn update_as<T: Serialize>(
        &self,
        resource: Resource,
        id: &str,
        payload: &T,
    ) -> Result<Value, ApiError> {
        let payload = encode(payload)?;
        self.update(resource, id, payload).await
    }

    async fn mutate(
        &self,
        resource: Resource,
        request: ApiRequest,
        policy: RetryPolicy,
    ) -> Result<Value, ApiError> {
        let this = self.clone();
        let write = tokio::spawn(async move {
            let (method, path) = (request.method, request.path.clone());
            let result = this.send(request, policy).await;
            match &result {
                Ok(_) => {
                    log::info!("{} {} succeeded", method, path);
                    this.invalidate(resource);
                }
                Err(e) => log::warn!("{} {} failed: {}", method, path, e),
            }
            result
        });

        write.await.map_err(|e| ApiError::Transport(format!("Write task failed: {}", e)))?
    }

    /// Mark every key of `resource` and its dependents stale and refetch
    /// the ones with live subscribers
    pub fn invalidate(&self, resource: Resource) {
        let resources = resource.invalidation_set();
        let refetch = self.cache().invalidate(&resources);
        log::debug!("Invalidated {:?}; refetching {} subscribed keys", resources, refetch.len());
        self.spawn_refetch(refetch);
    }

    /// Drop all cached data
    pub fn clear(&self) {
        self.cache().clear();
        log::debug!("Cache cleared");
    }

    fn spawn_refetch(&self, keys: Vec<QueryKey>) {
        if keys.is_empty() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            log::debug!("No runtime available; {} keys refetch on next read", keys.len());
            return;
        };
        for key in keys {
            let this = self.clone();
            handle.spawn(async move {
                if let Err(e) = this.read(key.clone()).await {
                    log::warn!("Background refetch of {} failed: {}", key, e);
                }
            });
        }
    }

    async fn send(&self, request: ApiRequest, policy: RetryPolicy) -> Result<Value, ApiError> {
        let mut attempt = 0;
        loop {
            match self.send_once(request.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let retryable = e.is_transient()
                        && (policy.retry_timeouts || !matches!(e, ApiError::Timeout(_)));
                    if !retryable || attempt >= policy.retries {
                        return Err(e);
                    }
                    attempt += 1;
                    let backoff = self.inner.config.backoff(attempt);
                    log::warn!(
                        "{} {} failed: {} (retry {} of {} in {:?})",
                        request.method,
                        request.path,
                        e,
                        attempt,
                        policy.retries,
                        backoff
                    );
                    sleep(backoff).await;
                }
            }
        }
    }

    async fn send_once(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let token = self.inner.session.token().await.ok_or(ApiError::SignedOut)?;
        let request = request.with_bearer(token.clone());

        let limit = self.inner.config.request_timeout;
        let response = match timeout(limit, self.inner.transport.execute(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(ApiError::Timeout(limit)),
        };

        if response.status == 401 {
            // Concurrent rejections of the same token expire the session once
            if self.inner.session.token().await.as_deref() == Some(token.as_str()) {
                self.inner.session.expire().await;
            }
            return Err(ApiError::Unauthorized);
        }
        if !response.is_success() {
            return Err(ApiError::from_response(response.status, &response.body));
        }
        Ok(response.body)
    }
}

fn read_request(key: &QueryKey) -> ApiRequest {
    match &key.scope {
        Scope::All => ApiRequest::get(key.resource.path()),
        Scope::Id(id) => ApiRequest::get(key.resource.item_path(id)),
        Scope::Filter { param, value } => {
            ApiRequest::get(key.resource.path()).with_query(param.clone(), value.clone())
        }
    }
}

fn encode<T: Serialize>(payload: &T) -> Result<Value, ApiError> {
    serde_json::to_value(payload)
        .map_err(|e| ApiError::Decode(format!("Failed to encode payload: {}", e)))
}

#[cfg(test)]
mod tests;
