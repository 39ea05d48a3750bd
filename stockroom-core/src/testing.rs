//! In-memory backend and scriptable transport for tests
//!
//! [`MemoryBackend`] answers the REST surface the coordinator uses
//! (collections under `/<resource>`, items under `/<resource>/<id>`, the
//! credential exchange) from in-process maps. [`ScriptedTransport`] puts it
//! behind the [`Transport`] trait and lets a test inject failures, slow
//! responses and inspect every request that went out.

use crate::session::SIGN_IN_PATH;
use crate::transport::{ApiError, ApiRequest, ApiResponse, Method, Transport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct BackendState {
    collections: BTreeMap<String, BTreeMap<i64, Value>>,
    next_id: i64,
    credentials: Option<(String, String)>,
    tokens: HashSet<String>,
    issued: u64,
}

/// REST backend over in-memory collections
///
/// Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<BackendState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require bearer tokens issued by `POST /auth/token` for these credentials
    ///
    /// Without credentials any request is accepted.
    pub fn with_credentials(self, client_id: &str, secret: &str) -> Self {
        lock(&self.state).credentials = Some((client_id.to_string(), secret.to_string()));
        self
    }

    /// Seed a collection; entries without an `id` get one
    pub fn with_collection(self, path: &str, items: Vec<Value>) -> Self {
        for item in items {
            self.insert(path, item);
        }
        self
    }

    /// Accept `token` as if it had been issued by the credential exchange
    pub fn issue_token(&self, token: &str) {
        lock(&self.state).tokens.insert(token.to_string());
    }

    /// Reject every token issued so far
    pub fn revoke_tokens(&self) {
        lock(&self.state).tokens.clear();
    }

    /// Store `item` in `path`, assigning an id when missing
    pub fn insert(&self, path: &str, mut item: Value) -> Value {
        let mut state = lock(&self.state);
        let id = match item.get("id").and_then(Value::as_i64) {
            Some(id) => {
                state.next_id = state.next_id.max(id);
                id
            }
            None => {
                state.next_id += 1;
                state.next_id
            }
        };
        if let Some(object) = item.as_object_mut() {
            object.insert("id".to_string(), json!(id));
        }
        state.collections.entry(path.to_string()).or_default().insert(id, item.clone());
        item
    }

    /// Current contents of a collection, ordered by id
    pub fn items(&self, path: &str) -> Vec<Value> {
        lock(&self.state)
            .collections
            .get(path)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn item(&self, path: &str, id: i64) -> Option<Value> {
        lock(&self.state).collections.get(path)?.get(&id).cloned()
    }

    /// Answer one request
    pub fn handle(&self, request: &ApiRequest) -> ApiResponse {
        if request.path == SIGN_IN_PATH && request.method == Method::Post {
            return self.sign_in(request.body.as_ref().unwrap_or(&Value::Null));
        }
        if !self.authorized(request.bearer.as_deref()) {
            return ApiResponse::new(401, json!({"message": "Unauthorized"}));
        }

        let (collection, id) = split_path(&request.path);
        let id = match id.map(str::parse::<i64>) {
            Some(Ok(id)) => Some(id),
            Some(Err(_)) => return not_found(),
            None => None,
        };

        let mut state = lock(&self.state);
        match (request.method, id) {
            (Method::Get, None) => {
                let items = state.collections.get(&collection);
                let listed: Vec<Value> = items
                    .map(|items| {
                        items.values().filter(|item| matches_query(item, &request.query)).cloned().collect()
                    })
                    .unwrap_or_default();
                ApiResponse::ok(Value::Array(listed))
            }
            (Method::Get, Some(id)) => {
                match state.collections.get(&collection).and_then(|items| items.get(&id)) {
                    Some(item) => ApiResponse::ok(item.clone()),
                    None => not_found(),
                }
            }
            (Method::Post, None) => {
                drop(state);
                let created = self.insert(&collection, request.body.clone().unwrap_or(json!({})));
                ApiResponse::new(201, created)
            }
            (Method::Put, Some(id)) => {
                let Some(items) = state.collections.get_mut(&collection) else {
                    return not_found();
                };
                if !items.contains_key(&id) {
                    return not_found();
                }
                let mut item = request.body.clone().unwrap_or(json!({}));
                if let Some(object) = item.as_object_mut() {
                    object.insert("id".to_string(), json!(id));
                }
                items.insert(id, item.clone());
                ApiResponse::ok(item)
            }
            (Method::Delete, Some(id)) => {
                match state.collections.get_mut(&collection).and_then(|items| items.remove(&id)) {
                    Some(_) => ApiResponse::new(204, Value::Null),
                    None => not_found(),
                }
            }
            _ => ApiResponse::new(405, json!({"message": "Method not allowed"})),
        }
    }

    fn sign_in(&self, body: &Value) -> ApiResponse {
        let mut state = lock(&self.state);
        let client_id = body.get("client_id").and_then(Value::as_str);
        let secret = body.get("secret").and_then(Value::as_str);
        let accepted = match &state.credentials {
            Some((id, s)) => client_id == Some(id.as_str()) && secret == Some(s.as_str()),
            None => true,
        };
        if !accepted {
            return ApiResponse::new(401, json!({"message": "Invalid credentials"}));
        }
        state.issued += 1;
        let token = format!("token-{}", state.issued);
        state.tokens.insert(token.clone());
        ApiResponse::ok(json!({ "token": token }))
    }

    fn authorized(&self, bearer: Option<&str>) -> bool {
        let state = lock(&self.state);
        if state.credentials.is_none() {
            return true;
        }
        bearer.is_some_and(|token| state.tokens.contains(token))
    }
}

fn split_path(path: &str) -> (String, Option<&str>) {
    let trimmed = path.trim_start_matches('/');
    match trimmed.split_once('/') {
        Some((collection, id)) => (format!("/{}", collection), Some(id)),
        None => (format!("/{}", trimmed), None),
    }
}

fn matches_query(item: &Value, query: &[(String, String)]) -> bool {
    query.iter().all(|(param, expected)| match item.get(param) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == *expected,
    })
}

fn not_found() -> ApiResponse {
    ApiResponse::new(404, json!({"message": "Not found"}))
}

enum Outcome {
    Respond(ApiResponse),
    Fail(ApiError),
}

struct Scripted {
    method: Method,
    path: String,
    outcome: Outcome,
}

/// [`Transport`] over a [`MemoryBackend`] with injectable outcomes
pub struct ScriptedTransport {
    backend: MemoryBackend,
    script: Mutex<VecDeque<Scripted>>,
    delay: Mutex<Duration>,
    log: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(backend: MemoryBackend) -> Self {
        Self {
            backend,
            script: Mutex::new(VecDeque::new()),
            delay: Mutex::new(Duration::ZERO),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn backend(&self) -> &MemoryBackend {
        &self.backend
    }

    /// Answer the next `method path` request with `status` and `body`
    pub fn respond_next(&self, method: Method, path: &str, status: u16, body: Value) {
        lock(&self.script).push_back(Scripted {
            method,
            path: path.to_string(),
            outcome: Outcome::Respond(ApiResponse::new(status, body)),
        });
    }

    /// Fail the next `method path` request without a response
    pub fn fail_next(&self, method: Method, path: &str, error: ApiError) {
        lock(&self.script).push_back(Scripted {
            method,
            path: path.to_string(),
            outcome: Outcome::Fail(error),
        });
    }

    /// Hold every request for `delay` before answering
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = delay;
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.log).clone()
    }

    /// Requests whose path, with or without query string, equals `path`
    pub fn count(&self, method: Method, path: &str) -> usize {
        lock(&self.log)
            .iter()
            .filter(|r| r.method == method && (r.path == path || r.path_and_query() == path))
            .count()
    }

    pub fn last_bearer(&self) -> Option<String> {
        lock(&self.log).last().and_then(|r| r.bearer.clone())
    }

    fn scripted(&self, request: &ApiRequest) -> Option<Outcome> {
        let mut script = lock(&self.script);
        let index = script.iter().position(|s| {
            s.method == request.method
                && (s.path == request.path || s.path == request.path_and_query())
        })?;
        script.remove(index).map(|s| s.outcome)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        lock(&self.log).push(request.clone());

        let delay = *lock(&self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.scripted(&request) {
            Some(Outcome::Respond(response)) => Ok(response),
            Some(Outcome::Fail(error)) => Err(error),
            None => Ok(self.backend.handle(&request)),
        }
    }
}
