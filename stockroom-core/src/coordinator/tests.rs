use super::*;
use crate::session::{MemoryClientStore, SessionEvent, SignOutReason};
use crate::testing::{MemoryBackend, ScriptedTransport};
use crate::transport::Method;
use serde_json::json;

const TOKEN: &str = "tok";

async fn setup_with(config: CoordinatorConfig) -> (CacheCoordinator, Arc<ScriptedTransport>) {
    let backend = MemoryBackend::new()
        .with_credentials("web", "s3cret")
        .with_collection("/languages", vec![json!({"name": "English", "code": "en"})])
        .with_collection("/product-types", vec![json!({"name": "Finished goods"})])
        .with_collection(
            "/uoms",
            vec![
                json!({"name": "kg", "uomDimensionId": 1}),
                json!({"name": "m", "uomDimensionId": 2}),
            ],
        );
    backend.issue_token(TOKEN);

    let transport = Arc::new(ScriptedTransport::new(backend));
    let session = Session::new(Arc::new(MemoryClientStore::new()));
    session.set_token(TOKEN).await.unwrap();

    let coordinator = CacheCoordinator::new(transport.clone(), session, config);
    (coordinator, transport)
}

async fn setup() -> (CacheCoordinator, Arc<ScriptedTransport>) {
    setup_with(CoordinatorConfig::default()).await
}

#[tokio::test]
async fn test_fresh_reads_are_served_from_cache() {
    let (coordinator, transport) = setup().await;
    let key = QueryKey::list(Resource::Language);

    let first = coordinator.read(key.clone()).await.unwrap();
    let second = coordinator.read(key.clone()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(transport.count(Method::Get, "/languages"), 1);
    assert_eq!(transport.last_bearer().as_deref(), Some(TOKEN));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_reads_share_one_fetch() {
    let (coordinator, transport) = setup().await;
    transport.set_delay(Duration::from_millis(100));
    let key = QueryKey::list(Resource::Language);

    let (a, b, c) = tokio::join!(
        coordinator.read(key.clone()),
        coordinator.read(key.clone()),
        coordinator.read(key.clone())
    );

    assert_eq!(a.unwrap(), b.clone().unwrap());
    assert!(c.is_ok());
    assert_eq!(transport.count(Method::Get, "/languages"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_entry_is_refetched() {
    let (coordinator, transport) = setup().await;
    let key = QueryKey::list(Resource::Language);

    coordinator.read(key.clone()).await.unwrap();
    tokio::time::advance(Duration::from_secs(301)).await;
    assert!(!coordinator.is_fresh(&key));

    coordinator.read(key.clone()).await.unwrap();
    assert_eq!(transport.count(Method::Get, "/languages"), 2);
}

#[tokio::test]
async fn test_filtered_keys_are_cached_separately() {
    let (coordinator, transport) = setup().await;

    let kg: Vec<Value> = coordinator.read_as(QueryKey::uoms_by_dimension(1)).await.unwrap();
    let m: Vec<Value> = coordinator.read_as(QueryKey::uoms_by_dimension(2)).await.unwrap();

    assert_eq!(kg[0]["name"], "kg");
    assert_eq!(m[0]["name"], "m");
    assert_eq!(transport.count(Method::Get, "/uoms"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_transient_read_failure_is_retried_once() {
    let (coordinator, transport) = setup().await;
    transport.respond_next(Method::Get, "/languages", 503, json!({"message": "busy"}));

    let value = coordinator.read(QueryKey::list(Resource::Language)).await.unwrap();

    assert_eq!(value[0]["code"], "en");
    assert_eq!(transport.count(Method::Get, "/languages"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_read_gives_up_after_retries() {
    let (coordinator, transport) = setup().await;
    transport.fail_next(Method::Get, "/languages", ApiError::Transport("reset".into()));
    transport.fail_next(Method::Get, "/languages", ApiError::Transport("reset".into()));

    let err = coordinator.read(QueryKey::list(Resource::Language)).await.unwrap_err();

    assert_eq!(err, ApiError::Transport("reset".into()));
    assert_eq!(transport.count(Method::Get, "/languages"), 2);
    assert!(coordinator.peek(&QueryKey::list(Resource::Language)).is_none());
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let (coordinator, transport) = setup().await;
    transport.respond_next(Method::Get, "/languages", 400, json!({"message": "bad filter"}));

    let err = coordinator.read(QueryKey::list(Resource::Language)).await.unwrap_err();

    assert_eq!(err, ApiError::Server { status: 400, message: "bad filter".into() });
    assert_eq!(transport.count(Method::Get, "/languages"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_request_timeout() {
    let config = CoordinatorConfig {
        request_timeout: Duration::from_secs(5),
        read_retries: 0,
        ..CoordinatorConfig::default()
    };
    let (coordinator, transport) = setup_with(config).await;
    transport.set_delay(Duration::from_secs(10));

    let err = coordinator.read(QueryKey::list(Resource::Language)).await.unwrap_err();

    assert_eq!(err, ApiError::Timeout(Duration::from_secs(5)));
}

#[test]
fn test_backoff_doubles_and_caps() {
    let config = CoordinatorConfig::default();
    assert_eq!(config.backoff(1), Duration::from_millis(200));
    assert_eq!(config.backoff(2), Duration::from_millis(400));
    assert_eq!(config.backoff(6), Duration::from_millis(6400));
    assert_eq!(config.backoff(20), Duration::from_millis(6400));
}

#[tokio::test]
async fn test_successful_write_invalidates_resource_only() {
    let (coordinator, transport) = setup().await;
    let types = QueryKey::list(Resource::ProductType);
    let languages = QueryKey::list(Resource::Language);
    coordinator.read(types.clone()).await.unwrap();
    coordinator.read(languages.clone()).await.unwrap();

    coordinator.create(Resource::ProductType, json!({"name": "Spare parts"})).await.unwrap();

    assert!(!coordinator.is_fresh(&types));
    assert!(coordinator.is_fresh(&languages));

    let refreshed = coordinator.read(types).await.unwrap();
    assert_eq!(refreshed.as_array().unwrap().len(), 2);
    assert_eq!(transport.count(Method::Get, "/product-types"), 2);
}

#[tokio::test]
async fn test_classification_write_invalidates_product_masters() {
    let (coordinator, _transport) = setup().await;
    let masters = QueryKey::list(Resource::ProductMaster);
    coordinator.read(masters.clone()).await.unwrap();

    coordinator.create(Resource::ProductGroup, json!({"name": "Bolts"})).await.unwrap();

    assert!(!coordinator.is_fresh(&masters));
}

#[tokio::test]
async fn test_failed_write_leaves_cache_untouched() {
    let (coordinator, transport) = setup().await;
    let types = QueryKey::list(Resource::ProductType);
    coordinator.read(types.clone()).await.unwrap();
    transport.respond_next(Method::Post, "/product-types", 409, json!({"message": "Duplicate"}));

    let err = coordinator.create(Resource::ProductType, json!({"name": "Dup"})).await.unwrap_err();

    assert_eq!(err.user_message(), "Duplicate");
    assert!(coordinator.is_fresh(&types));
}

#[tokio::test(start_paused = true)]
async fn test_create_is_never_retried() {
    let (coordinator, transport) = setup().await;
    transport.respond_next(Method::Post, "/product-types", 503, json!({}));

    let err = coordinator.create(Resource::ProductType, json!({"name": "X"})).await.unwrap_err();

    assert!(err.is_transient());
    assert_eq!(transport.count(Method::Post, "/product-types"), 1);
    assert_eq!(transport.backend().items("/product-types").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_update_retries_transient_failure() {
    let (coordinator, transport) = setup().await;
    let id = transport.backend().items("/product-types")[0]["id"].as_i64().unwrap();
    let path = format!("/product-types/{}", id);
    transport.respond_next(Method::Put, &path, 502, json!({}));

    coordinator
        .update(Resource::ProductType, &id.to_string(), json!({"name": "Renamed"}))
        .await
        .unwrap();

    assert_eq!(transport.count(Method::Put, &path), 2);
    assert_eq!(transport.backend().item("/product-types", id).unwrap()["name"], "Renamed");
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_write_still_completes() {
    let (coordinator, transport) = setup().await;
    let types = QueryKey::list(Resource::ProductType);
    coordinator.read(types.clone()).await.unwrap();
    transport.set_delay(Duration::from_millis(100));

    let caller = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            coordinator.create(Resource::ProductType, json!({"name": "Late"})).await
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    caller.abort();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(transport.backend().items("/product-types").len(), 2);
    assert!(!coordinator.is_fresh(&types));
}

#[tokio::test(start_paused = true)]
async fn test_fetch_started_before_invalidation_is_not_cached() {
    let (coordinator, transport) = setup().await;
    transport.set_delay(Duration::from_millis(100));
    let key = QueryKey::list(Resource::ProductType);

    let read = {
        let coordinator = coordinator.clone();
        let key = key.clone();
        tokio::spawn(async move { coordinator.read(key).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    coordinator.invalidate(Resource::ProductType);

    assert!(read.await.unwrap().is_ok());
    assert!(!coordinator.is_fresh(&key));
    assert!(coordinator.peek(&key).is_none());
}

#[tokio::test]
async fn test_unsupported_operation_makes_no_request() {
    let (coordinator, transport) = setup().await;

    let err = coordinator.create(Resource::Language, json!({"name": "French"})).await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Unsupported { resource: Resource::Language, operation: Operation::Create }
    );
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_missing_token_fails_without_request() {
    let (coordinator, transport) = setup().await;
    coordinator.session().sign_out().await.unwrap();

    let err = coordinator.read(QueryKey::list(Resource::Language)).await.unwrap_err();

    assert_eq!(err, ApiError::SignedOut);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_rejected_token_expires_session() {
    let (coordinator, transport) = setup().await;
    let mut events = coordinator.session().subscribe();
    transport.backend().revoke_tokens();

    let err = coordinator.read(QueryKey::list(Resource::Language)).await.unwrap_err();

    assert_eq!(err, ApiError::Unauthorized);
    assert!(!coordinator.session().is_signed_in().await);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::SignedOut(SignOutReason::Expired));
    assert_eq!(events.recv().await.unwrap(), SessionEvent::SignInRequired);
    assert_eq!(transport.count(Method::Get, "/languages"), 1);
}

#[tokio::test]
async fn test_subscription_receives_refetch_after_write() {
    let (coordinator, _transport) = setup().await;
    let mut subscription = coordinator.subscribe(QueryKey::list(Resource::ProductType)).unwrap();

    let initial = subscription.changed().await.unwrap();
    assert_eq!(initial.as_array().unwrap().len(), 1);

    coordinator.create(Resource::ProductType, json!({"name": "Packaging"})).await.unwrap();

    let updated = subscription.changed().await.unwrap();
    assert_eq!(updated.as_array().unwrap().len(), 2);
    assert_eq!(subscription.current(), Some(updated));
}

#[tokio::test]
async fn test_unsubscribed_keys_are_not_refetched() {
    let (coordinator, transport) = setup().await;
    let key = QueryKey::list(Resource::ProductType);
    {
        let mut subscription = coordinator.subscribe(key.clone()).unwrap();
        subscription.changed().await.unwrap();
    }

    coordinator.invalidate(Resource::ProductType);
    tokio::task::yield_now().await;

    assert_eq!(transport.count(Method::Get, "/product-types"), 1);
}

#[tokio::test]
async fn test_clear_drops_values() {
    let (coordinator, _transport) = setup().await;
    let key = QueryKey::list(Resource::Language);
    coordinator.read(key.clone()).await.unwrap();

    coordinator.clear();

    assert!(coordinator.peek(&key).is_none());
}
