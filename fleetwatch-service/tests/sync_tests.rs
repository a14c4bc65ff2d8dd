use fleetwatch_remote::SessionClient;
use fleetwatch_service::{ServiceError, SyncEngine};
use fleetwatch_store::{AgentFilter, AgentStore};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/security/user/authenticate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "token": "tok" } })),
        )
        .mount(server)
        .await;
}

fn engine(server: &MockServer, store: &AgentStore) -> SyncEngine {
    let client = SessionClient::new(&server.uri(), "fleet-reader", "hunter2");
    SyncEngine::new(client, store.clone())
}

fn items_body(items: serde_json::Value) -> serde_json::Value {
    json!({ "data": { "items": items } })
}

#[tokio::test]
async fn first_sync_creates_row_second_records_delta() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items_body(json!([
            { "id": "001", "name": "srv1", "status": "active", "lastKeepAlive": 1_700_000_000_000u64 }
        ]))))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items_body(json!([
            { "id": "001", "name": "srv1", "status": "disconnected", "lastKeepAlive": 1_700_000_000_000u64 }
        ]))))
        .mount(&server)
        .await;

    let store = AgentStore::open_in_memory().unwrap();
    let mut engine = engine(&server, &store);

    assert_eq!(engine.sync_once().await.unwrap(), 1);
    let record = store.get("001").unwrap().unwrap();
    assert_eq!(record.status, "active");
    assert_eq!(record.changes, json!({}));
    assert_eq!(
        record.last_connect.map(|t| t.timestamp()),
        Some(1_700_000_000)
    );

    assert_eq!(engine.sync_once().await.unwrap(), 1);
    let record = store.get("001").unwrap().unwrap();
    assert_eq!(record.status, "disconnected");
    assert_eq!(
        record.changes,
        json!({ "status": { "old": "active", "new": "disconnected" } })
    );
}

#[tokio::test]
async fn zero_heartbeat_maps_to_never_connected() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items_body(json!([
            { "id": "002", "name": "fresh", "status": "never_connected", "lastKeepAlive": 0 }
        ]))))
        .mount(&server)
        .await;

    let store = AgentStore::open_in_memory().unwrap();
    let mut engine = engine(&server, &store);
    engine.sync_once().await.unwrap();

    let record = store.get("002").unwrap().unwrap();
    assert_eq!(record.last_connect, None);
}

#[tokio::test]
async fn fetch_failure_fails_pass_and_leaves_store_untouched() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = AgentStore::open_in_memory().unwrap();
    let mut engine = engine(&server, &store);

    let err = engine.sync_once().await.unwrap_err();
    assert!(matches!(err, ServiceError::Remote(_)));

    let (_, total) = store
        .list(&AgentFilter {
            page: 1,
            per_page: 20,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn unauthorized_once_then_success_completes_pass() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items_body(json!([
            { "id": "001", "name": "srv1", "status": "active", "lastKeepAlive": 1_700_000_000_000u64 }
        ]))))
        .mount(&server)
        .await;

    let store = AgentStore::open_in_memory().unwrap();
    let mut engine = engine(&server, &store);
    assert_eq!(engine.sync_once().await.unwrap(), 1);
    assert!(store.get("001").unwrap().is_some());
}

#[tokio::test]
async fn unauthorized_twice_fails_pass_and_leaves_store_untouched() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let store = AgentStore::open_in_memory().unwrap();
    let mut engine = engine(&server, &store);
    assert!(engine.sync_once().await.is_err());
    assert!(store.get("001").unwrap().is_none());
}

#[tokio::test]
async fn store_failure_is_skipped_and_recovered_on_next_pass() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items_body(json!([
            { "id": "001", "name": "srv1", "status": "active", "lastKeepAlive": 1_700_000_000_000u64 },
            { "id": "002", "name": "srv2", "status": "active", "lastKeepAlive": 1_700_000_000_000u64 }
        ]))))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("agents.db");
    let store = AgentStore::open(&db_path).unwrap();
    let mut engine = engine(&server, &store);

    // A second connection holding an exclusive lock makes every upsert
    // fail while the pass itself keeps going.
    let blocker = rusqlite::Connection::open(&db_path).unwrap();
    blocker.execute_batch("BEGIN EXCLUSIVE").unwrap();

    assert_eq!(engine.sync_once().await.unwrap(), 0);

    blocker.execute_batch("COMMIT").unwrap();
    drop(blocker);

    assert_eq!(engine.sync_once().await.unwrap(), 2);
    assert!(store.get("001").unwrap().is_some());
    assert!(store.get("002").unwrap().is_some());
}

#[tokio::test]
async fn undecodable_item_is_skipped_without_failing_pass() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items_body(json!([
            { "id": "001", "name": "srv1", "status": "active", "lastKeepAlive": 1_700_000_000_000u64 },
            { "id": "002", "name": "broken", "status": "active", "lastKeepAlive": "garbage" }
        ]))))
        .mount(&server)
        .await;

    let store = AgentStore::open_in_memory().unwrap();
    let mut engine = engine(&server, &store);
    assert_eq!(engine.sync_once().await.unwrap(), 1);
    assert!(store.get("001").unwrap().is_some());
    assert!(store.get("002").unwrap().is_none());
}
