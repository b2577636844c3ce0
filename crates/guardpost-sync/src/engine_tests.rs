//! Tests for request interception.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::cache::{CacheVersions, MemoryCache};
use crate::network::NetworkError;
use crate::queue::EntryStatus;
use crate::test_support::{ScriptedNetwork, TempQueue};

const GUARDS: &str = "/api/v1/guards";
const ATTENDANCE: &str = "/api/v1/attendance";

mock! {
    Cache {}
    #[async_trait]
    impl ResponseCache for Cache {
        async fn get(&self, cache: &str, key: &str) -> Result<Option<SyncResponse>, SyncError>;
        async fn put(&self, cache: &str, key: &str, response: SyncResponse) -> Result<(), SyncError>;
        async fn cache_names(&self) -> Result<Vec<String>, SyncError>;
        async fn delete(&self, cache: &str) -> Result<bool, SyncError>;
    }
}

struct Rig {
    network: Arc<ScriptedNetwork>,
    cache: Arc<MemoryCache>,
    queue: TempQueue,
    engine: SyncEngine<ScriptedNetwork, MemoryCache>,
}

impl Rig {
    async fn cached(&self, namespace: CacheNamespace, path: &str) -> Option<SyncResponse> {
        self.cache
            .get(&CacheVersions::default().cache_name(namespace), path)
            .await
            .expect("cache read")
    }
}

fn config() -> SyncConfig {
    SyncConfig::builder("https://ops.example.test")
        .build()
        .expect("valid config")
}

#[fixture]
fn rig() -> Rig {
    let network = Arc::new(ScriptedNetwork::new());
    let cache = Arc::new(MemoryCache::new());
    let queue = TempQueue::new().expect("temp queue");
    let engine = SyncEngine::new(
        config(),
        Arc::clone(&network),
        Arc::clone(&cache),
        Arc::clone(&queue.queue),
    );
    Rig {
        network,
        cache,
        queue,
        engine,
    }
}

fn check_in() -> SyncRequest {
    SyncRequest::post_json(ATTENDANCE, json!({"type": "check-in"}))
}

#[rstest]
#[tokio::test]
async fn static_shell_is_served_from_cache_while_offline(rig: Rig) {
    rig.network
        .respond("/index.html", Ok(SyncResponse::new(200, "<html>")));

    let first = rig
        .engine
        .handle(SyncRequest::get("/index.html"))
        .await
        .expect("fetched");
    rig.network.set_offline(true);
    let second = rig
        .engine
        .handle(SyncRequest::get("/index.html"))
        .await
        .expect("cached");
    rig.engine.settle().await;

    assert_eq!(first.body, second.body);
    assert_eq!(rig.network.sent_to("/index.html"), 1);
}

#[rstest]
#[tokio::test]
async fn deployed_shell_reaches_the_load_after_next(rig: Rig) {
    rig.network
        .respond("/index.html", Ok(SyncResponse::new(200, "<html>v1")))
        .respond("/index.html", Ok(SyncResponse::new(200, "<html>v2")));

    rig.engine
        .handle(SyncRequest::get("/index.html"))
        .await
        .expect("first load fetches");
    let second = rig
        .engine
        .handle(SyncRequest::get("/index.html"))
        .await
        .expect("second load");
    assert_eq!(second.body, b"<html>v1".to_vec());

    rig.engine.settle().await;
    let third = rig
        .engine
        .handle(SyncRequest::get("/index.html"))
        .await
        .expect("third load");
    rig.engine.settle().await;

    assert_eq!(third.body, b"<html>v2".to_vec());
    assert_eq!(
        rig.cached(CacheNamespace::Static, "/index.html")
            .await
            .expect("shell cached")
            .body,
        b"<html>v2".to_vec()
    );
}

#[rstest]
#[tokio::test]
async fn unreachable_image_yields_placeholder(rig: Rig) {
    rig.network.set_offline(true);
    let response = rig
        .engine
        .handle(SyncRequest::get("/avatars/guard.png"))
        .await
        .expect("placeholder served");
    assert_eq!(response, SyncResponse::placeholder());
}

#[rstest]
#[tokio::test]
async fn offline_read_returns_last_cached_payload(rig: Rig) {
    rig.network
        .respond_json(GUARDS, 200, &json!([{"id": 1, "name": "Mira"}]));
    rig.engine
        .handle(SyncRequest::get(GUARDS))
        .await
        .expect("online read");

    rig.network.set_offline(true);
    let offline = rig
        .engine
        .handle(SyncRequest::get(GUARDS))
        .await
        .expect("served from cache");
    rig.engine.settle().await;

    let payload: serde_json::Value = serde_json::from_slice(&offline.body).expect("json body");
    assert_eq!(payload, json!([{"id": 1, "name": "Mira"}]));
}

#[rstest]
#[tokio::test]
async fn online_read_returns_stale_copy_and_refreshes_in_background(rig: Rig) {
    rig.network
        .respond_json(GUARDS, 200, &json!(["stale"]))
        .respond_json(GUARDS, 200, &json!(["fresh"]));
    rig.engine
        .handle(SyncRequest::get(GUARDS))
        .await
        .expect("first read populates");

    let served = rig
        .engine
        .handle(SyncRequest::get(GUARDS))
        .await
        .expect("second read");
    assert_eq!(served.body, json!(["stale"]).to_string().into_bytes());

    rig.engine.settle().await;
    let refreshed = rig
        .cached(CacheNamespace::Api, GUARDS)
        .await
        .expect("cache populated");
    assert_eq!(refreshed.body, json!(["fresh"]).to_string().into_bytes());
    assert_eq!(rig.network.sent_to(GUARDS), 2);
}

#[rstest]
#[tokio::test]
async fn uncached_read_while_offline_fails(rig: Rig) {
    rig.network.set_offline(true);
    let error = rig
        .engine
        .handle(SyncRequest::get(GUARDS))
        .await
        .expect_err("nothing to serve");
    assert!(error.is_transient());
}

#[rstest]
#[tokio::test]
async fn offline_check_in_is_queued(rig: Rig) {
    rig.network.set_offline(true);
    let response = rig.engine.handle(check_in()).await.expect("queued");
    assert_eq!(response.status, QUEUED_STATUS);

    let entries = rig
        .queue
        .queue
        .entries(ResourceKind::Attendance)
        .expect("read queue");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, EntryStatus::Pending);
    assert_eq!(entries[0].request, check_in());
}

#[rstest]
#[case::timeout(Err(NetworkError::timeout("30s elapsed")))]
#[case::storage_down(Ok(SyncResponse::new(503, "storage unavailable")))]
#[tokio::test]
async fn transient_failures_are_queued(
    rig: Rig,
    #[case] reply: Result<SyncResponse, NetworkError>,
) {
    rig.network.respond(ATTENDANCE, reply);
    let response = rig.engine.handle(check_in()).await.expect("queued");
    assert_eq!(response.status, QUEUED_STATUS);
    assert_eq!(
        rig.queue
            .queue
            .entries(ResourceKind::Attendance)
            .expect("read queue")
            .len(),
        1
    );
}

#[rstest]
#[tokio::test]
async fn validation_failures_are_returned_not_queued(rig: Rig) {
    rig.network
        .respond_json(ATTENDANCE, 400, &json!({"code": "invalid_request"}));
    let response = rig.engine.handle(check_in()).await.expect("response");
    assert_eq!(response.status, 400);
    assert!(rig.queue.queue.snapshot().expect("snapshot").is_empty());
}

#[rstest]
#[tokio::test]
async fn mutations_of_other_resources_are_not_queued(rig: Rig) {
    rig.network.set_offline(true);
    let mut request = SyncRequest::get("/api/v1/guards/7");
    request.method = crate::request::Method::Delete;
    let error = rig
        .engine
        .handle(request)
        .await
        .expect_err("network failure surfaces");
    assert!(matches!(error, SyncError::Network(_)));
    assert!(rig.queue.queue.snapshot().expect("snapshot").is_empty());
}

#[rstest]
#[tokio::test]
async fn mutations_are_never_cached(rig: Rig) {
    rig.network
        .respond_json(ATTENDANCE, 200, &json!({"status": "present"}));
    rig.engine.handle(check_in()).await.expect("sent");
    assert!(rig.cache.cache_names().await.expect("names").is_empty());
}

#[tokio::test]
async fn failed_cache_write_does_not_fail_the_response() {
    let mut cache = MockCache::new();
    cache.expect_get().returning(|_, _| Ok(None));
    cache
        .expect_put()
        .times(1)
        .returning(|_, _, _| Err(SyncError::cache("quota exceeded")));
    let network = Arc::new(ScriptedNetwork::new());
    network.respond_json(GUARDS, 200, &json!(["a"]));
    let queue = TempQueue::new().expect("temp queue");
    let engine = SyncEngine::new(config(), network, Arc::new(cache), Arc::clone(&queue.queue));

    let response = engine
        .handle(SyncRequest::get(GUARDS))
        .await
        .expect("response survives the cache failure");
    assert!(response.is_success());
}

#[rstest]
#[tokio::test]
async fn activation_drops_old_versions(rig: Rig) {
    rig.cache
        .put("guardpost-api-v0", GUARDS, SyncResponse::new(200, "old"))
        .await
        .expect("seed old cache");
    let removed = rig.engine.activate().await.expect("activation");
    assert_eq!(removed, vec!["guardpost-api-v0".to_owned()]);
}
