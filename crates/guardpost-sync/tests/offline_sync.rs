//! End-to-end behaviour of the engine and coordinator sharing one queue.

use std::sync::Arc;

use guardpost_sync::test_support::{ScriptedNetwork, TempQueue};
use guardpost_sync::{
    EntryStatus, MemoryCache, QUEUED_STATUS, ResourceKind, SyncConfig, SyncCoordinator,
    SyncEngine, SyncRequest, SyncResponse, SyncTrigger,
};
use rstest::{fixture, rstest};
use serde_json::json;

const ATTENDANCE: &str = "/api/v1/attendance";

struct Device {
    network: Arc<ScriptedNetwork>,
    queue: TempQueue,
    engine: SyncEngine<ScriptedNetwork, MemoryCache>,
}

#[fixture]
fn device() -> Device {
    let config = SyncConfig::builder("https://ops.example.test")
        .build()
        .expect("valid config");
    let network = Arc::new(ScriptedNetwork::new());
    let queue = TempQueue::new().expect("temp queue");
    let engine = SyncEngine::new(
        config,
        Arc::clone(&network),
        Arc::new(MemoryCache::new()),
        Arc::clone(&queue.queue),
    );
    Device {
        network,
        queue,
        engine,
    }
}

fn check_in() -> SyncRequest {
    SyncRequest::post_json(
        ATTENDANCE,
        json!({"type": "check-in", "latitude": 12.0, "longitude": 77.0}),
    )
}

#[rstest]
#[tokio::test]
async fn offline_check_in_is_delivered_once_after_restart(device: Device) {
    device.network.set_offline(true);
    let queued = device.engine.handle(check_in()).await.expect("queued");
    assert_eq!(queued.status, QUEUED_STATUS);

    // The app restarts before connectivity returns.
    let restarted = Arc::new(device.queue.reopen().expect("reopen queue"));
    let coordinator = SyncCoordinator::new(Arc::clone(&device.network), restarted);
    device.network.set_offline(false);
    device
        .network
        .respond(ATTENDANCE, Ok(SyncResponse::new(200, r#"{"status":"present"}"#)));

    coordinator.on_trigger(SyncTrigger::ConnectivityRestored).await;
    coordinator.on_trigger(SyncTrigger::Manual).await;

    assert_eq!(device.network.sent_to(ATTENDANCE), 1);
    assert!(coordinator.entries().await.expect("snapshot").is_empty());
}

#[rstest]
#[tokio::test]
async fn rejected_replay_is_shown_as_failed(device: Device) {
    device.network.set_offline(true);
    device.engine.handle(check_in()).await.expect("queued");
    device.network.set_offline(false);
    device.network.respond(
        ATTENDANCE,
        Ok(SyncResponse::new(400, r#"{"details":{"code":"already_checked_in"}}"#)),
    );

    let coordinator = SyncCoordinator::new(
        Arc::clone(&device.network),
        Arc::clone(&device.queue.queue),
    );
    coordinator.on_trigger(SyncTrigger::Manual).await;

    let entries = coordinator.entries().await.expect("snapshot");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, ResourceKind::Attendance);
    assert_eq!(entries[0].status, EntryStatus::Failed);
    assert_eq!(entries[0].attempts, 1);
}
