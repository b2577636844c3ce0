//! Test utilities for the sync crate.
//!
//! A scripted [`Network`] and a temporary queue directory, shared by unit
//! tests (in `src/`) and integration tests (in `tests/`). Only compiled for
//! tests or with the `test-support` feature.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use camino::Utf8PathBuf;
use mockable::DefaultClock;
use tempfile::TempDir;

use crate::error::SyncError;
use crate::network::{Network, NetworkError};
use crate::queue::DurableQueue;
use crate::request::{SyncRequest, SyncResponse};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Network double answering from per-path scripts.
///
/// Each path has a FIFO of replies; the last reply of a script repeats.
/// Paths without a script answer 404. While offline every request fails
/// with a transport error and nothing is consumed from the scripts.
#[derive(Default)]
pub struct ScriptedNetwork {
    scripts: Mutex<HashMap<String, VecDeque<Result<SyncResponse, NetworkError>>>>,
    sent: Mutex<Vec<SyncRequest>>,
    offline: AtomicBool,
}

impl ScriptedNetwork {
    /// Create a network with no scripts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next reply for `path` (query included).
    pub fn respond(&self, path: &str, reply: Result<SyncResponse, NetworkError>) -> &Self {
        lock(&self.scripts)
            .entry(path.to_owned())
            .or_default()
            .push_back(reply);
        self
    }

    /// Script a successful JSON reply for `path`.
    pub fn respond_json(&self, path: &str, status: u16, body: &serde_json::Value) -> &Self {
        self.respond(
            path,
            Ok(SyncResponse::new(status, body.to_string())
                .with_header("content-type", "application/json")),
        )
    }

    /// Toggle connectivity.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Requests that reached the network while online.
    pub fn sent(&self) -> Vec<SyncRequest> {
        lock(&self.sent).clone()
    }

    /// Number of requests sent to `path`.
    pub fn sent_to(&self, path: &str) -> usize {
        lock(&self.sent)
            .iter()
            .filter(|request| request.path == path)
            .count()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn send(&self, request: &SyncRequest) -> Result<SyncResponse, NetworkError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::transport("offline"));
        }
        lock(&self.sent).push(request.clone());
        let mut scripts = lock(&self.scripts);
        let Some(script) = scripts.get_mut(&request.path) else {
            return Ok(SyncResponse::new(404, Vec::new()));
        };
        if script.len() > 1 {
            script
                .pop_front()
                .unwrap_or_else(|| Ok(SyncResponse::new(404, Vec::new())))
        } else {
            script
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(SyncResponse::new(404, Vec::new())))
        }
    }
}

/// A durable queue rooted in a temporary directory removed on drop.
pub struct TempQueue {
    /// Keeps the directory alive.
    pub temp: TempDir,
    /// Queue directory.
    pub path: Utf8PathBuf,
    /// The queue.
    pub queue: Arc<DurableQueue>,
}

impl TempQueue {
    /// Create a queue in a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Storage`] when the directory cannot be created.
    pub fn new() -> Result<Self, SyncError> {
        let storage = |message: String| SyncError::Storage {
            path: Utf8PathBuf::from("queue"),
            message,
        };
        let temp = tempfile::tempdir().map_err(|error| storage(error.to_string()))?;
        let path = Utf8PathBuf::from_path_buf(temp.path().join("queue"))
            .map_err(|path| storage(format!("non UTF-8 path {}", path.display())))?;
        let queue = Arc::new(DurableQueue::open_ambient(&path, Arc::new(DefaultClock))?);
        Ok(Self { temp, path, queue })
    }

    /// Open a second handle on the same directory, as a restarted process
    /// would.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Storage`] when the directory cannot be opened.
    pub fn reopen(&self) -> Result<DurableQueue, SyncError> {
        DurableQueue::open_ambient(&self.path, Arc::new(DefaultClock))
    }
}
