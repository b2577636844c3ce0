//! Durable per-kind mutation queue.
//!
//! Each [`ResourceKind`] owns one JSON file, `{kind}.queue.json`, inside a
//! capability-scoped directory. Entries keep their append order, which is
//! the order they are replayed in. Every change rewrites the file atomically
//! so the queue survives process restarts and crashes mid-write.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::atomic_io::{storage_error, write_atomic};
use crate::error::SyncError;
use crate::request::SyncRequest;
use crate::resource::ResourceKind;

const QUEUE_FILE_VERSION: u32 = 1;

/// Delivery state of a queued mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Waiting for the next drain.
    Pending,
    /// Accepted by the server; about to be removed.
    Synced,
    /// Rejected by the server; kept for display and never retried.
    Failed,
}

/// A mutation waiting for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueEntry {
    /// Entry identifier.
    pub id: Uuid,
    /// Queue the entry belongs to.
    pub kind: ResourceKind,
    /// The original request, replayed verbatim.
    pub request: SyncRequest,
    /// When the mutation was first attempted.
    pub created_at: DateTime<Utc>,
    /// Delivery state.
    pub status: EntryStatus,
    /// Replays attempted so far.
    pub attempts: u32,
    /// Why the last replay did not succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct QueueFile {
    version: u32,
    entries: Vec<SyncQueueEntry>,
}

/// File-backed queue of mutations, one file per resource kind.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use cap_std::{ambient_authority, fs::Dir};
/// use guardpost_sync::{DurableQueue, EntryStatus, ResourceKind, SyncRequest};
/// use mockable::DefaultClock;
///
/// let temp = std::env::temp_dir().join(format!("guardpost-doc-{}", uuid::Uuid::new_v4()));
/// std::fs::create_dir_all(&temp).expect("create dir");
/// let dir = Dir::open_ambient_dir(&temp, ambient_authority()).expect("open dir");
/// let queue = DurableQueue::new(dir, Arc::new(DefaultClock));
///
/// let request = SyncRequest::post_json("/api/v1/attendance", serde_json::json!({}));
/// let entry = queue.append(ResourceKind::Attendance, request).expect("append");
/// assert_eq!(entry.status, EntryStatus::Pending);
/// assert_eq!(queue.entries(ResourceKind::Attendance).expect("read").len(), 1);
/// # std::fs::remove_dir_all(&temp).expect("clean up");
/// ```
pub struct DurableQueue {
    dir: Dir,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl DurableQueue {
    /// Wrap an already opened directory.
    pub fn new(dir: Dir, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    /// Open (creating when missing) the queue directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Storage`] when the directory cannot be created or
    /// opened.
    pub fn open_ambient(path: &Utf8Path, clock: Arc<dyn Clock>) -> Result<Self, SyncError> {
        let storage = |error: io::Error| SyncError::Storage {
            path: path.to_path_buf(),
            message: error.to_string(),
        };
        Dir::create_ambient_dir_all(path, ambient_authority()).map_err(storage)?;
        let dir = Dir::open_ambient_dir(path, ambient_authority()).map_err(storage)?;
        Ok(Self::new(dir, clock))
    }

    /// Append a pending entry for `request` to the `kind` queue.
    ///
    /// # Errors
    ///
    /// Returns a storage or decode error when the queue file cannot be
    /// rewritten.
    pub fn append(
        &self,
        kind: ResourceKind,
        request: SyncRequest,
    ) -> Result<SyncQueueEntry, SyncError> {
        let entry = SyncQueueEntry {
            id: Uuid::new_v4(),
            kind,
            request,
            created_at: self.clock.utc(),
            status: EntryStatus::Pending,
            attempts: 0,
            last_error: None,
        };
        let _guard = self.guard();
        let mut entries = self.read(kind)?;
        entries.push(entry.clone());
        self.write(kind, entries)?;
        debug!(%kind, entry_id = %entry.id, "queued mutation");
        Ok(entry)
    }

    /// Entries of the `kind` queue in replay order.
    ///
    /// # Errors
    ///
    /// Returns a storage or decode error when the queue file cannot be read.
    pub fn entries(&self, kind: ResourceKind) -> Result<Vec<SyncQueueEntry>, SyncError> {
        let _guard = self.guard();
        self.read(kind)
    }

    /// Entries of every queue, for display.
    ///
    /// # Errors
    ///
    /// Returns a storage or decode error when a queue file cannot be read.
    pub fn snapshot(&self) -> Result<Vec<SyncQueueEntry>, SyncError> {
        let _guard = self.guard();
        let mut all = Vec::new();
        for kind in ResourceKind::ALL {
            all.extend(self.read(kind)?);
        }
        Ok(all)
    }

    /// Apply `change` to the entry `id`; returns the updated entry, or `None`
    /// when the entry is gone.
    ///
    /// # Errors
    ///
    /// Returns a storage or decode error when the queue file cannot be
    /// rewritten.
    pub fn update(
        &self,
        kind: ResourceKind,
        id: Uuid,
        change: impl FnOnce(&mut SyncQueueEntry),
    ) -> Result<Option<SyncQueueEntry>, SyncError> {
        let _guard = self.guard();
        let mut entries = self.read(kind)?;
        let Some(entry) = entries.iter_mut().find(|entry| entry.id == id) else {
            return Ok(None);
        };
        change(entry);
        let updated = entry.clone();
        self.write(kind, entries)?;
        Ok(Some(updated))
    }

    /// Remove the entry `id`; returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns a storage or decode error when the queue file cannot be
    /// rewritten.
    pub fn remove(&self, kind: ResourceKind, id: Uuid) -> Result<bool, SyncError> {
        let _guard = self.guard();
        let mut entries = self.read(kind)?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.write(kind, entries)?;
        Ok(true)
    }

    /// Run `op` against the queue on the blocking thread pool.
    ///
    /// Queue files are read and rewritten synchronously; async callers go
    /// through here so a slow disk never stalls a runtime worker.
    ///
    /// # Errors
    ///
    /// Returns the error `op` returns, or [`SyncError::Worker`] when the
    /// blocking task panicked or was cancelled.
    pub async fn run_blocking<T, F>(self: &Arc<Self>, op: F) -> Result<T, SyncError>
    where
        T: Send + 'static,
        F: FnOnce(&Self) -> Result<T, SyncError> + Send + 'static,
    {
        let queue = Arc::clone(self);
        tokio::task::spawn_blocking(move || op(&queue))
            .await
            .map_err(|error| SyncError::worker(error.to_string()))?
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn read(&self, kind: ResourceKind) -> Result<Vec<SyncQueueEntry>, SyncError> {
        let name = file_name(kind);
        let raw = match self.dir.read_to_string(&name) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(storage_error(&name, &error)),
        };
        let file: QueueFile = serde_json::from_str(&raw).map_err(|error| SyncError::Corrupt {
            path: Utf8Path::new(&name).to_path_buf(),
            message: error.to_string(),
        })?;
        if file.version != QUEUE_FILE_VERSION {
            warn!(%kind, version = file.version, "queue file written by another version");
        }
        Ok(file.entries)
    }

    fn write(&self, kind: ResourceKind, entries: Vec<SyncQueueEntry>) -> Result<(), SyncError> {
        let name = file_name(kind);
        let file = QueueFile {
            version: QUEUE_FILE_VERSION,
            entries,
        };
        let contents = serde_json::to_string_pretty(&file).map_err(|error| SyncError::Corrupt {
            path: Utf8Path::new(&name).to_path_buf(),
            message: error.to_string(),
        })?;
        write_atomic(&self.dir, &name, &contents)
    }
}

fn file_name(kind: ResourceKind) -> String {
    format!("{kind}.queue.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct QueueDir {
        temp: TempDir,
        path: Utf8PathBuf,
    }

    impl QueueDir {
        fn open(&self) -> DurableQueue {
            DurableQueue::open_ambient(&self.path, Arc::new(DefaultClock)).expect("open queue")
        }
    }

    #[fixture]
    fn queue_dir() -> QueueDir {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(temp.path().join("queue")).expect("utf8 path");
        QueueDir { temp, path }
    }

    fn check_in(n: u32) -> SyncRequest {
        SyncRequest::post_json("/api/v1/attendance", serde_json::json!({ "n": n }))
    }

    #[rstest]
    #[tokio::test(flavor = "current_thread")]
    async fn queue_io_runs_off_the_runtime_thread(queue_dir: QueueDir) {
        let queue = Arc::new(queue_dir.open());
        let runtime_thread = std::thread::current().id();
        let (io_thread, entry) = queue
            .run_blocking(|queue| {
                let entry = queue.append(ResourceKind::Attendance, check_in(1))?;
                Ok((std::thread::current().id(), entry))
            })
            .await
            .expect("append on the blocking pool");
        assert_ne!(io_thread, runtime_thread);
        assert_eq!(
            queue.entries(ResourceKind::Attendance).expect("read"),
            vec![entry]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn panicking_queue_work_is_reported_not_propagated(queue_dir: QueueDir) {
        let queue = Arc::new(queue_dir.open());
        let error = queue
            .run_blocking(|_| -> Result<(), SyncError> { panic!("disk gone") })
            .await
            .expect_err("panic becomes an error");
        assert!(matches!(error, SyncError::Worker { .. }), "{error:?}");
    }

    #[rstest]
    fn entries_survive_reopening_in_append_order(queue_dir: QueueDir) {
        let queue = queue_dir.open();
        for n in 0..3 {
            queue
                .append(ResourceKind::Attendance, check_in(n))
                .expect("append");
        }
        drop(queue);

        let reopened = queue_dir.open();
        let bodies: Vec<_> = reopened
            .entries(ResourceKind::Attendance)
            .expect("read")
            .into_iter()
            .filter_map(|entry| entry.request.body)
            .collect();
        assert_eq!(
            bodies,
            (0..3)
                .map(|n| serde_json::json!({ "n": n }))
                .collect::<Vec<_>>()
        );
        assert!(queue_dir.temp.path().join("queue").is_dir());
    }

    #[rstest]
    fn kinds_are_stored_independently(queue_dir: QueueDir) {
        let queue = queue_dir.open();
        queue
            .append(ResourceKind::Attendance, check_in(1))
            .expect("append");
        queue
            .append(
                ResourceKind::Location,
                SyncRequest::post_json("/api/v1/locations", serde_json::json!({})),
            )
            .expect("append");

        assert_eq!(queue.entries(ResourceKind::Attendance).expect("read").len(), 1);
        assert_eq!(queue.entries(ResourceKind::Location).expect("read").len(), 1);
        assert!(queue.entries(ResourceKind::Payroll).expect("read").is_empty());
        assert_eq!(queue.snapshot().expect("snapshot").len(), 2);
    }

    #[rstest]
    fn update_and_remove_target_one_entry(queue_dir: QueueDir) {
        let queue = queue_dir.open();
        let first = queue
            .append(ResourceKind::Attendance, check_in(1))
            .expect("append");
        let second = queue
            .append(ResourceKind::Attendance, check_in(2))
            .expect("append");

        let updated = queue
            .update(ResourceKind::Attendance, first.id, |entry| {
                entry.status = EntryStatus::Failed;
                entry.last_error = Some("status 409".to_owned());
            })
            .expect("update")
            .expect("entry exists");
        assert_eq!(updated.status, EntryStatus::Failed);

        assert!(queue.remove(ResourceKind::Attendance, second.id).expect("remove"));
        assert!(!queue.remove(ResourceKind::Attendance, second.id).expect("remove"));
        let remaining = queue.entries(ResourceKind::Attendance).expect("read");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].last_error.as_deref(), Some("status 409"));
    }

    #[rstest]
    fn corrupt_files_are_reported(queue_dir: QueueDir) {
        let queue = queue_dir.open();
        std::fs::write(
            queue_dir.path.join("payroll.queue.json").as_std_path(),
            "{not json",
        )
        .expect("write garbage");
        let error = queue
            .entries(ResourceKind::Payroll)
            .expect_err("corrupt file rejected");
        assert!(matches!(error, SyncError::Corrupt { .. }));
    }
}
