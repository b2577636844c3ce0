//! Queue drains.
//!
//! A drain replays one kind's queue in FIFO order in a single pass. Drains of
//! one kind are serialized: a trigger arriving while that kind is draining
//! is skipped rather than queued behind it. Different kinds drain
//! concurrently.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SyncError;
use crate::network::Network;
use crate::queue::{DurableQueue, EntryStatus, SyncQueueEntry};
use crate::resource::ResourceKind;

const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Why a drain was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// The user asked for a sync.
    Manual,
    /// The device came back online.
    ConnectivityRestored,
    /// Background wake-up.
    Periodic,
}

/// Outcome of one drain pass over one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    /// Kind drained.
    pub kind: ResourceKind,
    /// Another drain of the same kind was in flight.
    pub skipped: bool,
    /// Entries accepted by the server and removed.
    pub synced: usize,
    /// Entries rejected by the server in this pass.
    pub failed: usize,
    /// Entries still pending after the pass.
    pub pending: usize,
}

impl DrainReport {
    const fn started(kind: ResourceKind) -> Self {
        Self {
            kind,
            skipped: false,
            synced: 0,
            failed: 0,
            pending: 0,
        }
    }

    const fn skipped(kind: ResourceKind) -> Self {
        Self {
            skipped: true,
            ..Self::started(kind)
        }
    }
}

#[derive(Default)]
struct KindLocks {
    attendance: Mutex<()>,
    location: Mutex<()>,
    payroll: Mutex<()>,
    documents: Mutex<()>,
}

impl KindLocks {
    const fn get(&self, kind: ResourceKind) -> &Mutex<()> {
        match kind {
            ResourceKind::Attendance => &self.attendance,
            ResourceKind::Location => &self.location,
            ResourceKind::Payroll => &self.payroll,
            ResourceKind::Documents => &self.documents,
        }
    }
}

enum Replay {
    Synced,
    Rejected(String),
    Deferred(String),
}

/// Replays queued mutations when a trigger fires.
pub struct SyncCoordinator<N> {
    network: Arc<N>,
    queue: Arc<DurableQueue>,
    locks: KindLocks,
}

impl<N> SyncCoordinator<N>
where
    N: Network + 'static,
{
    /// Create a coordinator over the queue and network.
    pub fn new(network: Arc<N>, queue: Arc<DurableQueue>) -> Self {
        Self {
            network,
            queue,
            locks: KindLocks::default(),
        }
    }

    /// Every queued entry, for the client's sync status view.
    ///
    /// # Errors
    ///
    /// Returns a storage or decode error when a queue file cannot be read.
    pub async fn entries(&self) -> Result<Vec<SyncQueueEntry>, SyncError> {
        self.queue.run_blocking(DurableQueue::snapshot).await
    }

    /// Drain every kind concurrently in response to `trigger`.
    pub async fn on_trigger(&self, trigger: SyncTrigger) -> Vec<Result<DrainReport, SyncError>> {
        info!(?trigger, "sync triggered");
        self.drain_all().await
    }

    /// Drain every kind concurrently.
    pub async fn drain_all(&self) -> Vec<Result<DrainReport, SyncError>> {
        let reports = join_all(ResourceKind::ALL.map(|kind| self.drain(kind))).await;
        for (kind, report) in ResourceKind::ALL.iter().zip(&reports) {
            if let Err(error) = report {
                warn!(%kind, %error, "queue drain failed");
            }
        }
        reports
    }

    /// Replay the `kind` queue once, oldest entry first.
    ///
    /// 2xx responses mark the entry synced and remove it. Rejections mark it
    /// failed; failed entries stay for display and are never replayed. A
    /// transient failure leaves the entry pending and ends the pass.
    ///
    /// # Errors
    ///
    /// Returns a storage or decode error when the queue file cannot be read
    /// or rewritten.
    pub async fn drain(&self, kind: ResourceKind) -> Result<DrainReport, SyncError> {
        let Ok(_in_flight) = self.locks.get(kind).try_lock() else {
            debug!(%kind, "drain already in flight; skipping");
            return Ok(DrainReport::skipped(kind));
        };

        let mut report = DrainReport::started(kind);
        let entries = self
            .queue
            .run_blocking(move |queue| queue.entries(kind))
            .await?;
        for entry in entries {
            let id = entry.id;
            match entry.status {
                EntryStatus::Synced => {
                    self.remove(kind, id).await?;
                    continue;
                }
                EntryStatus::Failed => continue,
                EntryStatus::Pending => {}
            }

            match self.replay(&entry).await {
                Replay::Synced => {
                    self.update(kind, id, |stored| {
                        stored.status = EntryStatus::Synced;
                        stored.attempts += 1;
                        stored.last_error = None;
                    })
                    .await?;
                    self.remove(kind, id).await?;
                    report.synced += 1;
                    debug!(%kind, entry_id = %id, "queued mutation delivered");
                }
                Replay::Rejected(reason) => {
                    warn!(%kind, entry_id = %id, %reason, "queued mutation rejected");
                    self.update(kind, id, move |stored| {
                        stored.status = EntryStatus::Failed;
                        stored.attempts += 1;
                        stored.last_error = Some(reason);
                    })
                    .await?;
                    report.failed += 1;
                }
                Replay::Deferred(reason) => {
                    debug!(%kind, entry_id = %id, %reason, "server unreachable; ending pass");
                    self.update(kind, id, move |stored| {
                        stored.attempts += 1;
                        stored.last_error = Some(reason);
                    })
                    .await?;
                    break;
                }
            }
        }

        report.pending = self
            .queue
            .run_blocking(move |queue| {
                let entries = queue.entries(kind)?;
                Ok(entries
                    .iter()
                    .filter(|entry| entry.status == EntryStatus::Pending)
                    .count())
            })
            .await?;
        info!(
            %kind,
            synced = report.synced,
            failed = report.failed,
            pending = report.pending,
            "queue drained"
        );
        Ok(report)
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: Uuid,
        change: impl FnOnce(&mut SyncQueueEntry) + Send + 'static,
    ) -> Result<(), SyncError> {
        self.queue
            .run_blocking(move |queue| queue.update(kind, id, change).map(drop))
            .await
    }

    async fn remove(&self, kind: ResourceKind, id: Uuid) -> Result<(), SyncError> {
        self.queue
            .run_blocking(move |queue| queue.remove(kind, id).map(drop))
            .await
    }

    async fn replay(&self, entry: &SyncQueueEntry) -> Replay {
        match self.network.send(&entry.request).await {
            Ok(response) if response.is_success() => Replay::Synced,
            Ok(response) if response.is_unavailable() => {
                Replay::Deferred(format!("status {}", response.status))
            }
            Ok(response) => Replay::Rejected(format!("status {}", response.status)),
            Err(error) if error.is_transient() => Replay::Deferred(error.to_string()),
            Err(error) => Replay::Rejected(error.to_string()),
        }
    }

    /// Drain every kind each `period` until the returned task is aborted.
    ///
    /// The first drain runs one period after the call.
    pub fn spawn_periodic(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period.max(MIN_PERIOD));
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticks.tick().await;
            loop {
                ticks.tick().await;
                coordinator.on_trigger(SyncTrigger::Periodic).await;
            }
        })
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
