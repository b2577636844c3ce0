//! Request interception.
//!
//! [`SyncEngine::handle`] classifies a request, picks its [`Strategy`] and
//! serves it from cache, network or both. Cached shell assets and API reads
//! are refreshed in the background after being served. Cache writes never fail a
//! response, and mutations of queueable kinds that cannot reach the server
//! are written to the durable queue instead of being retried in place.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{self, CacheNamespace, ResponseCache};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::network::Network;
use crate::queue::{DurableQueue, SyncQueueEntry};
use crate::request::{SyncRequest, SyncResponse};
use crate::resource::{ResourceClass, ResourceKind};
use crate::strategy::Strategy;

/// Status returned for a mutation accepted into the queue.
pub const QUEUED_STATUS: u16 = 202;

/// Client-side request engine.
pub struct SyncEngine<N, C> {
    config: SyncConfig,
    network: Arc<N>,
    cache: Arc<C>,
    queue: Arc<DurableQueue>,
    refreshes: Mutex<Vec<JoinHandle<()>>>,
}

impl<N, C> SyncEngine<N, C>
where
    N: Network + 'static,
    C: ResponseCache + 'static,
{
    /// Assemble an engine over its adapters.
    pub fn new(
        config: SyncConfig,
        network: Arc<N>,
        cache: Arc<C>,
        queue: Arc<DurableQueue>,
    ) -> Self {
        Self {
            config,
            network,
            cache,
            queue,
            refreshes: Mutex::new(Vec::new()),
        }
    }

    /// Drop caches left behind by older namespace versions.
    ///
    /// # Errors
    ///
    /// Propagates cache listing and deletion failures.
    pub async fn activate(&self) -> Result<Vec<String>, SyncError> {
        cache::activate(self.cache.as_ref(), self.config.cache_versions()).await
    }

    /// Serve `request` according to its resource class.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Network`] when the server is unreachable and
    /// neither a cached copy nor the queue can stand in, and a storage error
    /// when a mutation could not be queued.
    pub async fn handle(&self, request: SyncRequest) -> Result<SyncResponse, SyncError> {
        let class = ResourceClass::classify(self.config.routes(), &request);
        match Strategy::for_class(class) {
            Strategy::CacheFirst(namespace) | Strategy::StaleWhileRevalidate(namespace) => {
                self.serve_then_refresh(namespace, request).await
            }
            Strategy::CacheFirstWithPlaceholder(namespace) => {
                match self.cache_first(namespace, &request).await {
                    Ok(response) => Ok(response),
                    Err(error) => {
                        debug!(path = %request.path, %error, "serving image placeholder");
                        Ok(SyncResponse::placeholder())
                    }
                }
            }
            Strategy::NetworkOnly { queue } => self.network_only(queue, request).await,
        }
    }

    /// Wait for every background refresh started so far.
    pub async fn settle(&self) {
        let pending = std::mem::take(&mut *self.refreshes());
        for refresh in pending {
            if let Err(error) = refresh.await {
                warn!(%error, "background refresh task failed");
            }
        }
    }

    async fn cache_first(
        &self,
        namespace: CacheNamespace,
        request: &SyncRequest,
    ) -> Result<SyncResponse, SyncError> {
        let name = self.config.cache_versions().cache_name(namespace);
        if let Some(cached) = lookup(self.cache.as_ref(), &name, request).await {
            return Ok(cached);
        }
        let response = self.network.send(request).await?;
        store(self.cache.as_ref(), &name, request, &response).await;
        Ok(response)
    }

    /// Serve the cached copy and refresh it in the background, or wait for
    /// the network when nothing is cached.
    async fn serve_then_refresh(
        &self,
        namespace: CacheNamespace,
        request: SyncRequest,
    ) -> Result<SyncResponse, SyncError> {
        let name = self.config.cache_versions().cache_name(namespace);
        let Some(cached) = lookup(self.cache.as_ref(), &name, &request).await else {
            let response = self.network.send(&request).await?;
            store(self.cache.as_ref(), &name, &request, &response).await;
            return Ok(response);
        };

        let network = Arc::clone(&self.network);
        let cache = Arc::clone(&self.cache);
        let refresh = tokio::spawn(async move {
            match network.send(&request).await {
                Ok(response) => store(cache.as_ref(), &name, &request, &response).await,
                Err(error) => debug!(path = %request.path, %error, "background refresh failed"),
            }
        });
        let mut refreshes = self.refreshes();
        refreshes.retain(|handle| !handle.is_finished());
        refreshes.push(refresh);
        Ok(cached)
    }

    async fn network_only(
        &self,
        queue: Option<ResourceKind>,
        request: SyncRequest,
    ) -> Result<SyncResponse, SyncError> {
        match (self.network.send(&request).await, queue) {
            (Ok(response), Some(kind)) if response.is_unavailable() => {
                self.enqueue(kind, request, &format!("status {}", response.status))
                    .await
            }
            (Ok(response), _) => Ok(response),
            (Err(error), Some(kind)) if error.is_transient() => {
                self.enqueue(kind, request, &error.to_string()).await
            }
            (Err(error), _) => Err(error.into()),
        }
    }

    async fn enqueue(
        &self,
        kind: ResourceKind,
        request: SyncRequest,
        reason: &str,
    ) -> Result<SyncResponse, SyncError> {
        let entry = self
            .queue
            .run_blocking(move |queue| queue.append(kind, request))
            .await?;
        info!(%kind, entry_id = %entry.id, reason, "mutation queued for replay");
        Ok(queued_response(&entry))
    }

    fn refreshes(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        match self.refreshes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn queued_response(entry: &SyncQueueEntry) -> SyncResponse {
    let body = serde_json::json!({
        "queued": true,
        "entryId": entry.id,
        "kind": entry.kind,
    });
    SyncResponse::new(QUEUED_STATUS, body.to_string())
        .with_header("content-type", "application/json")
}

async fn lookup<C>(cache: &C, name: &str, request: &SyncRequest) -> Option<SyncResponse>
where
    C: ResponseCache + ?Sized,
{
    match cache.get(name, request.cache_key()).await {
        Ok(found) => found,
        Err(error) => {
            warn!(cache = name, path = %request.path, %error, "cache read failed");
            None
        }
    }
}

/// Store successful responses; a failed put is logged and otherwise ignored.
async fn store<C>(cache: &C, name: &str, request: &SyncRequest, response: &SyncResponse)
where
    C: ResponseCache + ?Sized,
{
    if !response.is_success() {
        return;
    }
    if let Err(error) = cache.put(name, request.cache_key(), response.clone()).await {
        warn!(cache = name, path = %request.path, %error, "cache write failed");
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
