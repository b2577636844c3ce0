//! Offline-first request handling for the guard client.
//!
//! The guard's mobile client routes every request through a [`SyncEngine`],
//! which serves it by resource class:
//!
//! - static shell assets cache-first,
//! - images cache-first with a placeholder when unreachable,
//! - listings stale-while-revalidate,
//! - mutations network-only, with transient failures of attendance,
//!   location, payroll and document submissions written to a
//!   [`DurableQueue`].
//!
//! A [`SyncCoordinator`] replays the queue when a [`SyncTrigger`] fires, one
//! FIFO pass per resource kind. [`PushHandler`] covers push subscription and
//! notification actions.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use guardpost_sync::{
//!     DurableQueue, HttpNetwork, MemoryCache, SyncConfig, SyncCoordinator, SyncEngine,
//! };
//! use mockable::DefaultClock;
//!
//! let config = SyncConfig::builder("https://ops.example.test")
//!     .build()
//!     .expect("valid config");
//! let network = Arc::new(HttpNetwork::new(&config).expect("http client"));
//! let dir = std::env::temp_dir().join(format!("guardpost-{}", uuid::Uuid::new_v4()));
//! let dir = camino::Utf8PathBuf::from_path_buf(dir).expect("utf8 temp dir");
//! let queue = Arc::new(DurableQueue::open_ambient(&dir, Arc::new(DefaultClock)).expect("queue"));
//!
//! let engine = SyncEngine::new(
//!     config,
//!     Arc::clone(&network),
//!     Arc::new(MemoryCache::new()),
//!     Arc::clone(&queue),
//! );
//! let coordinator = SyncCoordinator::new(network, queue);
//! # drop((engine, coordinator));
//! # std::fs::remove_dir_all(dir).expect("clean up");
//! ```

mod atomic_io;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod engine;
mod error;
pub mod network;
pub mod push;
pub mod queue;
mod request;
pub mod resource;
pub mod strategy;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use cache::{CacheNamespace, CacheVersions, MemoryCache, ResponseCache};
pub use config::{RouteTable, SyncConfig, SyncConfigBuilder};
pub use coordinator::{DrainReport, SyncCoordinator, SyncTrigger};
pub use engine::{QUEUED_STATUS, SyncEngine};
pub use error::SyncError;
pub use network::{HttpNetwork, Network, NetworkError};
pub use push::{PushHandler, PushNavigation, PushPayload, PushPlatform, PushSubscription};
pub use queue::{DurableQueue, EntryStatus, SyncQueueEntry};
pub use request::{Method, SyncRequest, SyncResponse};
pub use resource::{ResourceClass, ResourceKind};
pub use strategy::Strategy;
