//! Versioned response caches.
//!
//! Responses live in three namespaces (static shell, API listings, images),
//! each stored under a versioned cache name such as `guardpost-api-v3`.
//! Bumping a namespace version and calling [`activate`] drops the caches of
//! every older version.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::info;

use crate::error::SyncError;
use crate::request::SyncResponse;

const CACHE_NAME_PREFIX: &str = "guardpost-";

type Caches = BTreeMap<String, BTreeMap<String, SyncResponse>>;

/// Cache namespace a response is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    /// Application shell assets.
    Static,
    /// API listings.
    Api,
    /// Images.
    Images,
}

impl CacheNamespace {
    /// Every namespace.
    pub const ALL: [Self; 3] = [Self::Static, Self::Api, Self::Images];

    /// Lower-case name used in cache names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Api => "api",
            Self::Images => "images",
        }
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independent version tag of each namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheVersions {
    /// Static shell version.
    pub static_shell: String,
    /// API listing version.
    pub api: String,
    /// Image version.
    pub images: String,
}

impl Default for CacheVersions {
    fn default() -> Self {
        Self {
            static_shell: "v1".to_owned(),
            api: "v1".to_owned(),
            images: "v1".to_owned(),
        }
    }
}

impl CacheVersions {
    /// Version tag of `namespace`.
    #[must_use]
    pub fn version(&self, namespace: CacheNamespace) -> &str {
        match namespace {
            CacheNamespace::Static => &self.static_shell,
            CacheNamespace::Api => &self.api,
            CacheNamespace::Images => &self.images,
        }
    }

    /// Cache name holding the current version of `namespace`.
    ///
    /// # Examples
    /// ```
    /// use guardpost_sync::{CacheNamespace, CacheVersions};
    ///
    /// let versions = CacheVersions::default();
    /// assert_eq!(versions.cache_name(CacheNamespace::Api), "guardpost-api-v1");
    /// ```
    #[must_use]
    pub fn cache_name(&self, namespace: CacheNamespace) -> String {
        format!("{CACHE_NAME_PREFIX}{namespace}-{}", self.version(namespace))
    }
}

/// Storage for cached responses, addressed by cache name and request key.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Look up a cached response.
    async fn get(&self, cache: &str, key: &str) -> Result<Option<SyncResponse>, SyncError>;

    /// Store a response, replacing any previous copy.
    async fn put(&self, cache: &str, key: &str, response: SyncResponse) -> Result<(), SyncError>;

    /// Names of every cache currently held.
    async fn cache_names(&self) -> Result<Vec<String>, SyncError>;

    /// Drop a whole cache; returns whether it existed.
    async fn delete(&self, cache: &str) -> Result<bool, SyncError>;
}

/// Drop every cache this engine owns that is not at a current version.
///
/// Caches whose names do not carry the engine's prefix are left alone.
///
/// # Errors
///
/// Propagates failures listing or deleting caches.
pub async fn activate<C>(cache: &C, versions: &CacheVersions) -> Result<Vec<String>, SyncError>
where
    C: ResponseCache + ?Sized,
{
    let current: HashSet<String> = CacheNamespace::ALL
        .into_iter()
        .map(|namespace| versions.cache_name(namespace))
        .collect();
    let mut removed = Vec::new();
    for name in cache.cache_names().await? {
        let outdated = name.starts_with(CACHE_NAME_PREFIX) && !current.contains(&name);
        if outdated && cache.delete(&name).await? {
            removed.push(name);
        }
    }
    if !removed.is_empty() {
        info!(removed = ?removed, "dropped outdated caches");
    }
    Ok(removed)
}

/// Process-local [`ResponseCache`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    caches: Mutex<Caches>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Caches>, SyncError> {
        self.caches
            .lock()
            .map_err(|_| SyncError::cache("cache lock poisoned"))
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, cache: &str, key: &str) -> Result<Option<SyncResponse>, SyncError> {
        Ok(self
            .lock()?
            .get(cache)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(&self, cache: &str, key: &str, response: SyncResponse) -> Result<(), SyncError> {
        self.lock()?
            .entry(cache.to_owned())
            .or_default()
            .insert(key.to_owned(), response);
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>, SyncError> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    async fn delete(&self, cache: &str) -> Result<bool, SyncError> {
        Ok(self.lock()?.remove(cache).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bumped_api() -> CacheVersions {
        CacheVersions {
            api: "v2".to_owned(),
            ..CacheVersions::default()
        }
    }

    #[tokio::test]
    async fn activation_drops_only_outdated_caches() {
        let cache = MemoryCache::new();
        let old = CacheVersions::default();
        for namespace in CacheNamespace::ALL {
            cache
                .put(&old.cache_name(namespace), "/", SyncResponse::new(200, "x"))
                .await
                .expect("put succeeds");
        }
        cache
            .put("third-party", "/", SyncResponse::new(200, "x"))
            .await
            .expect("put succeeds");

        let removed = activate(&cache, &bumped_api()).await.expect("activation");

        assert_eq!(removed, vec!["guardpost-api-v1".to_owned()]);
        let names = cache.cache_names().await.expect("names");
        assert!(names.contains(&"guardpost-static-v1".to_owned()));
        assert!(names.contains(&"guardpost-images-v1".to_owned()));
        assert!(names.contains(&"third-party".to_owned()));
    }

    #[tokio::test]
    async fn put_replaces_previous_copy() {
        let cache = MemoryCache::new();
        cache
            .put("c", "/k", SyncResponse::new(200, "old"))
            .await
            .expect("put succeeds");
        cache
            .put("c", "/k", SyncResponse::new(200, "new"))
            .await
            .expect("put succeeds");
        let stored = cache.get("c", "/k").await.expect("get").expect("cached");
        assert_eq!(stored.body, b"new");
    }

    #[test]
    fn namespaces_version_independently() {
        let versions = bumped_api();
        assert_eq!(versions.cache_name(CacheNamespace::Api), "guardpost-api-v2");
        assert_eq!(
            versions.cache_name(CacheNamespace::Static),
            "guardpost-static-v1"
        );
    }
}
