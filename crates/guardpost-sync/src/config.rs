//! Sync engine configuration.
//!
//! [`SyncConfig`] is assembled with a builder so the embedding client can
//! override only what differs from the defaults: the base URL is the one
//! required setting.

use std::time::Duration;

use reqwest::Url;

use crate::cache::CacheVersions;
use crate::error::SyncError;
use crate::resource::ResourceKind;

/// Network timeout applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Route the notification `explore` action opens by default.
pub const DEFAULT_DASHBOARD_ROUTE: &str = "/dashboard";

/// Route classification tables.
///
/// Prefixes match a whole path segment: `/api/v1/guards` matches
/// `/api/v1/guards/7` but not `/api/v1/guardsmen`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    /// Exact paths served from the static shell cache.
    pub static_paths: Vec<String>,
    /// Path prefixes served from the static shell cache.
    pub static_prefixes: Vec<String>,
    /// Lower-case file extensions treated as images.
    pub image_extensions: Vec<String>,
    /// Path prefixes of listings read stale-while-revalidate.
    pub cacheable_prefixes: Vec<String>,
    /// Path prefixes whose failed mutations are queued, with their kind.
    pub queueable_prefixes: Vec<(String, ResourceKind)>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let owned = |values: &[&str]| values.iter().map(|value| (*value).to_owned()).collect();
        Self {
            static_paths: owned(&["/", "/index.html", "/manifest.json"]),
            static_prefixes: owned(&["/static"]),
            image_extensions: owned(&["png", "jpg", "jpeg", "gif", "svg", "webp", "ico"]),
            cacheable_prefixes: owned(&[
                "/api/v1/guards",
                "/api/v1/posts",
                "/api/v1/attendance",
                "/api/v1/payroll",
                "/api/v1/compliance",
            ]),
            queueable_prefixes: vec![
                ("/api/v1/attendance".to_owned(), ResourceKind::Attendance),
                ("/api/v1/locations".to_owned(), ResourceKind::Location),
                ("/api/v1/payroll".to_owned(), ResourceKind::Payroll),
                ("/api/v1/documents".to_owned(), ResourceKind::Documents),
            ],
        }
    }
}

impl RouteTable {
    /// Whether `path` belongs to the static shell.
    #[must_use]
    pub fn is_static(&self, path: &str) -> bool {
        self.static_paths.iter().any(|known| known == path)
            || self
                .static_prefixes
                .iter()
                .any(|prefix| matches_prefix(path, prefix))
    }

    /// Whether `path` names an image file.
    #[must_use]
    pub fn is_image(&self, path: &str) -> bool {
        let file = path.rsplit('/').next().unwrap_or(path);
        file.rsplit_once('.').is_some_and(|(_, extension)| {
            self.image_extensions
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
        })
    }

    /// Whether `path` is a listing served stale-while-revalidate.
    #[must_use]
    pub fn is_cacheable(&self, path: &str) -> bool {
        self.cacheable_prefixes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
    }

    /// The queue a failed mutation of `path` belongs to.
    #[must_use]
    pub fn queueable_kind(&self, path: &str) -> Option<ResourceKind> {
        self.queueable_prefixes
            .iter()
            .find(|(prefix, _)| matches_prefix(path, prefix))
            .map(|(_, kind)| *kind)
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Settings shared by the engine, the network adapter and the push handler.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    base_url: Url,
    request_timeout: Duration,
    cache_versions: CacheVersions,
    routes: RouteTable,
    dashboard_route: String,
}

impl SyncConfig {
    /// Start a builder for the server at `base_url`.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use guardpost_sync::SyncConfig;
    ///
    /// let config = SyncConfig::builder("https://ops.example.test")
    ///     .request_timeout(Duration::from_secs(5))
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.request_timeout(), Duration::from_secs(5));
    /// assert_eq!(config.dashboard_route(), "/dashboard");
    /// ```
    pub fn builder(base_url: impl Into<String>) -> SyncConfigBuilder {
        SyncConfigBuilder {
            base_url: base_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cache_versions: CacheVersions::default(),
            routes: RouteTable::default(),
            dashboard_route: DEFAULT_DASHBOARD_ROUTE.to_owned(),
        }
    }

    /// Server origin requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Upper bound on a single network call.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Current cache namespace versions.
    #[must_use]
    pub const fn cache_versions(&self) -> &CacheVersions {
        &self.cache_versions
    }

    /// Route classification tables.
    #[must_use]
    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Route opened by the notification `explore` action.
    #[must_use]
    pub fn dashboard_route(&self) -> &str {
        &self.dashboard_route
    }
}

/// Builder for [`SyncConfig`].
#[derive(Debug, Clone)]
pub struct SyncConfigBuilder {
    base_url: String,
    request_timeout: Duration,
    cache_versions: CacheVersions,
    routes: RouteTable,
    dashboard_route: String,
}

impl SyncConfigBuilder {
    /// Override the network timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the cache namespace versions.
    #[must_use]
    pub fn cache_versions(mut self, versions: CacheVersions) -> Self {
        self.cache_versions = versions;
        self
    }

    /// Replace the route classification tables.
    #[must_use]
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Override the dashboard route.
    #[must_use]
    pub fn dashboard_route(mut self, route: impl Into<String>) -> Self {
        self.dashboard_route = route.into();
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] when the base URL does not parse or is
    /// not `http`/`https`, or when the timeout is zero.
    pub fn build(self) -> Result<SyncConfig, SyncError> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|error| SyncError::config(format!("base URL {}: {error}", self.base_url)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SyncError::config(format!(
                "base URL {} must use http or https",
                self.base_url
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(SyncError::config("request timeout must be positive"));
        }
        Ok(SyncConfig {
            base_url,
            request_timeout: self.request_timeout,
            cache_versions: self.cache_versions,
            routes: self.routes,
            dashboard_route: self.dashboard_route,
        })
    }
}
