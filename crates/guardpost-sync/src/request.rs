//! Requests and responses as seen by the sync engine.
//!
//! Requests are plain data so they can be written to the durable queue and
//! replayed verbatim after a restart.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP method of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Read.
    Get,
    /// Create.
    Post,
    /// Replace.
    Put,
    /// Partial update.
    Patch,
    /// Remove.
    Delete,
}

impl Method {
    /// Whether the method changes server state.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::Get)
    }

    /// Upper-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request intercepted on its way to the server.
///
/// `path` is relative to the configured base URL and includes any query
/// string.
///
/// # Examples
/// ```
/// use guardpost_sync::{Method, SyncRequest};
///
/// let request = SyncRequest::post_json(
///     "/api/v1/attendance",
///     serde_json::json!({"type": "check-in"}),
/// );
/// assert_eq!(request.method, Method::Post);
/// assert_eq!(request.path_only(), "/api/v1/attendance");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// HTTP method.
    pub method: Method,
    /// Path and query relative to the base URL.
    pub path: String,
    /// Request headers to replay.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// JSON body, when the request carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl SyncRequest {
    /// A body-less GET.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// A POST carrying a JSON body.
    pub fn post_json(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            headers: BTreeMap::new(),
            body: Some(body),
        }
    }

    /// Attach a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The path without its query string.
    #[must_use]
    pub fn path_only(&self) -> &str {
        self.path
            .split_once('?')
            .map_or(self.path.as_str(), |(path, _)| path)
    }

    /// Cache key: method-independent since only GETs are cached.
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.path
    }
}

/// A response handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Raw response body.
    #[serde(default)]
    pub body: Vec<u8>,
}

impl SyncResponse {
    /// A response with the given status and body and no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Empty stand-in for an image that could not be fetched.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::new(200, Vec::new()).with_header("content-type", "image/svg+xml")
    }

    /// Attach a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Whether the status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Whether the server reported a temporary outage.
    ///
    /// 502, 503 and 504 mean the request never reached working storage, so
    /// it is safe to replay later.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self.status, 502..=504)
    }
}
