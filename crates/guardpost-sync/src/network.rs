//! Network port and its reqwest adapter.
//!
//! The adapter owns transport details only: URL resolution, the request
//! timeout and mapping reqwest failures. HTTP error statuses are returned as
//! responses; deciding what a 4xx or 503 means is the caller's job.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::request::{Method, SyncRequest, SyncResponse};

/// Failures reaching the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out: {message}")]
    Timeout {
        /// Transport detail.
        message: String,
    },
    /// The connection failed or was dropped.
    #[error("network unavailable: {message}")]
    Transport {
        /// Transport detail.
        message: String,
    },
    /// The request path cannot be resolved against the base URL.
    #[error("invalid request URL: {message}")]
    InvalidUrl {
        /// Resolution detail.
        message: String,
    },
}

impl NetworkError {
    /// Build a timeout failure.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Build a transport failure.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Whether retrying later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport { .. })
    }
}

/// Sends requests to the server.
#[async_trait]
pub trait Network: Send + Sync {
    /// Send `request` and return whatever response the server produced.
    async fn send(&self, request: &SyncRequest) -> Result<SyncResponse, NetworkError>;
}

/// [`Network`] adapter backed by a reqwest client with a fixed timeout.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: Client,
    base_url: Url,
}

impl HttpNetwork {
    /// Build an adapter for the configured server and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] when the reqwest client cannot be
    /// constructed.
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        Self::with_timeout(config.base_url().clone(), config.request_timeout())
    }

    /// Build an adapter with an explicit base URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] when the reqwest client cannot be
    /// constructed.
    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| SyncError::config(format!("http client: {error}")))?;
        Ok(Self { client, base_url })
    }

    fn resolve(&self, path: &str) -> Result<Url, NetworkError> {
        self.base_url
            .join(path)
            .map_err(|error| NetworkError::InvalidUrl {
                message: format!("{path}: {error}"),
            })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn send(&self, request: &SyncRequest) -> Result<SyncResponse, NetworkError> {
        let url = self.resolve(&request.path)?;
        let mut builder = self.client.request(reqwest_method(request.method), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|text| (name.as_str().to_owned(), text.to_owned()))
            })
            .collect::<BTreeMap<_, _>>();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(SyncResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

const fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_transport_error(error: reqwest::Error) -> NetworkError {
    if error.is_timeout() {
        NetworkError::timeout(error.to_string())
    } else {
        NetworkError::transport(error.to_string())
    }
}
