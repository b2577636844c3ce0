//! Resource classification for intercepted requests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RouteTable;
use crate::request::SyncRequest;

/// Resource kinds whose failed mutations are queued for replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Check-in and check-out submissions.
    Attendance,
    /// GPS location reports.
    Location,
    /// Payroll submissions.
    Payroll,
    /// Document submissions.
    Documents,
}

impl ResourceKind {
    /// Every queueable kind, in drain order.
    pub const ALL: [Self; 4] = [
        Self::Attendance,
        Self::Location,
        Self::Payroll,
        Self::Documents,
    ];

    /// Lower-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attendance => "attendance",
            Self::Location => "location",
            Self::Payroll => "payroll",
            Self::Documents => "documents",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a resource kind name is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resource kind: {0}")]
pub struct ParseResourceKindError(pub String);

impl FromStr for ResourceKind {
    type Err = ParseResourceKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ParseResourceKindError(value.to_owned()))
    }
}

/// What an intercepted request is, for the purpose of picking a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    /// Application shell assets.
    StaticShell,
    /// Images.
    Image,
    /// GET of a listing the client may show stale.
    CacheableRead,
    /// Any state-changing request; queueable when a kind is known.
    Mutation(Option<ResourceKind>),
    /// Everything else: straight to the network.
    Passthrough,
}

impl ResourceClass {
    /// Classify `request` against the configured route tables.
    ///
    /// # Examples
    /// ```
    /// use guardpost_sync::{ResourceClass, ResourceKind, RouteTable, SyncRequest};
    ///
    /// let routes = RouteTable::default();
    /// let check_in = SyncRequest::post_json("/api/v1/attendance", serde_json::json!({}));
    /// assert_eq!(
    ///     ResourceClass::classify(&routes, &check_in),
    ///     ResourceClass::Mutation(Some(ResourceKind::Attendance)),
    /// );
    /// ```
    #[must_use]
    pub fn classify(routes: &RouteTable, request: &SyncRequest) -> Self {
        let path = request.path_only();
        if request.method.is_mutation() {
            return Self::Mutation(routes.queueable_kind(path));
        }
        if routes.is_image(path) {
            Self::Image
        } else if routes.is_static(path) {
            Self::StaticShell
        } else if routes.is_cacheable(path) {
            Self::CacheableRead
        } else {
            Self::Passthrough
        }
    }
}
