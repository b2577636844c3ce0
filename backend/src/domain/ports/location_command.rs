//! Driving port for location ingestion.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Error, FieldOpsContext, GuardId, LocationReport};

/// A location fix submitted by a guard's handset.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLocationRequest {
    /// Reporting guard.
    pub guard_id: GuardId,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Ground speed in meters per second.
    pub speed: Option<f64>,
    /// Heading in degrees.
    pub direction: Option<f64>,
    /// Capture instant reported by the handset; server time when absent.
    pub captured_at: Option<DateTime<Utc>>,
}

/// Driving port for recording location reports.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationCommand: Send + Sync {
    /// Persist a report and run breach evaluation on it.
    ///
    /// Only validation and storage failures surface as errors. Breach
    /// evaluation happens after the report is stored and its failures never
    /// fail the call.
    async fn record_location(
        &self,
        ctx: FieldOpsContext,
        request: RecordLocationRequest,
    ) -> Result<LocationReport, Error>;
}
