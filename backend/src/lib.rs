//! Guardpost field operations backend.
//!
//! Location ingestion with geofence breach detection, attendance check-in
//! and check-out with lateness alerts, and a WebSocket alert stream. Laid
//! out hexagonally: [`domain`] owns the rules and ports, [`inbound`] and
//! [`outbound`] hold the adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
