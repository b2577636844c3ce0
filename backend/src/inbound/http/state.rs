//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only see the driving ports,
//! so they can be exercised against in-memory adapters.

use std::sync::Arc;

use crate::domain::ports::{AttendanceCommand, LocationCommand};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub locations: Arc<dyn LocationCommand>,
    pub attendance: Arc<dyn AttendanceCommand>,
}

impl HttpState {
    /// Bundle the field operations ports.
    pub fn new(
        locations: Arc<dyn LocationCommand>,
        attendance: Arc<dyn AttendanceCommand>,
    ) -> Self {
        Self {
            locations,
            attendance,
        }
    }
}
