//! Port for appending guard location reports.

use async_trait::async_trait;

use crate::domain::LocationReport;

use super::define_port_error;

define_port_error! {
    /// Errors raised by location report repository adapters.
    pub enum LocationReportRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "location report repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "location report repository query failed: {message}",
    }
}

/// Append-only store for location reports.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationReportRepository: Send + Sync {
    /// Durably persist a report.
    async fn append(&self, report: &LocationReport) -> Result<(), LocationReportRepositoryError>;
}

/// Fixture implementation for tests that do not exercise report storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLocationReportRepository;

#[async_trait]
impl LocationReportRepository for FixtureLocationReportRepository {
    async fn append(&self, _report: &LocationReport) -> Result<(), LocationReportRepositoryError> {
        Ok(())
    }
}
