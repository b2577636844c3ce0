//! PostgreSQL-backed `LocationReportRepository`.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;

use crate::domain::LocationReport;
use crate::domain::ports::{LocationReportRepository, LocationReportRepositoryError};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::NewLocationReportRow;
use super::pool::DbPool;
use super::schema::location_reports;

/// Appends location reports; rows are never updated.
#[derive(Clone)]
pub struct DieselLocationReportRepository {
    pool: DbPool,
}

impl DieselLocationReportRepository {
    /// Create a repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationReportRepository for DieselLocationReportRepository {
    async fn append(&self, report: &LocationReport) -> Result<(), LocationReportRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(&err, LocationReportRepositoryError::connection))?;
        diesel::insert_into(location_reports::table)
            .values(NewLocationReportRow::from(report))
            .execute(&mut conn)
            .await
            .map_err(|err| {
                map_diesel_error(
                    &err,
                    LocationReportRepositoryError::query,
                    LocationReportRepositoryError::connection,
                )
            })?;
        Ok(())
    }
}
