//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories here are thin: they translate between Diesel rows and
//! domain types and map failures onto port errors. Row structs
//! (`models.rs`) and table definitions (`schema.rs`) never leave this
//! module.
//!
//! # Example
//!
//! ```ignore
//! use guardpost_backend::outbound::persistence::{
//!     DbPool, DieselAlertRepository, PoolConfig,
//! };
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/guardpost")).await?;
//! let alerts = DieselAlertRepository::new(pool);
//! ```

mod diesel_alert_repository;
mod diesel_attendance_repository;
mod diesel_error_mapping;
mod diesel_field_ops_read_model;
mod diesel_location_report_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_alert_repository::DieselAlertRepository;
pub use diesel_attendance_repository::DieselAttendanceRepository;
pub use diesel_field_ops_read_model::DieselFieldOpsReadModel;
pub use diesel_location_report_repository::DieselLocationReportRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
