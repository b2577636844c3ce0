//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod alert_broadcaster;
mod alert_repository;
mod attendance_command;
mod attendance_repository;
mod field_ops_read_model;
mod location_command;
mod location_report_repository;

#[cfg(test)]
pub use alert_broadcaster::MockAlertBroadcaster;
pub use alert_broadcaster::{
    AlertBroadcastError, AlertBroadcaster, AlertFeed, FixtureAlertBroadcaster,
};
#[cfg(test)]
pub use alert_repository::MockAlertRepository;
pub use alert_repository::{AlertRepository, AlertRepositoryError, FixtureAlertRepository};
#[cfg(test)]
pub use attendance_command::MockAttendanceCommand;
pub use attendance_command::{AttendanceAction, AttendanceCommand, RecordAttendanceRequest};
#[cfg(test)]
pub use attendance_repository::MockAttendanceRepository;
pub use attendance_repository::{
    AttendanceRepository, AttendanceRepositoryError, FixtureAttendanceRepository,
};
#[cfg(test)]
pub use field_ops_read_model::MockFieldOpsReadModel;
pub use field_ops_read_model::{
    FieldOpsReadModel, FieldOpsReadModelError, FixtureFieldOpsReadModel,
};
#[cfg(test)]
pub use location_command::MockLocationCommand;
pub use location_command::{LocationCommand, RecordLocationRequest};
#[cfg(test)]
pub use location_report_repository::MockLocationReportRepository;
pub use location_report_repository::{
    FixtureLocationReportRepository, LocationReportRepository, LocationReportRepositoryError,
};
