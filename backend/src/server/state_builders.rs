//! Assembly of services, adapters and the shared alert hub.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;

use guardpost_backend::domain::ports::{
    AlertRepository, AttendanceCommand, AttendanceRepository, FieldOpsReadModel,
    FixtureAlertRepository, FixtureAttendanceRepository, FixtureFieldOpsReadModel,
    FixtureLocationReportRepository, LocationCommand, LocationReportRepository,
};
use guardpost_backend::domain::{
    AlertEmitter, AttendanceCommandService, AttendancePolicy, BreachAlertMode,
    LocationCommandService,
};
use guardpost_backend::inbound::http::state::HttpState;
use guardpost_backend::inbound::ws::state::WsState;
use guardpost_backend::outbound::persistence::{
    DbPool, DieselAlertRepository, DieselAttendanceRepository, DieselFieldOpsReadModel,
    DieselLocationReportRepository,
};
use guardpost_backend::outbound::realtime::AlertHub;

use super::ServerConfig;

/// The four outbound ports behind the field operations services.
struct FieldOpsPorts<L, A, M> {
    reports: Arc<L>,
    attendance: Arc<A>,
    read_model: Arc<M>,
    alerts: Arc<dyn AlertRepository>,
}

fn diesel_ports(
    pool: &DbPool,
) -> FieldOpsPorts<DieselLocationReportRepository, DieselAttendanceRepository, DieselFieldOpsReadModel>
{
    FieldOpsPorts {
        reports: Arc::new(DieselLocationReportRepository::new(pool.clone())),
        attendance: Arc::new(DieselAttendanceRepository::new(pool.clone())),
        read_model: Arc::new(DieselFieldOpsReadModel::new(pool.clone())),
        alerts: Arc::new(DieselAlertRepository::new(pool.clone())),
    }
}

fn fixture_ports() -> FieldOpsPorts<
    FixtureLocationReportRepository,
    FixtureAttendanceRepository,
    FixtureFieldOpsReadModel,
> {
    FieldOpsPorts {
        reports: Arc::new(FixtureLocationReportRepository),
        attendance: Arc::new(FixtureAttendanceRepository),
        read_model: Arc::new(FixtureFieldOpsReadModel),
        alerts: Arc::new(FixtureAlertRepository),
    }
}

/// Shared state handed to every worker.
pub(super) struct FieldOpsState {
    pub(super) http: web::Data<HttpState>,
    pub(super) ws: web::Data<WsState>,
}

fn build_services<L, A, M>(
    ports: FieldOpsPorts<L, A, M>,
    hub: Arc<AlertHub>,
    policy: AttendancePolicy,
    breach_mode: BreachAlertMode,
) -> (Arc<dyn LocationCommand>, Arc<dyn AttendanceCommand>)
where
    L: LocationReportRepository + 'static,
    A: AttendanceRepository + 'static,
    M: FieldOpsReadModel + 'static,
{
    let emitter = AlertEmitter::new(ports.alerts, hub, Arc::new(DefaultClock));
    let locations = LocationCommandService::new(
        ports.reports,
        ports.read_model.clone(),
        emitter.clone(),
        breach_mode,
    );
    let attendance =
        AttendanceCommandService::new(ports.attendance, ports.read_model, emitter, policy);
    (Arc::new(locations), Arc::new(attendance))
}

/// Build HTTP and WebSocket state around one alert hub.
///
/// Uses Diesel adapters when a pool is configured, otherwise fixtures that
/// accept every write and know no shifts.
pub(super) fn build_field_ops_state(config: &ServerConfig) -> FieldOpsState {
    let hub = Arc::new(AlertHub::new(config.hub_capacity));
    let (locations, attendance) = match &config.db_pool {
        Some(pool) => build_services(
            diesel_ports(pool),
            hub.clone(),
            config.policy,
            config.breach_mode,
        ),
        None => build_services(
            fixture_ports(),
            hub.clone(),
            config.policy,
            config.breach_mode,
        ),
    };
    FieldOpsState {
        http: web::Data::new(HttpState::new(locations, attendance)),
        ws: web::Data::new(WsState::new(hub)),
    }
}
