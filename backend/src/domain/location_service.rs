//! Location ingestion and breach evaluation.
//!
//! A report is stored first. Breach evaluation runs afterwards on the stored
//! report; anything that goes wrong there is logged and the caller still gets
//! the stored report back.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::domain::breach::{self, GeofenceMeasurement};
use crate::domain::field_ops_errors::{
    map_coordinate_error, map_report_error, map_report_validation_error,
};
use crate::domain::ports::{
    AlertRepositoryError, FieldOpsReadModel, FieldOpsReadModelError, LocationCommand,
    LocationReportRepository, RecordLocationRequest,
};
use crate::domain::{
    AlertEmitter, BreachAlertMode, BreachDecision, Coordinate, Error, FieldOpsContext,
    LocationReport, LocationReportDraft, LocationReportId, NewAlert,
};

#[derive(Debug, thiserror::Error)]
enum BreachEvaluationError {
    #[error(transparent)]
    ReadModel(#[from] FieldOpsReadModelError),
    #[error(transparent)]
    Alerts(#[from] AlertRepositoryError),
}

/// Location service implementing the location driving port.
#[derive(Clone)]
pub struct LocationCommandService<L, M> {
    reports: Arc<L>,
    read_model: Arc<M>,
    emitter: AlertEmitter,
    mode: BreachAlertMode,
}

impl<L, M> LocationCommandService<L, M> {
    /// Create a service over the report store, the scheduling read model and
    /// the alert emitter.
    pub fn new(
        reports: Arc<L>,
        read_model: Arc<M>,
        emitter: AlertEmitter,
        mode: BreachAlertMode,
    ) -> Self {
        Self {
            reports,
            read_model,
            emitter,
            mode,
        }
    }
}

impl<L, M> LocationCommandService<L, M>
where
    L: LocationReportRepository,
    M: FieldOpsReadModel,
{
    async fn evaluate_breaches(
        &self,
        ctx: &FieldOpsContext,
        report: &LocationReport,
    ) -> Result<(), BreachEvaluationError> {
        let guard_id = report.guard_id();
        let Some(shift) = self.read_model.find_in_progress_shift(&guard_id).await? else {
            debug!(%guard_id, "no shift in progress; skipping breach evaluation");
            return Ok(());
        };
        let geofences = self.read_model.list_post_geofences(&shift.post_id).await?;
        let measurements = breach::measure(report, Some(&shift), &geofences, self.emitter.now());

        let outcomes = join_all(
            measurements
                .iter()
                .map(|measurement| self.apply_measurement(ctx, report, measurement)),
        )
        .await;
        for (measurement, outcome) in measurements.iter().zip(outcomes) {
            if let Err(error) = outcome {
                warn!(
                    %guard_id,
                    geofence_id = %measurement.geofence.id,
                    %error,
                    "geofence evaluation failed"
                );
            }
        }
        Ok(())
    }

    async fn apply_measurement(
        &self,
        ctx: &FieldOpsContext,
        report: &LocationReport,
        measurement: &GeofenceMeasurement,
    ) -> Result<BreachDecision, BreachEvaluationError> {
        let guard_id = report.guard_id();
        let geofence = &measurement.geofence;
        let open = if self.mode.tracks_episodes() {
            self.emitter.open_breach(&guard_id, &geofence.id).await?
        } else {
            None
        };

        let decision = measurement.decide(self.mode, open.is_some());
        match decision {
            BreachDecision::RaiseBreach => {
                let alert =
                    NewAlert::geofence_breach(guard_id, geofence.id, &geofence.name, report.id());
                if self.mode.tracks_episodes() {
                    if self.emitter.open_episode(ctx, alert).await?.is_none() {
                        debug!(
                            %guard_id,
                            geofence_id = %geofence.id,
                            "breach episode opened by a concurrent report"
                        );
                    }
                } else {
                    self.emitter.emit(ctx, alert).await?;
                }
            }
            BreachDecision::CloseEpisode { raise_return } => {
                self.emitter.close_breach(&guard_id, &geofence.id).await?;
                if raise_return {
                    self.emitter
                        .emit(
                            ctx,
                            NewAlert::geofence_return(
                                guard_id,
                                geofence.id,
                                &geofence.name,
                                report.id(),
                            ),
                        )
                        .await?;
                }
            }
            BreachDecision::Suppress => {
                debug!(
                    %guard_id,
                    geofence_id = %geofence.id,
                    distance_meters = measurement.distance_meters,
                    "breach episode already open"
                );
            }
            BreachDecision::Nothing => {}
        }
        Ok(decision)
    }
}

#[async_trait]
impl<L, M> LocationCommand for LocationCommandService<L, M>
where
    L: LocationReportRepository,
    M: FieldOpsReadModel,
{
    async fn record_location(
        &self,
        ctx: FieldOpsContext,
        request: RecordLocationRequest,
    ) -> Result<LocationReport, Error> {
        let position =
            Coordinate::new(request.latitude, request.longitude).map_err(map_coordinate_error)?;
        let report = LocationReport::new(LocationReportDraft {
            id: LocationReportId::random(),
            guard_id: request.guard_id,
            position,
            speed: request.speed,
            direction: request.direction,
            captured_at: request.captured_at.unwrap_or_else(|| self.emitter.now()),
        })
        .map_err(map_report_validation_error)?;

        self.reports
            .append(&report)
            .await
            .map_err(map_report_error)?;

        if let Err(error) = self.evaluate_breaches(&ctx, &report).await {
            warn!(
                guard_id = %report.guard_id(),
                location_id = %report.id(),
                %error,
                "breach evaluation failed"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
#[path = "location_service_tests.rs"]
mod tests;
