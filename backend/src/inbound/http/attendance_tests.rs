//! Tests for the attendance handler.

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use chrono::{Duration, TimeZone, Utc};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::{AlertType, GuardProfile, PostId, Shift, ShiftStatus};
use crate::inbound::http::test_utils::{
    FieldOpsHarness, SIGN_IN_PATH, sign_in, sign_in_handler, test_session_middleware,
};

struct Scenario {
    harness: FieldOpsHarness,
    shift: Shift,
}

#[fixture]
fn scenario() -> Scenario {
    let start = Utc
        .with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("valid start");
    let harness = FieldOpsHarness::new(start + Duration::minutes(20));
    let shift = Shift {
        id: ShiftId::random(),
        guard_id: GuardId::random(),
        post_id: PostId::random(),
        start_time: start,
        end_time: start + Duration::hours(8),
        status: ShiftStatus::Scheduled,
    };
    harness.store.put_shift(shift.clone());
    harness.store.put_guard(GuardProfile {
        id: shift.guard_id,
        display_name: "Tomas Ek".to_owned(),
    });
    Scenario { harness, shift }
}

fn app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .route(SIGN_IN_PATH, web::post().to(sign_in_handler))
        .service(web::scope("/api/v1").service(record_attendance))
}

fn body(shift: &Shift, action: &str) -> Value {
    json!({
        "type": action,
        "guardId": shift.guard_id.to_string(),
        "shiftId": shift.id.to_string(),
        "latitude": 12.0,
        "longitude": 77.0
    })
}

#[rstest]
#[actix_web::test]
async fn late_check_in_returns_record_and_raises_alert(scenario: Scenario) {
    let app = actix_test::init_service(app(scenario.harness.state.clone())).await;
    let cookie = sign_in(&app, UserId::random(), None).await;

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/attendance")
        .cookie(cookie)
        .set_json(body(&scenario.shift, "check-in"))
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let payload: Value = actix_test::read_body_json(res).await;
    assert_eq!(payload["status"], "late");
    assert_eq!(payload["shiftId"], scenario.shift.id.to_string());
    assert_eq!(payload["checkInLat"], 12.0);
    assert!(payload["checkOutTime"].is_null());

    let alerts = scenario.harness.store.alerts_of(AlertType::LateArrival);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].message, "Guard Tomas Ek checked in 20 minutes late");
}

#[rstest]
#[actix_web::test]
async fn replayed_check_in_is_rejected_with_code(scenario: Scenario) {
    let app = actix_test::init_service(app(scenario.harness.state.clone())).await;
    let cookie = sign_in(&app, UserId::random(), None).await;

    for expected in [StatusCode::OK, StatusCode::BAD_REQUEST] {
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/attendance")
            .cookie(cookie.clone())
            .set_json(body(&scenario.shift, "check-in"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), expected);
        if expected == StatusCode::BAD_REQUEST {
            let error: Value = actix_test::read_body_json(res).await;
            assert_eq!(error["code"], "invalid_request");
            assert_eq!(error["details"]["code"], "already_checked_in");
        }
    }
    assert_eq!(scenario.harness.store.attendance_rows(), 1);
    assert_eq!(
        scenario
            .harness
            .store
            .alerts_of(AlertType::LateArrival)
            .len(),
        1
    );
}

#[rstest]
#[actix_web::test]
async fn check_out_without_check_in_is_a_bad_request(scenario: Scenario) {
    let app = actix_test::init_service(app(scenario.harness.state.clone())).await;
    let cookie = sign_in(&app, UserId::random(), None).await;
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/attendance")
        .cookie(cookie)
        .set_json(body(&scenario.shift, "check-out"))
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let error: Value = actix_test::read_body_json(res).await;
    assert_eq!(error["details"]["code"], "not_checked_in");
}

#[rstest]
#[actix_web::test]
async fn unknown_shift_is_not_found(scenario: Scenario) {
    let app = actix_test::init_service(app(scenario.harness.state.clone())).await;
    let cookie = sign_in(&app, UserId::random(), None).await;
    let mut payload = body(&scenario.shift, "check-in");
    payload["shiftId"] = json!(ShiftId::random().to_string());
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/attendance")
        .cookie(cookie)
        .set_json(payload)
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[case("clock-in", "unsupported_value")]
#[case("", "unsupported_value")]
#[actix_web::test]
async fn rejects_unknown_action(
    scenario: Scenario,
    #[case] action: &str,
    #[case] code: &str,
) {
    let app = actix_test::init_service(app(scenario.harness.state.clone())).await;
    let cookie = sign_in(&app, UserId::random(), None).await;
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/attendance")
        .cookie(cookie)
        .set_json(body(&scenario.shift, action))
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let error: Value = actix_test::read_body_json(res).await;
    assert_eq!(error["details"]["field"], "type");
    assert_eq!(error["details"]["code"], code);
}

#[rstest]
#[actix_web::test]
async fn missing_action_is_reported(scenario: Scenario) {
    let app = actix_test::init_service(app(scenario.harness.state.clone())).await;
    let cookie = sign_in(&app, UserId::random(), None).await;
    let mut payload = body(&scenario.shift, "check-in");
    payload
        .as_object_mut()
        .expect("object body")
        .remove("type");
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/attendance")
        .cookie(cookie)
        .set_json(payload)
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let error: Value = actix_test::read_body_json(res).await;
    assert_eq!(error["details"]["code"], "missing_field");
}
