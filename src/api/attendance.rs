use std::str::FromStr;

use actix_web::{HttpResponse, web};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::config::Config;
use crate::engine::{self, EmployeeLookup};
use crate::error::ApiError;
use crate::model::attendance::{AttendanceRecord, EventKind, NewAttendanceEvent};
use crate::model::roster::{ActiveRosterEntry, AnomalyReport, Reconciliation, ShiftRecord};
use crate::store::directory::DirectorySource;
use crate::store::{EventStore, sort_newest_first};
use crate::utils::timestamp;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Required; must exist in the employee directory
    #[schema(example = 7)]
    pub employee_id: Option<u64>,

    /// Omit to toggle from the employee's latest event
    #[serde(default, alias = "type")]
    #[schema(example = "ClockIn", nullable = true)]
    pub kind: Option<EventKind>,

    /// Omit for a live scan; set for a manual (possibly back-dated) entry
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    #[schema(example = "2026-03-02T09:00", value_type = Option<String>)]
    pub timestamp: Option<NaiveDateTime>,

    #[schema(example = "forgot badge", nullable = true)]
    pub remarks: Option<String>,

    #[schema(example = "Main gate", nullable = true)]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ShiftQuery {
    /// Only shifts of this employee
    #[schema(example = 7)]
    pub employee_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ResetQuery {
    /// Must be `true`; the reset cannot be undone
    #[schema(example = true)]
    pub confirm: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct EventListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub total: usize,
}

#[derive(Serialize, ToSchema)]
pub struct RosterResponse {
    pub data: Vec<ActiveRosterEntry>,
    #[schema(example = 1)]
    pub total: usize,
}

#[derive(Serialize, ToSchema)]
pub struct ShiftHistoryResponse {
    pub data: Vec<ShiftRecord>,
    #[schema(example = 1)]
    pub total: usize,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Runs the engine over fresh snapshots of the log and the directory.
async fn reconcile_now(
    store: &EventStore,
    directory: &DirectorySource,
    config: &Config,
) -> Result<Reconciliation, ApiError> {
    let (records, directory) = futures::try_join!(store.snapshot(), directory.snapshot())?;
    debug!(
        events = records.len(),
        employees = directory.len(),
        "Reconciling attendance"
    );

    let outcome = engine::reconcile(&records, &*directory, config.duplicate_clock_in_policy)
        .map_err(|e| {
            error!(error = %e, "Attendance log contains an invalid event");
            ApiError::from(e)
        })?;

    report_anomalies(&outcome.anomalies);
    Ok(outcome)
}

fn report_anomalies(anomalies: &AnomalyReport) {
    if anomalies.is_clean() {
        return;
    }

    warn!(
        duplicate_clock_ins = anomalies.duplicate_clock_ins,
        orphaned_clock_outs = anomalies.orphaned_clock_outs,
        unknown_employee_events = anomalies.unknown_employee_events,
        unknown_employee_ids = ?anomalies.unknown_employee_ids,
        "Attendance anomalies absorbed"
    );
}

/// Record a scan or a manual entry
///
/// Without `kind` the event toggles from the employee's latest one. The read and the
/// append are separate store calls, so two simultaneous scans for one employee can
/// both become ClockIn; reconciliation absorbs that as a duplicate ClockIn.
#[utoipa::path(
    post,
    path = "/api/attendance/scan",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Event recorded", body = Object, example = json!({
            "message": "ClockIn recorded",
            "data": {
                "id": 42,
                "employee_id": 7,
                "kind": "ClockIn",
                "timestamp": "2026-03-02T09:00:00",
                "remarks": null,
                "location": "Main gate"
            }
        })),
        (status = 400, description = "Employee ID missing or malformed body", body = Object, example = json!({
            "message": "Employee ID is required"
        })),
        (status = 404, description = "Employee not in the directory", body = Object, example = json!({
            "message": "Invalid employee id"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn record_scan(
    store: web::Data<EventStore>,
    directory: web::Data<DirectorySource>,
    payload: web::Json<ScanRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();

    let employee_id = payload
        .employee_id
        .ok_or_else(|| ApiError::BadRequest("Employee ID is required".to_string()))?;

    let directory = directory.snapshot().await?;
    let employee = directory.lookup(employee_id).ok_or_else(|| {
        warn!(employee_id, "Scan refused: employee not in directory");
        ApiError::NotFound("Invalid employee id".to_string())
    })?;

    let kind = match payload.kind {
        Some(kind) => kind,
        None => {
            let latest = store
                .events_for(employee_id)
                .await?
                .first()
                .and_then(|r| EventKind::from_str(&r.kind).ok());
            EventKind::toggle_after(latest)
        }
    };

    let manual = payload.timestamp.is_some();
    let event = NewAttendanceEvent {
        employee_id,
        kind,
        timestamp: payload.timestamp.unwrap_or_else(timestamp::now_to_minute),
        remarks: non_blank(payload.remarks),
        location: non_blank(payload.location),
    };

    let record = store.append(event).await?;

    info!(
        id = record.id,
        employee_id,
        employee = %employee.full_name(),
        kind = %kind,
        manual,
        "Attendance recorded"
    );

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("{kind} recorded"),
        "data": record
    })))
}

/// Active roster and shift history in one call
#[utoipa::path(
    get,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Current reconciliation", body = Reconciliation),
        (status = 500, description = "Invalid event in the log, or store unavailable", body = Object, example = json!({
            "message": "invalid attendance event 12: missing timestamp"
        }))
    ),
    tag = "Attendance"
)]
pub async fn dashboard(
    store: web::Data<EventStore>,
    directory: web::Data<DirectorySource>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let outcome = reconcile_now(&store, &directory, &config).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Staff currently on duty
#[utoipa::path(
    get,
    path = "/api/attendance/active",
    responses(
        (status = 200, description = "Active roster", body = RosterResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn active_roster(
    store: web::Data<EventStore>,
    directory: web::Data<DirectorySource>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let data = reconcile_now(&store, &directory, &config).await?.active_roster;

    Ok(HttpResponse::Ok().json(RosterResponse {
        total: data.len(),
        data,
    }))
}

/// Completed shifts, most recent first
#[utoipa::path(
    get,
    path = "/api/attendance/shifts",
    params(ShiftQuery),
    responses(
        (status = 200, description = "Shift history", body = ShiftHistoryResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn shift_history(
    store: web::Data<EventStore>,
    directory: web::Data<DirectorySource>,
    config: web::Data<Config>,
    query: web::Query<ShiftQuery>,
) -> Result<HttpResponse, ApiError> {
    let mut data = reconcile_now(&store, &directory, &config).await?.shift_history;

    if let Some(employee_id) = query.employee_id {
        data.retain(|s| s.employee.employee_id == employee_id);
    }

    Ok(HttpResponse::Ok().json(ShiftHistoryResponse {
        total: data.len(),
        data,
    }))
}

/// Raw attendance log, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/events",
    responses(
        (status = 200, description = "All recorded events", body = EventListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_events(store: web::Data<EventStore>) -> Result<HttpResponse, ApiError> {
    let mut data = store.snapshot().await?;
    sort_newest_first(&mut data);

    Ok(HttpResponse::Ok().json(EventListResponse {
        total: data.len(),
        data,
    }))
}

/// Raw attendance log of one employee, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Events of the employee", body = EventListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn employee_events(
    store: web::Data<EventStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let data = store.events_for(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(EventListResponse {
        total: data.len(),
        data,
    }))
}

/// Delete one attendance event
#[utoipa::path(
    delete,
    path = "/api/attendance/events/{id}",
    params(
        ("id", Path, description = "Attendance event ID")
    ),
    responses(
        (status = 200, description = "Event deleted", body = Object, example = json!({
            "message": "Record deleted"
        })),
        (status = 404, description = "No such event", body = Object, example = json!({
            "message": "Attendance record 42 not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn delete_event(
    store: web::Data<EventStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    store.delete(id).await?;

    info!(id, "Attendance event deleted");
    Ok(HttpResponse::Ok().json(json!({ "message": "Record deleted" })))
}

/// Clear the whole attendance log
#[utoipa::path(
    delete,
    path = "/api/attendance/events",
    params(ResetQuery),
    responses(
        (status = 200, description = "Log cleared", body = Object, example = json!({
            "message": "Attendance log cleared",
            "removed": 120
        })),
        (status = 400, description = "Missing confirmation", body = Object, example = json!({
            "message": "Resetting the attendance log requires confirm=true"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn reset_events(
    store: web::Data<EventStore>,
    query: web::Query<ResetQuery>,
) -> Result<HttpResponse, ApiError> {
    if query.confirm != Some(true) {
        return Err(ApiError::BadRequest(
            "Resetting the attendance log requires confirm=true".to_string(),
        ));
    }

    let removed = store.reset().await?;

    warn!(removed, "Attendance log reset");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance log cleared",
        "removed": removed
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::EmployeeRef;
    use crate::routes::{self, RateLimiters};
    use crate::store::memory::MemoryLog;
    use actix_web::dev::{Service, ServiceResponse};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::Value;
    use std::net::SocketAddr;

    fn test_config() -> Config {
        Config::from_lookup(|key| match key {
            "SERVER_ADDR" => Some("127.0.0.1:0".to_string()),
            "STORE_BACKEND" => Some("memory".to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn staff(id: u64, first_name: &str) -> EmployeeRef {
        EmployeeRef {
            employee_id: id,
            first_name: first_name.to_string(),
            last_name: "Tamang".to_string(),
            role: "Nurse".to_string(),
            department: Some("Emergency".to_string()),
            ward: Some("Ward B".to_string()),
        }
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    async fn app(
        store: EventStore,
    ) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
        let config = test_config();
        let limiters = RateLimiters::new(&config);
        app_with(store, config, limiters).await
    }

    async fn app_with(
        store: EventStore,
        config: Config,
        limiters: RateLimiters,
    ) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
        test::init_service(
            App::new()
                .app_data(web::Data::new(store))
                .app_data(web::Data::new(DirectorySource::fixed([
                    staff(7, "Asha"),
                    staff(8, "Bikash"),
                ])))
                .app_data(web::Data::new(config.clone()))
                .configure(|cfg| routes::configure(cfg, &config, &limiters)),
        )
        .await
    }

    async fn scan<S>(app: &S, body: Value) -> (StatusCode, Value)
    where
        S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    {
        let req = test::TestRequest::post()
            .uri("/api/attendance/scan")
            .peer_addr(peer())
            .set_json(body)
            .to_request();
        let resp = test::call_service(app, req).await;
        let status = resp.status();
        (status, test::read_body_json(resp).await)
    }

    async fn get_json<S>(app: &S, uri: &str) -> (StatusCode, Value)
    where
        S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    {
        let req = test::TestRequest::get().uri(uri).peer_addr(peer()).to_request();
        let resp = test::call_service(app, req).await;
        let status = resp.status();
        (status, test::read_body_json(resp).await)
    }

    async fn delete<S>(app: &S, uri: &str) -> (StatusCode, Value)
    where
        S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    {
        let req = test::TestRequest::delete().uri(uri).peer_addr(peer()).to_request();
        let resp = test::call_service(app, req).await;
        let status = resp.status();
        (status, test::read_body_json(resp).await)
    }

    #[actix_web::test]
    async fn scan_without_kind_toggles() {
        let app = app(EventStore::Memory(MemoryLog::new())).await;

        let (status, body) = scan(&app, json!({ "employee_id": 7 })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["kind"], "ClockIn");

        let (_, body) = scan(&app, json!({ "employee_id": 7 })).await;
        assert_eq!(body["data"]["kind"], "ClockOut");
        assert_eq!(body["message"], "ClockOut recorded");

        let (_, body) = scan(&app, json!({ "employee_id": 7 })).await;
        assert_eq!(body["data"]["kind"], "ClockIn");
    }

    #[actix_web::test]
    async fn manual_entries_build_a_shift() {
        let app = app(EventStore::Memory(MemoryLog::new())).await;

        let (status, _) = scan(
            &app,
            json!({ "employee_id": 7, "kind": "ClockOut", "timestamp": "2026-03-02T17:00" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // back-dated ClockIn arriving after its ClockOut
        let (status, _) = scan(
            &app,
            json!({ "employee_id": 7, "type": "ClockIn", "timestamp": "2026-03-02T09:05", "remarks": "  " }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get_json(&app, "/api/attendance/shifts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["employee_id"], 7);
        assert_eq!(body["data"][0]["first_name"], "Asha");
        assert_eq!(body["data"][0]["duration_hours"], "7.92");
        assert_eq!(body["data"][0]["start_timestamp"], "2026-03-02T09:05:00");

        let (_, body) = get_json(&app, "/api/attendance/active").await;
        assert_eq!(body["total"], 0);
    }

    #[actix_web::test]
    async fn scan_is_refused_for_unknown_or_missing_employee() {
        let app = app(EventStore::Memory(MemoryLog::new())).await;

        let (status, body) = scan(&app, json!({ "employee_id": 99 })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invalid employee id");

        let (status, body) = scan(&app, json!({ "remarks": "no id" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Employee ID is required");

        let (_, body) = get_json(&app, "/api/attendance/events").await;
        assert_eq!(body["total"], 0);
    }

    #[actix_web::test]
    async fn dashboard_reflects_deletes_and_reset() {
        let app = app(EventStore::Memory(MemoryLog::new())).await;

        scan(&app, json!({ "employee_id": 7, "kind": "ClockIn", "timestamp": "2026-03-02T09:00" })).await;
        scan(&app, json!({ "employee_id": 7, "kind": "ClockOut", "timestamp": "2026-03-02T17:00" })).await;
        scan(&app, json!({ "employee_id": 8, "kind": "ClockIn", "timestamp": "2026-03-02T08:00" })).await;

        let (status, body) = get_json(&app, "/api/attendance").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shift_history"][0]["duration_hours"], "8.00");
        assert_eq!(body["active_roster"][0]["employee_id"], 8);
        assert_eq!(body["active_roster"][0]["source_event_id"], 3);

        // dropping the ClockOut reopens employee 7's session
        let (status, _) = delete(&app, "/api/attendance/events/2").await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = get_json(&app, "/api/attendance").await;
        assert_eq!(body["shift_history"].as_array().unwrap().len(), 0);
        assert_eq!(body["active_roster"].as_array().unwrap().len(), 2);

        let (status, body) = delete(&app, "/api/attendance/events/2").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Attendance record 2 not found");

        let (status, _) = delete(&app, "/api/attendance/events").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = delete(&app, "/api/attendance/events?confirm=true").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], 2);

        let (_, body) = get_json(&app, "/api/attendance").await;
        assert_eq!(body["shift_history"].as_array().unwrap().len(), 0);
        assert_eq!(body["active_roster"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn shift_filter_and_employee_log() {
        let app = app(EventStore::Memory(MemoryLog::new())).await;

        scan(&app, json!({ "employee_id": 7, "kind": "ClockIn", "timestamp": "2026-03-02T09:00" })).await;
        scan(&app, json!({ "employee_id": 8, "kind": "ClockIn", "timestamp": "2026-03-02T10:00" })).await;
        scan(&app, json!({ "employee_id": 7, "kind": "ClockOut", "timestamp": "2026-03-02T12:00" })).await;
        scan(&app, json!({ "employee_id": 8, "kind": "ClockOut", "timestamp": "2026-03-02T18:00" })).await;

        let (_, body) = get_json(&app, "/api/attendance/shifts").await;
        assert_eq!(body["total"], 2);
        // most recent start first
        assert_eq!(body["data"][0]["employee_id"], 8);

        let (_, body) = get_json(&app, "/api/attendance/shifts?employee_id=7").await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["duration_hours"], "3.00");

        let (_, body) = get_json(&app, "/api/attendance/employee/8").await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["data"][0]["kind"], "ClockOut");
        assert_eq!(body["data"][1]["kind"], "ClockIn");
    }

    #[actix_web::test]
    async fn invalid_stored_event_fails_the_views() {
        let log = MemoryLog::new();
        log.insert_raw(AttendanceRecord {
            id: 12,
            employee_id: 7,
            kind: "ClockIn".to_string(),
            timestamp: None,
            remarks: None,
            location: None,
        })
        .unwrap();
        let app = app(EventStore::Memory(log)).await;

        let (status, body) = get_json(&app, "/api/attendance").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "invalid attendance event 12: missing timestamp");

        // the raw log still lists it so it can be deleted
        let (status, body) = get_json(&app, "/api/attendance/events").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["id"], 12);

        let (status, _) = delete(&app, "/api/attendance/events/12").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get_json(&app, "/api/attendance").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[actix_web::test]
    async fn malformed_input_is_answered_as_json() {
        let app = app(EventStore::Memory(MemoryLog::new())).await;

        let (status, body) = scan(&app, json!({ "employee_id": 7, "timestamp": "yesterday" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("invalid timestamp 'yesterday'"));

        let (status, body) = scan(&app, json!({ "employee_id": 7, "kind": "Lunch" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        let (status, body) = delete(&app, "/api/attendance/events?confirm=yes").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("true"));

        let (status, body) = delete(&app, "/api/attendance/events/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        let (_, body) = get_json(&app, "/api/attendance/events").await;
        assert_eq!(body["total"], 0);
    }

    #[actix_web::test]
    async fn workers_share_one_scan_quota() {
        let config = Config::from_lookup(|key| match key {
            "SERVER_ADDR" => Some("127.0.0.1:0".to_string()),
            "STORE_BACKEND" => Some("memory".to_string()),
            "RATE_SCAN_PER_MIN" => Some("1".to_string()),
            _ => None,
        })
        .unwrap();
        let limiters = RateLimiters::new(&config);

        // two app instances stand in for two server workers
        let first = app_with(EventStore::Memory(MemoryLog::new()), config.clone(), limiters.clone()).await;
        let second = app_with(EventStore::Memory(MemoryLog::new()), config, limiters).await;

        let (status, _) = scan(&first, json!({ "employee_id": 7 })).await;
        assert_eq!(status, StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/attendance/scan")
            .peer_addr(peer())
            .set_json(json!({ "employee_id": 7 }))
            .to_request();
        let resp = test::call_service(&second, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[actix_web::test]
    async fn repeated_clock_in_keeps_one_open_session() {
        let app = app(EventStore::Memory(MemoryLog::new())).await;

        // what two racing toggled scans leave behind
        scan(&app, json!({ "employee_id": 7, "kind": "ClockIn", "timestamp": "2026-03-02T09:00" })).await;
        scan(&app, json!({ "employee_id": 7, "kind": "ClockIn", "timestamp": "2026-03-02T09:00" })).await;

        let (_, body) = get_json(&app, "/api/attendance/active").await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["source_event_id"], 2);

        let (_, body) = scan(&app, json!({ "employee_id": 7 })).await;
        assert_eq!(body["data"]["kind"], "ClockOut");
    }
}
