use crate::api::attendance::{
    EventListResponse, ResetQuery, RosterResponse, ScanRequest, ShiftHistoryResponse, ShiftQuery,
};
use crate::model::attendance::{AttendanceRecord, EventKind};
use crate::model::employee::EmployeeRef;
use crate::model::roster::{ActiveRosterEntry, AnomalyReport, Reconciliation, ShiftRecord};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staff Attendance API",
        version = "0.1.0",
        description = r#"
## Staff attendance

Records clock-in / clock-out scans and manual entries for hospital staff, and derives
two views from the raw log on every request:

- **Active roster**: who is on duty right now
- **Shift history**: completed shifts with their duration in hours

### Reconciliation rules
- Events are processed in timestamp order (ties by event id), whatever order they arrived in
- A second ClockIn while a session is open restarts the session (configurable)
- A ClockOut with no open session is ignored
- Events of employees missing from the directory are left out of both views

### Corrections
Deleting an event or resetting the log simply changes what the next read sees.
Both are destructive and have no undo.
"#,
    ),
    paths(
        crate::api::attendance::record_scan,
        crate::api::attendance::dashboard,
        crate::api::attendance::active_roster,
        crate::api::attendance::shift_history,
        crate::api::attendance::list_events,
        crate::api::attendance::employee_events,
        crate::api::attendance::delete_event,
        crate::api::attendance::reset_events
    ),
    components(
        schemas(
            ScanRequest,
            ShiftQuery,
            ResetQuery,
            EventKind,
            AttendanceRecord,
            EmployeeRef,
            ActiveRosterEntry,
            ShiftRecord,
            AnomalyReport,
            Reconciliation,
            EventListResponse,
            RosterResponse,
            ShiftHistoryResponse
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance scans, corrections and derived views"),
    )
)]
pub struct ApiDoc;
