use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::duration::serialize_hours;
use crate::model::employee::EmployeeRef;

/// Someone currently on duty.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(
    example = json!({
        "employee_id": 7,
        "first_name": "Asha",
        "last_name": "Rai",
        "role": "Nurse",
        "department": "Emergency",
        "ward": "Ward B",
        "session_start": "2026-03-02T09:00:00",
        "source_event_id": 42
    })
)]
pub struct ActiveRosterEntry {
    #[serde(flatten)]
    pub employee: EmployeeRef,

    #[schema(value_type = String, format = "date-time")]
    pub session_start: NaiveDateTime,

    /// Id of the ClockIn that opened the session
    pub source_event_id: u64,
}

/// One matched ClockIn/ClockOut pair.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(
    example = json!({
        "employee_id": 7,
        "first_name": "Asha",
        "last_name": "Rai",
        "role": "Nurse",
        "department": "Emergency",
        "ward": "Ward B",
        "start_timestamp": "2026-03-02T09:00:00",
        "end_timestamp": "2026-03-02T17:00:00",
        "duration_hours": "8.00",
        "start_event_id": 42,
        "end_event_id": 57
    })
)]
pub struct ShiftRecord {
    #[serde(flatten)]
    pub employee: EmployeeRef,

    #[schema(value_type = String, format = "date-time")]
    pub start_timestamp: NaiveDateTime,

    #[schema(value_type = String, format = "date-time")]
    pub end_timestamp: NaiveDateTime,

    #[serde(serialize_with = "serialize_hours")]
    #[schema(value_type = String, example = "8.00")]
    pub duration_hours: f64,

    pub start_event_id: u64,
    pub end_event_id: u64,
}

/// Irregularities absorbed during a sweep. They never change the views; they exist
/// so the caller can surface data-integrity problems.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AnomalyReport {
    /// ClockIns that arrived while a session was already open
    pub duplicate_clock_ins: usize,
    /// ClockOuts with no open session to close
    pub orphaned_clock_outs: usize,
    /// Events whose employee is missing from the directory
    pub unknown_employee_events: usize,
    pub unknown_employee_ids: Vec<u64>,
}

impl AnomalyReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_clock_ins == 0
            && self.orphaned_clock_outs == 0
            && self.unknown_employee_events == 0
    }
}

/// Both derived views for one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct Reconciliation {
    pub active_roster: Vec<ActiveRosterEntry>,
    pub shift_history: Vec<ShiftRecord>,
    pub anomalies: AnomalyReport,
}
