use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Direction of a scan. Stored as its variant name ("ClockIn" / "ClockOut").
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    EnumString,
    Display,
    AsRefStr,
)]
pub enum EventKind {
    ClockIn,
    ClockOut,
}

impl EventKind {
    /// The kind a scan should take when the caller did not choose one.
    pub fn toggle_after(last: Option<EventKind>) -> EventKind {
        match last {
            Some(EventKind::ClockIn) => EventKind::ClockOut,
            _ => EventKind::ClockIn,
        }
    }
}

/// A row of the `attendance` table as the store hands it back. Nothing here is
/// trusted yet: the engine validates rows before sweeping them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 42,
        "employee_id": 7,
        "kind": "ClockIn",
        "timestamp": "2026-03-02T09:00:00",
        "remarks": "main gate",
        "location": "Ward B"
    })
)]
pub struct AttendanceRecord {
    #[schema(example = 42)]
    pub id: u64,

    #[schema(example = 7)]
    pub employee_id: u64,

    #[schema(example = "ClockIn")]
    pub kind: String,

    #[sqlx(rename = "clocked_at")]
    #[schema(example = "2026-03-02T09:00:00", value_type = Option<String>, format = "date-time")]
    pub timestamp: Option<NaiveDateTime>,

    #[schema(nullable = true)]
    pub remarks: Option<String>,

    /// Where the scan happened, if the gateway reports it
    #[schema(nullable = true)]
    pub location: Option<String>,
}

/// A validated attendance event. Immutable once created; corrections are a delete
/// followed by a new append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEvent {
    pub id: u64,
    pub employee_id: u64,
    pub kind: EventKind,
    pub timestamp: NaiveDateTime,
    pub remarks: Option<String>,
    pub location: Option<String>,
}

/// An event about to be appended; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewAttendanceEvent {
    pub employee_id: u64,
    pub kind: EventKind,
    pub timestamp: NaiveDateTime,
    pub remarks: Option<String>,
    pub location: Option<String>,
}

impl NewAttendanceEvent {
    pub fn into_record(self, id: u64) -> AttendanceRecord {
        AttendanceRecord {
            id,
            employee_id: self.employee_id,
            kind: self.kind.to_string(),
            timestamp: Some(self.timestamp),
            remarks: self.remarks,
            location: self.location,
        }
    }
}
