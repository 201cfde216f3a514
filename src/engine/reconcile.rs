use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use super::duration::elapsed_hours;
use super::{DuplicateClockInPolicy, EmployeeLookup, ReconcileError};
use crate::model::attendance::{AttendanceEvent, AttendanceRecord, EventKind};
use crate::model::roster::{ActiveRosterEntry, AnomalyReport, Reconciliation, ShiftRecord};

/// An employee's unmatched ClockIn while the sweep runs.
struct Session<'a> {
    employee_id: u64,
    open_event: &'a AttendanceEvent,
}

/// Derive the active roster and shift history from a snapshot of the log.
///
/// The result depends only on the snapshot: input order is irrelevant and the wall
/// clock is never consulted. A record that cannot be ordered (no timestamp) or
/// classified (unknown kind) fails the whole call, because sweeping around it would
/// silently pair the wrong events.
pub fn reconcile<D>(
    records: &[AttendanceRecord],
    directory: &D,
    policy: DuplicateClockInPolicy,
) -> Result<Reconciliation, ReconcileError>
where
    D: EmployeeLookup + ?Sized,
{
    let mut events = records
        .iter()
        .map(validate)
        .collect::<Result<Vec<_>, _>>()?;

    events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

    Ok(sweep(&events, directory, policy))
}

pub fn validate(record: &AttendanceRecord) -> Result<AttendanceEvent, ReconcileError> {
    let timestamp = record.timestamp.ok_or_else(|| ReconcileError::InvalidEvent {
        id: record.id,
        reason: "missing timestamp".to_string(),
    })?;

    let kind = EventKind::from_str(&record.kind).map_err(|_| ReconcileError::InvalidEvent {
        id: record.id,
        reason: format!("unknown kind '{}'", record.kind),
    })?;

    Ok(AttendanceEvent {
        id: record.id,
        employee_id: record.employee_id,
        kind,
        timestamp,
        remarks: record.remarks.clone(),
        location: record.location.clone(),
    })
}

// `events` must already be in (timestamp, id) order.
fn sweep<D>(
    events: &[AttendanceEvent],
    directory: &D,
    policy: DuplicateClockInPolicy,
) -> Reconciliation
where
    D: EmployeeLookup + ?Sized,
{
    let mut open: BTreeMap<u64, Session<'_>> = BTreeMap::new();
    let mut shift_history = Vec::new();
    let mut anomalies = AnomalyReport::default();
    let mut unknown_ids = BTreeSet::new();

    for event in events {
        let employee = directory.lookup(event.employee_id);
        if employee.is_none() {
            anomalies.unknown_employee_events += 1;
            unknown_ids.insert(event.employee_id);
        }

        match (open.entry(event.employee_id), event.kind) {
            (Entry::Vacant(slot), EventKind::ClockIn) => {
                slot.insert(Session {
                    employee_id: event.employee_id,
                    open_event: event,
                });
            }
            (Entry::Occupied(mut slot), EventKind::ClockIn) => {
                anomalies.duplicate_clock_ins += 1;
                if policy == DuplicateClockInPolicy::LatestWins {
                    slot.get_mut().open_event = event;
                }
            }
            (Entry::Occupied(slot), EventKind::ClockOut) => {
                let session = slot.remove();
                if let Some(employee) = employee {
                    shift_history.push(ShiftRecord {
                        employee: employee.clone(),
                        start_timestamp: session.open_event.timestamp,
                        end_timestamp: event.timestamp,
                        duration_hours: elapsed_hours(
                            session.open_event.timestamp,
                            event.timestamp,
                        ),
                        start_event_id: session.open_event.id,
                        end_event_id: event.id,
                    });
                }
            }
            (Entry::Vacant(_), EventKind::ClockOut) => {
                anomalies.orphaned_clock_outs += 1;
            }
        }
    }

    let active_roster = open
        .into_values()
        .filter_map(|session| {
            directory
                .lookup(session.employee_id)
                .map(|employee| ActiveRosterEntry {
                    employee: employee.clone(),
                    session_start: session.open_event.timestamp,
                    source_event_id: session.open_event.id,
                })
        })
        .collect();

    // most recent first
    shift_history.sort_by(|a, b| {
        b.start_timestamp
            .cmp(&a.start_timestamp)
            .then(b.start_event_id.cmp(&a.start_event_id))
    });

    anomalies.unknown_employee_ids = unknown_ids.into_iter().collect();

    Reconciliation {
        active_roster,
        shift_history,
        anomalies,
    }
}
