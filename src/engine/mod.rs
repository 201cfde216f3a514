//! Attendance reconciliation: turns a snapshot of the raw clock-in/clock-out log
//! into the active roster and the shift history.
//!
//! Nothing here performs I/O or keeps state between calls. Every mutation of the
//! log is reflected by running [`reconcile`] again on a fresh snapshot.

pub mod duration;
mod reconcile;

use std::collections::HashMap;

use derive_more::Display;
use strum_macros::{Display as StrumDisplay, EnumString};

use crate::model::employee::EmployeeRef;

pub use reconcile::reconcile;

/// Read-only view of the employee directory.
pub trait EmployeeLookup {
    fn lookup(&self, employee_id: u64) -> Option<&EmployeeRef>;
}

impl EmployeeLookup for HashMap<u64, EmployeeRef> {
    fn lookup(&self, employee_id: u64) -> Option<&EmployeeRef> {
        self.get(&employee_id)
    }
}

/// What to do with a ClockIn that arrives while the employee already has an open
/// session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, StrumDisplay)]
#[strum(serialize_all = "snake_case")]
pub enum DuplicateClockInPolicy {
    /// The newer ClockIn replaces the open one; the older is abandoned.
    #[default]
    LatestWins,
    /// The open session is kept; the newer ClockIn is ignored.
    EarliestWins,
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ReconcileError {
    #[display(fmt = "invalid attendance event {}: {}", id, reason)]
    InvalidEvent { id: u64, reason: String },
}

impl std::error::Error for ReconcileError {}
