//! The attendance event log and the employee directory it is reconciled against.

pub mod directory;
pub mod memory;
mod mysql;

use derive_more::Display;
use sqlx::MySqlPool;

use crate::model::attendance::{AttendanceRecord, NewAttendanceEvent};
use memory::MemoryLog;

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),

    #[display(fmt = "attendance record {} not found", _0)]
    NotFound(u64),

    #[display(fmt = "employee directory unavailable: {}", _0)]
    DirectoryUnavailable(String),

    #[display(fmt = "in-memory attendance log is poisoned")]
    Poisoned,
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

/// Append-only attendance log. Reads always return a whole, consistent snapshot;
/// derived views are never stored here.
pub enum EventStore {
    MySql(MySqlPool),
    Memory(MemoryLog),
}

impl EventStore {
    /// Every record in the log, in no particular order.
    pub async fn snapshot(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        match self {
            EventStore::MySql(pool) => mysql::snapshot(pool).await,
            EventStore::Memory(log) => log.snapshot(),
        }
    }

    /// Records of one employee, newest first.
    pub async fn events_for(&self, employee_id: u64) -> Result<Vec<AttendanceRecord>, StoreError> {
        match self {
            EventStore::MySql(pool) => mysql::events_for(pool, employee_id).await,
            EventStore::Memory(log) => log.events_for(employee_id),
        }
    }

    pub async fn append(&self, event: NewAttendanceEvent) -> Result<AttendanceRecord, StoreError> {
        match self {
            EventStore::MySql(pool) => mysql::append(pool, event).await,
            EventStore::Memory(log) => log.append(event),
        }
    }

    pub async fn delete(&self, id: u64) -> Result<(), StoreError> {
        match self {
            EventStore::MySql(pool) => mysql::delete(pool, id).await,
            EventStore::Memory(log) => log.delete(id),
        }
    }

    /// Empties the log and returns how many records were removed.
    pub async fn reset(&self) -> Result<u64, StoreError> {
        match self {
            EventStore::MySql(pool) => mysql::reset(pool).await,
            EventStore::Memory(log) => log.reset(),
        }
    }
}

/// Newest first; rows without a timestamp sink to the end.
pub(crate) fn sort_newest_first(records: &mut [AttendanceRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}
