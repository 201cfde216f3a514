use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{StoreError, sort_newest_first};
use crate::model::attendance::{AttendanceRecord, NewAttendanceEvent};

#[derive(Default)]
struct LogState {
    records: Vec<AttendanceRecord>,
    last_id: u64,
}

/// Process-local attendance log. Readers clone the whole log under the read lock,
/// so a snapshot never observes a half-applied delete or reset.
#[derive(Default)]
pub struct MemoryLog {
    state: RwLock<LogState>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LogState>, StoreError> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LogState>, StoreError> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }

    pub fn snapshot(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.read()?.records.clone())
    }

    pub fn events_for(&self, employee_id: u64) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut records: Vec<_> = self
            .read()?
            .records
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    pub fn append(&self, event: NewAttendanceEvent) -> Result<AttendanceRecord, StoreError> {
        let mut state = self.write()?;
        state.last_id += 1;
        let record = event.into_record(state.last_id);
        state.records.push(record.clone());
        Ok(record)
    }

    /// Inserts a record as-is, keeping its id, malformed or not.
    #[cfg(test)]
    pub fn insert_raw(&self, record: AttendanceRecord) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.last_id = state.last_id.max(record.id);
        state.records.push(record);
        Ok(())
    }

    pub fn delete(&self, id: u64) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let before = state.records.len();
        state.records.retain(|r| r.id != id);

        if state.records.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    pub fn reset(&self) -> Result<u64, StoreError> {
        let mut state = self.write()?;
        let removed = state.records.len() as u64;
        state.records.clear();
        Ok(removed)
    }
}
