use sqlx::MySqlPool;
use tracing::{debug, error, info};

use super::StoreError;
use crate::model::attendance::{AttendanceRecord, NewAttendanceEvent};

const SELECT_RECORDS: &str = r#"
    SELECT id, employee_id, kind, clocked_at, remarks, location
    FROM attendance
"#;

pub async fn snapshot(pool: &MySqlPool) -> Result<Vec<AttendanceRecord>, StoreError> {
    // one statement, so InnoDB hands back a consistent read
    let records = sqlx::query_as::<_, AttendanceRecord>(SELECT_RECORDS)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to read attendance snapshot");
            StoreError::from(e)
        })?;

    debug!(count = records.len(), "Attendance snapshot loaded");
    Ok(records)
}

pub async fn events_for(
    pool: &MySqlPool,
    employee_id: u64,
) -> Result<Vec<AttendanceRecord>, StoreError> {
    let sql = format!("{SELECT_RECORDS} WHERE employee_id = ? ORDER BY clocked_at DESC, id DESC");

    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(employee_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to read employee attendance");
            StoreError::from(e)
        })
}

pub async fn append(
    pool: &MySqlPool,
    event: NewAttendanceEvent,
) -> Result<AttendanceRecord, StoreError> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendance (employee_id, kind, clocked_at, remarks, location)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(event.employee_id)
    .bind(event.kind.as_ref())
    .bind(event.timestamp)
    .bind(event.remarks.as_deref())
    .bind(event.location.as_deref())
    .execute(pool)
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = event.employee_id, "Failed to append attendance event");
        StoreError::from(e)
    })?;

    Ok(event.into_record(result.last_insert_id()))
}

pub async fn delete(pool: &MySqlPool, id: u64) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete attendance event");
            StoreError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id));
    }

    Ok(())
}

pub async fn reset(pool: &MySqlPool) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM attendance")
        .execute(pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to clear attendance log");
            StoreError::from(e)
        })?;

    info!(removed = result.rows_affected(), "Attendance log cleared");
    Ok(result.rows_affected())
}
