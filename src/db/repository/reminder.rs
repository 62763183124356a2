use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::{Reminder, ReminderStatus, ReminderType};

const REMINDER_COLUMNS: &str = "id, patient_id, type, date, status, created_at";

type ReminderRow = (String, i64, String, NaiveDate, String, DateTime<Utc>);

fn read_row(row: &Row<'_>) -> rusqlite::Result<ReminderRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn reminder_from_row(row: ReminderRow) -> Result<Reminder, DatabaseError> {
    let (id, patient_id, reminder_type, date, status, created_at) = row;
    Ok(Reminder {
        id,
        patient_id,
        reminder_type: ReminderType::from_str(&reminder_type)?,
        date,
        status: ReminderStatus::from_str(&status)?,
        created_at,
    })
}

pub fn insert_reminder(conn: &Connection, reminder: &Reminder) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reminders (id, patient_id, type, date, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            reminder.id,
            reminder.patient_id,
            reminder.reminder_type.as_str(),
            reminder.date,
            reminder.status.as_str(),
            reminder.created_at,
        ],
    )
    .map_err(|e| DatabaseError::from_insert(e, "reminder id already exists"))?;
    Ok(())
}

pub fn get_reminder(conn: &Connection, id: &str) -> Result<Option<Reminder>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?1"),
            params![id],
            read_row,
        )
        .optional()?;
    row.map(reminder_from_row).transpose()
}

/// All reminders by ascending date; same-date rows keep insertion order.
pub fn list_reminders(conn: &Connection) -> Result<Vec<Reminder>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders ORDER BY date ASC, rowid ASC"
    ))?;
    let rows = stmt
        .query_map([], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(reminder_from_row).collect()
}

pub fn list_reminders_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Reminder>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders WHERE patient_id = ?1
         ORDER BY date ASC, rowid ASC"
    ))?;
    let rows = stmt
        .query_map(params![patient_id], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(reminder_from_row).collect()
}

/// Set the status column. Returns `false` if no such reminder.
pub fn set_reminder_status(
    conn: &Connection,
    id: &str,
    status: ReminderStatus,
) -> Result<bool, DatabaseError> {
    let rows_affected = conn.execute(
        "UPDATE reminders SET status = ?2 WHERE id = ?1",
        params![id, status.as_str()],
    )?;
    Ok(rows_affected > 0)
}

pub fn delete_reminder(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    let rows_affected = conn.execute("DELETE FROM reminders WHERE id = ?1", params![id])?;
    Ok(rows_affected > 0)
}
