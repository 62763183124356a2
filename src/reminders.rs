//! Reminder Tracker: the pending follow-up queue and the pending → completed
//! transition.

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{NewReminder, Reminder, ReminderStatus, ReminderType, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("Invalid reminder: {0}")]
    Validation(#[from] ValidationError),
    #[error("Reminder not found: {0}")]
    NotFound(String),
    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),
}

/// A pending reminder annotated relative to the `as_of` date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingReminder {
    #[serde(flatten)]
    pub reminder: Reminder,
    pub overdue: bool,
    pub days_until: i64,
}

/// Pending reminders only, ascending by date. Ties keep input order.
pub fn list_pending(reminders: &[Reminder], as_of: NaiveDate) -> Vec<PendingReminder> {
    let mut pending: Vec<PendingReminder> = reminders
        .iter()
        .filter(|r| r.is_pending())
        .map(|r| PendingReminder {
            reminder: r.clone(),
            overdue: r.date < as_of,
            days_until: (r.date - as_of).num_days(),
        })
        .collect();
    // sort_by_key is stable
    pending.sort_by_key(|p| p.reminder.date);
    pending
}

/// Schedule a follow-up. New reminders are always pending.
pub fn create_reminder(
    conn: &Connection,
    patient_id: i64,
    reminder_type: ReminderType,
    date: NaiveDate,
) -> Result<Reminder, ReminderError> {
    let reminder = Reminder {
        id: Uuid::new_v4().to_string(),
        patient_id,
        reminder_type,
        date,
        status: ReminderStatus::Pending,
        created_at: Utc::now(),
    };
    db::insert_reminder(conn, &reminder)?;
    tracing::info!(reminder_id = %reminder.id, patient_id, kind = %reminder_type, "Reminder created");
    Ok(reminder)
}

/// Create a reminder for an existing patient.
pub fn schedule_for_patient(conn: &Connection, new: &NewReminder) -> Result<Reminder, ReminderError> {
    if db::get_patient(conn, new.patient_id)?.is_none() {
        return Err(ValidationError::new("patient_id", "no such patient").into());
    }
    create_reminder(conn, new.patient_id, new.reminder_type, new.date)
}

/// Mark a reminder completed. Re-completing succeeds without change.
pub fn complete_reminder(conn: &Connection, id: &str) -> Result<Reminder, ReminderError> {
    let mut reminder =
        db::get_reminder(conn, id)?.ok_or_else(|| ReminderError::NotFound(id.to_string()))?;

    if reminder.status == ReminderStatus::Completed {
        tracing::debug!(reminder_id = %id, "Reminder already completed");
        return Ok(reminder);
    }

    if !db::set_reminder_status(conn, id, ReminderStatus::Completed)? {
        return Err(ReminderError::NotFound(id.to_string()));
    }
    reminder.status = ReminderStatus::Completed;
    tracing::info!(reminder_id = %id, "Reminder completed");
    Ok(reminder)
}

pub fn delete_reminder(conn: &Connection, id: &str) -> Result<(), ReminderError> {
    if !db::delete_reminder(conn, id)? {
        return Err(ReminderError::NotFound(id.to_string()));
    }
    tracing::info!(reminder_id = %id, "Reminder deleted");
    Ok(())
}
