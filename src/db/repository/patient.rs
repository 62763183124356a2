use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::{NewPatient, Patient};

const PATIENT_COLUMNS: &str = "id, full_name, phone, address, visit_date, right_eye_power,
     left_eye_power, notes, registered_by, created_at";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        full_name: row.get(1)?,
        phone: row.get(2)?,
        address: row.get(3)?,
        visit_date: row.get(4)?,
        right_eye_power: row.get(5)?,
        left_eye_power: row.get(6)?,
        notes: row.get(7)?,
        registered_by: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Insert a new patient; the store assigns the id.
pub fn insert_patient(
    conn: &Connection,
    patient: &NewPatient,
    registered_by: Option<i64>,
) -> Result<Patient, DatabaseError> {
    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO patients (full_name, phone, address, visit_date, right_eye_power,
         left_eye_power, notes, registered_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            patient.full_name,
            patient.phone,
            patient.address,
            patient.visit_date,
            patient.right_eye_power,
            patient.left_eye_power,
            patient.notes,
            registered_by,
            created_at,
        ],
    )?;

    Ok(Patient {
        id: conn.last_insert_rowid(),
        full_name: patient.full_name.clone(),
        phone: patient.phone.clone(),
        address: patient.address.clone(),
        visit_date: patient.visit_date,
        right_eye_power: patient.right_eye_power.clone(),
        left_eye_power: patient.left_eye_power.clone(),
        notes: patient.notes.clone(),
        registered_by,
        created_at,
    })
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
        params![id],
        patient_from_row,
    )
    .optional()
    .map_err(Into::into)
}

/// All patients, newest registration first.
pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt.query_map([], patient_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Overwrite every mutable column. Returns `false` if the row is gone.
pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<bool, DatabaseError> {
    let rows_affected = conn.execute(
        "UPDATE patients SET
            full_name = ?2,
            phone = ?3,
            address = ?4,
            visit_date = ?5,
            right_eye_power = ?6,
            left_eye_power = ?7,
            notes = ?8
         WHERE id = ?1",
        params![
            patient.id,
            patient.full_name,
            patient.phone,
            patient.address,
            patient.visit_date,
            patient.right_eye_power,
            patient.left_eye_power,
            patient.notes,
        ],
    )?;
    Ok(rows_affected > 0)
}

pub fn delete_patient(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let rows_affected = conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?;
    Ok(rows_affected > 0)
}

pub fn count_patients(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
    Ok(count)
}
