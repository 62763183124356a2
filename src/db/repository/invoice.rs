use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::{Invoice, InvoiceItem, InvoiceStatus};

const INVOICE_COLUMNS: &str =
    "id, patient_id, date, items, discount, tax, subtotal, total, status, created_at";

// Raw column values; enum and JSON decoding happen outside the rusqlite closure.
struct InvoiceRow {
    id: String,
    patient_id: i64,
    date: NaiveDate,
    items: String,
    discount: f64,
    tax: f64,
    subtotal: f64,
    total: f64,
    status: String,
    created_at: DateTime<Utc>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<InvoiceRow> {
    Ok(InvoiceRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        date: row.get(2)?,
        items: row.get(3)?,
        discount: row.get(4)?,
        tax: row.get(5)?,
        subtotal: row.get(6)?,
        total: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn invoice_from_row(row: InvoiceRow) -> Result<Invoice, DatabaseError> {
    let items: Vec<InvoiceItem> =
        serde_json::from_str(&row.items).map_err(|e| DatabaseError::InvalidValue {
            field: "invoices.items".into(),
            reason: e.to_string(),
        })?;

    Ok(Invoice {
        id: row.id,
        patient_id: row.patient_id,
        date: row.date,
        items,
        discount: row.discount,
        tax: row.tax,
        subtotal: row.subtotal,
        total: row.total,
        status: InvoiceStatus::from_str(&row.status)?,
        created_at: row.created_at,
    })
}

pub fn insert_invoice(conn: &Connection, invoice: &Invoice) -> Result<(), DatabaseError> {
    let items = serde_json::to_string(&invoice.items).map_err(|e| DatabaseError::InvalidValue {
        field: "invoices.items".into(),
        reason: e.to_string(),
    })?;

    conn.execute(
        "INSERT INTO invoices (id, patient_id, date, items, discount, tax, subtotal, total,
         status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            invoice.id,
            invoice.patient_id,
            invoice.date,
            items,
            invoice.discount,
            invoice.tax,
            invoice.subtotal,
            invoice.total,
            invoice.status.as_str(),
            invoice.created_at,
        ],
    )
    .map_err(|e| DatabaseError::from_insert(e, "invoice id already exists"))?;
    Ok(())
}

pub fn get_invoice(conn: &Connection, id: &str) -> Result<Option<Invoice>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1"),
            params![id],
            read_row,
        )
        .optional()?;
    row.map(invoice_from_row).transpose()
}

/// All invoices, newest first.
pub fn list_invoices(conn: &Connection) -> Result<Vec<Invoice>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt
        .query_map([], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(invoice_from_row).collect()
}

pub fn list_invoices_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Invoice>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE patient_id = ?1
         ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt
        .query_map(params![patient_id], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(invoice_from_row).collect()
}

pub fn delete_invoice(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    let rows_affected = conn.execute("DELETE FROM invoices WHERE id = ?1", params![id])?;
    Ok(rows_affected > 0)
}
