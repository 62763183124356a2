//! Invoice Engine: line-item totals, invoice creation and the Billing page
//! filters.

use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{require_text, Invoice, InvoiceItem, NewInvoice, Patient, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("Invalid invoice: {0}")]
    Validation(#[from] ValidationError),
    #[error("Invoice not found: {0}")]
    NotFound(String),
    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),
}

// ═══════════════════════════════════════════════════════════
// Totals
// ═══════════════════════════════════════════════════════════

/// Computed invoice amounts, at full precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub total: f64,
}

impl InvoiceTotals {
    /// Amount removed by the discount percentage.
    pub fn discount_amount(&self, discount_pct: f64) -> f64 {
        self.subtotal * discount_pct / 100.0
    }

    /// Tax added on top of the discounted base.
    pub fn tax_amount(&self, discount_pct: f64, tax_pct: f64) -> f64 {
        (self.subtotal - self.discount_amount(discount_pct)) * tax_pct / 100.0
    }
}

/// `subtotal = Σ quantity × price`, `total = subtotal × (1 − d/100) × (1 + t/100)`.
///
/// Percentages are not clamped. No rounding happens here; see
/// [`round_currency`] for display.
pub fn compute_totals(items: &[InvoiceItem], discount_pct: f64, tax_pct: f64) -> InvoiceTotals {
    let subtotal: f64 = items.iter().map(InvoiceItem::line_total).sum();
    let discounted = subtotal * (1.0 - discount_pct / 100.0);
    InvoiceTotals {
        subtotal,
        total: discounted * (1.0 + tax_pct / 100.0),
    }
}

/// Round to 2 decimal places. Presentation only; stored values keep full precision.
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ═══════════════════════════════════════════════════════════
// Invoice operations
// ═══════════════════════════════════════════════════════════

fn validate(conn: &Connection, new: &NewInvoice) -> Result<(), BillingError> {
    if new.items.is_empty() {
        return Err(ValidationError::new("items", "at least one item is required").into());
    }
    for item in &new.items {
        require_text("description", &item.description)?;
        item.validate()?;
    }
    if !new.discount.is_finite() {
        return Err(ValidationError::new("discount", "must be a number").into());
    }
    if !new.tax.is_finite() {
        return Err(ValidationError::new("tax", "must be a number").into());
    }
    if db::get_patient(conn, new.patient_id)?.is_none() {
        return Err(ValidationError::new("patient_id", "no such patient").into());
    }
    Ok(())
}

/// Validate, assign ids, compute totals and persist a new invoice.
///
/// Items arriving without an id get a fresh UUID.
pub fn create_invoice(conn: &Connection, new: NewInvoice) -> Result<Invoice, BillingError> {
    validate(conn, &new)?;

    let items: Vec<InvoiceItem> = new
        .items
        .into_iter()
        .map(|mut item| {
            if item.id.trim().is_empty() {
                item.id = Uuid::new_v4().to_string();
            }
            item
        })
        .collect();

    let totals = compute_totals(&items, new.discount, new.tax);
    let invoice = Invoice {
        id: Uuid::new_v4().to_string(),
        patient_id: new.patient_id,
        date: new.date,
        items,
        discount: new.discount,
        tax: new.tax,
        subtotal: totals.subtotal,
        total: totals.total,
        status: new.status,
        created_at: Utc::now(),
    };

    db::insert_invoice(conn, &invoice)?;
    tracing::info!(
        invoice_id = %invoice.id,
        patient_id = invoice.patient_id,
        items = invoice.items.len(),
        "Invoice created"
    );
    Ok(invoice)
}

pub fn get_invoice(conn: &Connection, id: &str) -> Result<Invoice, BillingError> {
    db::get_invoice(conn, id)?.ok_or_else(|| BillingError::NotFound(id.to_string()))
}

pub fn delete_invoice(conn: &Connection, id: &str) -> Result<(), BillingError> {
    if !db::delete_invoice(conn, id)? {
        return Err(BillingError::NotFound(id.to_string()));
    }
    tracing::info!(invoice_id = %id, "Invoice deleted");
    Ok(())
}

/// Billing page filter: patient name (case-insensitive) or invoice id.
/// Invoices whose patient no longer exists match on id only.
pub fn search_invoices(invoices: Vec<Invoice>, patients: &[Patient], term: &str) -> Vec<Invoice> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return invoices;
    }
    invoices
        .into_iter()
        .filter(|invoice| {
            invoice.id.to_lowercase().contains(&term)
                || patients
                    .iter()
                    .find(|p| p.id == invoice.patient_id)
                    .is_some_and(|p| p.full_name.to_lowercase().contains(&term))
        })
        .collect()
}
