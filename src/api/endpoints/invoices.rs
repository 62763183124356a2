//! Invoice endpoints (Billing page).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::endpoints::MessageResponse;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::billing;
use crate::db;
use crate::models::{Invoice, NewInvoice};

#[derive(Deserialize)]
pub struct InvoiceListQuery {
    pub search: Option<String>,
    pub patient_id: Option<i64>,
}

/// `GET /api/invoices?search=&patient_id=`: newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    let conn = ctx.core.lock_db()?;
    let invoices = match query.patient_id {
        Some(patient_id) => db::list_invoices_for_patient(&conn, patient_id)?,
        None => db::list_invoices(&conn)?,
    };

    let invoices = match query.search.as_deref() {
        Some(term) if !term.trim().is_empty() => {
            let patients = db::list_patients(&conn)?;
            billing::search_invoices(invoices, &patients, term)
        }
        _ => invoices,
    };
    Ok(Json(invoices))
}

/// `POST /api/invoices`: totals are computed here; client totals are ignored.
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewInvoice>, JsonRejection>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    let Json(new_invoice) = payload?;
    let conn = ctx.core.lock_db()?;
    let invoice = billing::create_invoice(&conn, new_invoice)?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// `GET /api/invoices/:id`
pub async fn get(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, ApiError> {
    let conn = ctx.core.lock_db()?;
    Ok(Json(billing::get_invoice(&conn, &id)?))
}

/// `DELETE /api/invoices/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let conn = ctx.core.lock_db()?;
    billing::delete_invoice(&conn, &id)?;
    Ok(Json(MessageResponse::new("Invoice deleted")))
}
