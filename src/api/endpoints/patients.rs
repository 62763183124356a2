//! Patient endpoints (Records + Registration pages).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::endpoints::{parse_id, MessageResponse};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::db;
use crate::models::{Invoice, NewPatient, Patient, PatientUpdate, Reminder};

#[derive(Deserialize)]
pub struct PatientListQuery {
    pub search: Option<String>,
}

#[derive(Serialize)]
pub struct PatientHistoryResponse {
    pub patient: Patient,
    pub invoices: Vec<Invoice>,
    pub reminders: Vec<Reminder>,
}

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Patient {id} not found"))
}

/// `GET /api/patients?search=`: newest registrations first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let mut patients = {
        let conn = ctx.core.lock_db()?;
        db::list_patients(&conn)?
    };
    if let Some(term) = query.search.as_deref() {
        patients.retain(|p| p.matches_search(term));
    }
    Ok(Json(patients))
}

/// `POST /api/patients`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let Json(new_patient) = payload?;
    new_patient.validate()?;

    let patient = {
        let conn = ctx.core.lock_db()?;
        db::insert_patient(&conn, &new_patient, Some(user.id))?
    };
    tracing::info!(patient_id = patient.id, by = %user.username, "Patient registered");
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /api/patients/:id`
pub async fn get(
    State(ctx): State<ApiContext>,
    Path(raw_id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_id(&raw_id, "patient")?;
    let conn = ctx.core.lock_db()?;
    let patient = db::get_patient(&conn, id)?.ok_or_else(|| not_found(id))?;
    Ok(Json(patient))
}

/// `PUT /api/patients/:id`: partial update, absent fields unchanged.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(raw_id): Path<String>,
    payload: Result<Json<PatientUpdate>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_id(&raw_id, "patient")?;
    let Json(changes) = payload?;
    changes.validate()?;

    let conn = ctx.core.lock_db()?;
    let mut patient = db::get_patient(&conn, id)?.ok_or_else(|| not_found(id))?;
    if changes.is_empty() {
        return Ok(Json(patient));
    }

    patient.apply(changes);
    if !db::update_patient(&conn, &patient)? {
        return Err(not_found(id));
    }
    tracing::info!(patient_id = id, "Patient updated");
    Ok(Json(patient))
}

/// `DELETE /api/patients/:id`: invoices and reminders are left in place.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&raw_id, "patient")?;
    let conn = ctx.core.lock_db()?;
    if !db::delete_patient(&conn, id)? {
        return Err(not_found(id));
    }
    tracing::info!(patient_id = id, "Patient deleted");
    Ok(Json(MessageResponse::new("Patient deleted")))
}

/// `GET /api/patients/:id/history`: the patient with their invoices and reminders.
pub async fn history(
    State(ctx): State<ApiContext>,
    Path(raw_id): Path<String>,
) -> Result<Json<PatientHistoryResponse>, ApiError> {
    let id = parse_id(&raw_id, "patient")?;
    let conn = ctx.core.lock_db()?;
    let patient = db::get_patient(&conn, id)?.ok_or_else(|| not_found(id))?;
    let invoices = db::list_invoices_for_patient(&conn, id)?;
    let reminders = db::list_reminders_for_patient(&conn, id)?;

    Ok(Json(PatientHistoryResponse {
        patient,
        invoices,
        reminders,
    }))
}
