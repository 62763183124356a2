//! Reminder endpoints.
//!
//! `GET /api/reminders?status=pending` returns the annotated pending queue
//! (`overdue`, `days_until`) relative to today's UTC date; any other
//! listing returns stored reminders by date.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::api::endpoints::{today, MessageResponse};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::{NewReminder, Reminder, ReminderStatus};
use crate::reminders;

#[derive(Deserialize)]
pub struct ReminderListQuery {
    pub status: Option<String>,
}

/// `GET /api/reminders?status=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<ReminderListQuery>,
) -> Result<Response, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse::<ReminderStatus>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid reminder status: {s}")))
        })
        .transpose()?;

    let all = {
        let conn = ctx.core.lock_db()?;
        db::list_reminders(&conn)?
    };

    let response = match status {
        Some(ReminderStatus::Pending) => {
            Json(reminders::list_pending(&all, today())).into_response()
        }
        Some(ReminderStatus::Completed) => {
            let completed: Vec<Reminder> = all
                .into_iter()
                .filter(|r| r.status == ReminderStatus::Completed)
                .collect();
            Json(completed).into_response()
        }
        None => Json(all).into_response(),
    };
    Ok(response)
}

/// `POST /api/reminders`: always created pending.
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewReminder>, JsonRejection>,
) -> Result<(StatusCode, Json<Reminder>), ApiError> {
    let Json(new_reminder) = payload?;
    let conn = ctx.core.lock_db()?;
    let reminder = reminders::schedule_for_patient(&conn, &new_reminder)?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

/// `PUT /api/reminders/:id/complete`
pub async fn complete(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Reminder>, ApiError> {
    let conn = ctx.core.lock_db()?;
    Ok(Json(reminders::complete_reminder(&conn, &id)?))
}

/// `DELETE /api/reminders/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let conn = ctx.core.lock_db()?;
    reminders::delete_reminder(&conn, &id)?;
    Ok(Json(MessageResponse::new("Reminder deleted")))
}
