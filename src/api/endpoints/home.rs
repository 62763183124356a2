//! Home dashboard endpoint.

use axum::extract::State;
use axum::Json;

use crate::api::endpoints::today;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::home::{self, HomeData};

/// `GET /api/home`: counters plus recent patients and upcoming reminders.
pub async fn dashboard(State(ctx): State<ApiContext>) -> Result<Json<HomeData>, ApiError> {
    let conn = ctx.core.lock_db()?;
    let data = home::fetch_home(&conn, today())?;
    Ok(Json(data))
}
