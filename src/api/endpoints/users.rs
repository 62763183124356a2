//! Staff account administration (admin only).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::api::endpoints::{parse_id, run_blocking, MessageResponse};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::auth;
use crate::db;
use crate::models::{NewUser, User};

/// `GET /api/users`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<User>>, ApiError> {
    let conn = ctx.core.lock_db()?;
    Ok(Json(db::list_users(&conn)?))
}

/// `POST /api/users`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(admin): Extension<UserContext>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(new_user) = payload?;
    let user = run_blocking(&ctx, move |core| Ok(auth::create_user(core, &new_user)?))
    .await?;
    tracing::info!(user_id = user.id, by = %admin.username, "Account created by admin");
    Ok((StatusCode::CREATED, Json(user)))
}

/// `DELETE /api/users/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(admin): Extension<UserContext>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&raw_id, "user")?;
    let conn = ctx.core.lock_db()?;
    auth::delete_user(&conn, admin.id, id)?;
    Ok(Json(MessageResponse::new("User deleted")))
}
