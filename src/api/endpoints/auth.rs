//! Authentication endpoints.
//!
//! - `POST /api/auth/login`: exchange username/password for a credential
//! - `GET /api/auth/me`: the authenticated user
//! - `POST /api/auth/change-password`: self-service password change
//! - `POST /api/auth/reset-password`: admin reset of another account

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::endpoints::{run_blocking, MessageResponse};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::auth::{self, LoginResult};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub username: String,
    pub new_password: String,
}

/// `POST /api/auth/login`: `{token, user, expires_at}` or 401.
pub async fn login(
    State(ctx): State<ApiContext>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResult>, ApiError> {
    let Json(request) = payload?;
    let username = request.username;

    // MutexGuard is !Send, drop before .await via block scope
    {
        let mut limiter = ctx
            .login_limiter
            .lock()
            .map_err(|_| ApiError::Internal("login limiter lock".into()))?;
        limiter
            .check(&username)
            .map_err(|retry_after| ApiError::RateLimited { retry_after })?;
    }

    let attempt_username = username.clone();
    let result = run_blocking(&ctx, move |core| {
        Ok(auth::login(core, &attempt_username, &request.password)?)
    })
    .await;

    if let Ok(mut limiter) = ctx.login_limiter.lock() {
        match &result {
            Ok(_) => limiter.clear(&username),
            Err(ApiError::InvalidCredentials) => limiter.record_failure(&username),
            Err(_) => {}
        }
    }

    result.map(Json)
}

/// `GET /api/auth/me`
pub async fn me(Extension(user): Extension<UserContext>) -> Json<UserContext> {
    Json(user)
}

/// `POST /api/auth/change-password`
pub async fn change_password(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    run_blocking(&ctx, move |core| {
        Ok(auth::change_password(
            core,
            user.id,
            &request.current_password,
            &request.new_password,
        )?)
    })
    .await?;
    Ok(Json(MessageResponse::new("Password changed")))
}

/// `POST /api/auth/reset-password` (admin)
pub async fn reset_password(
    State(ctx): State<ApiContext>,
    Extension(admin): Extension<UserContext>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    let username = request.username.clone();
    run_blocking(&ctx, move |core| {
        Ok(auth::reset_password(
            core,
            &request.username,
            &request.new_password,
        )?)
    })
    .await?;
    tracing::info!(by = %admin.username, target = %username, "Admin password reset");
    Ok(Json(MessageResponse::new(format!("Password reset for {username}"))))
}
