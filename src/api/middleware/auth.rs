//! Bearer credential middleware.
//!
//! Extracts `Authorization: Bearer <token>`, verifies it through the Auth
//! Gate and injects `UserContext` into request extensions for downstream
//! handlers. `require_admin` additionally demands the admin role.

use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::auth;
use crate::models::Role;

/// Require a valid credential for any role.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match authenticate(req, next, None).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

/// Require a valid credential carrying the admin role.
pub async fn require_admin(req: Request<axum::body::Body>, next: Next) -> Response {
    match authenticate(req, next, Some(Role::Admin)).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn authenticate(
    mut req: Request<axum::body::Body>,
    next: Next,
    required_role: Option<Role>,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(auth::bearer_token);

    let claims = auth::authorize(ctx.core.signer(), token, required_role)?;

    req.extensions_mut().insert(UserContext::from(claims));

    Ok(next.run(req).await)
}
