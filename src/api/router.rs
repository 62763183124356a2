//! API router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//!
//! Middleware stack per route group (outermost → innermost):
//! Extension(ApiContext) → Auth validator → Audit logger → Handler.
//! Public routes skip the auth validator. The whole router is wrapped in
//! a permissive CORS layer and a `Cache-Control: no-store` header layer.

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the clinic API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    // Layers are applied from bottom (innermost) to top (outermost).
    // Extension must be outermost so all middleware can access ApiContext.
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/auth/me", get(endpoints::auth::me))
        .route("/auth/change-password", post(endpoints::auth::change_password))
        .route("/home", get(endpoints::home::dashboard))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::get)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::delete),
        )
        .route("/patients/:id/history", get(endpoints::patients::history))
        .route(
            "/invoices",
            get(endpoints::invoices::list).post(endpoints::invoices::create),
        )
        .route(
            "/invoices/:id",
            get(endpoints::invoices::get).delete(endpoints::invoices::delete),
        )
        .route(
            "/reminders",
            get(endpoints::reminders::list).post(endpoints::reminders::create),
        )
        .route("/reminders/:id/complete", put(endpoints::reminders::complete))
        .route("/reminders/:id", delete(endpoints::reminders::delete))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    let admin = Router::new()
        .route(
            "/users",
            get(endpoints::users::list).post(endpoints::users::create),
        )
        .route("/users/:id", delete(endpoints::users::delete))
        .route("/auth/reset-password", post(endpoints::auth::reset_password))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .layer(axum::Extension(ctx.clone()));

    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", protected)
        .nest("/api", admin)
        .nest("/api", public)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
}
