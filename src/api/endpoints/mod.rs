//! API endpoint handlers.
//!
//! Each module corresponds to a page of the clinic UI. Handlers lock the
//! store for one short operation and delegate to the domain modules.

pub mod auth;
pub mod health;
pub mod home;
pub mod invoices;
pub mod patients;
pub mod reminders;
pub mod users;

use chrono::NaiveDate;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Body returned by delete endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parse an integer path id (patients, users).
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {what} ID: {raw}")))
}

/// The calendar date reminders and the dashboard are measured against.
/// Stored dates are plain `YYYY-MM-DD`, compared with the UTC date.
pub(crate) fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Run password hashing work off the async workers. The closure locks the
/// store itself, only around reads and writes.
pub(crate) async fn run_blocking<T, F>(ctx: &ApiContext, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&CoreState) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let core = ctx.core.clone();
    tokio::task::spawn_blocking(move || f(&core))
        .await
        .map_err(|e| ApiError::Internal(format!("Blocking task failed: {e}")))?
}
