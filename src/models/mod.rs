pub mod enums;
pub mod invoice;
pub mod patient;
pub mod reminder;
pub mod user;

pub use enums::*;
pub use invoice::*;
pub use patient::*;
pub use reminder::*;
pub use user::*;

/// A request payload failed a field-level check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Reject empty or whitespace-only required text.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(())
}
