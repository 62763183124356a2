//! Table-level store operations. Each function is a single statement
//! against the shared connection; there are no multi-row transactions.

pub mod invoice;
pub mod patient;
pub mod reminder;
pub mod user;

pub use invoice::*;
pub use patient::*;
pub use reminder::*;
pub use user::*;
