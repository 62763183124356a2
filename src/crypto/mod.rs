pub mod password;
pub mod token;

pub use password::*;
pub use token::*;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Stored password hash is malformed")]
    MalformedHash,

    #[error("Unsupported password hash scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Credential is malformed")]
    MalformedToken,

    #[error("Credential signature is invalid")]
    BadSignature,

    #[error("Credential has expired")]
    TokenExpired,

    #[error("Signing key is unusable")]
    InvalidKey,
}
