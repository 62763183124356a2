//! Signed, time-bounded bearer credentials (JWT compact form, HS256).
//!
//! No revocation list: a credential stays valid until `exp`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::CryptoError;
use crate::models::{Role, User};

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of an issued credential.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Random secret length when none is configured.
pub const SECRET_LENGTH: usize = 32;

/// Payload carried by a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// HMAC key used to sign and verify credentials. Zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: &[u8]) -> Result<Self, CryptoError> {
        if secret.is_empty() {
            return Err(CryptoError::InvalidKey);
        }
        Ok(Self {
            secret: secret.to_vec(),
        })
    }

    /// Signer with a per-process random secret. Credentials die with the process.
    pub fn random() -> Self {
        let secret: [u8; SECRET_LENGTH] = rand::random();
        Self {
            secret: secret.to_vec(),
        }
    }

    /// Issue a credential for `user`, expiring `TOKEN_TTL_HOURS` after `now`.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<(String, Claims), CryptoError> {
        let claims = Claims {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, CryptoError> {
        let header = Header {
            alg: "HS256".into(),
            typ: "JWT".into(),
        };
        let header_json = serde_json::to_vec(&header).map_err(|_| CryptoError::MalformedToken)?;
        let claims_json = serde_json::to_vec(claims).map_err(|_| CryptoError::MalformedToken)?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let signature = self.mac(signing_input.as_bytes())?.finalize().into_bytes();

        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Check structure, signature and expiry, in that order.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, CryptoError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CryptoError::MalformedToken);
        };

        let header: Header = decode_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(CryptoError::MalformedToken);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| CryptoError::MalformedToken)?;
        let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];
        self.mac(signing_input.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| CryptoError::BadSignature)?;

        let claims: Claims = decode_json(claims_b64)?;
        if claims.exp <= now.timestamp() {
            return Err(CryptoError::TokenExpired);
        }
        Ok(claims)
    }

    fn mac(&self, input: &[u8]) -> Result<HmacSha256, CryptoError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| CryptoError::InvalidKey)?;
        mac.update(input);
        Ok(mac)
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, CryptoError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| CryptoError::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| CryptoError::MalformedToken)
}
