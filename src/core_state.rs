//! Process-wide application state.
//!
//! `CoreState` owns the single store connection, the credential signer and
//! the password hasher. It is built once at startup, wrapped in `Arc`, and
//! injected into the API router.

use std::sync::{Mutex, MutexGuard, OnceLock};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::crypto::{CryptoError, PasswordHasher, TokenSigner};
use crate::db;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    /// The one store connection. Never hold the guard across `.await`.
    db: Mutex<Connection>,
    signer: TokenSigner,
    hasher: PasswordHasher,
    decoy_hash: OnceLock<String>,
}

impl CoreState {
    pub fn new(conn: Connection, signer: TokenSigner, hasher: PasswordHasher) -> Self {
        Self {
            db: Mutex::new(conn),
            signer,
            hasher,
            decoy_hash: OnceLock::new(),
        }
    }

    /// Open (and migrate) the configured database and build the signer.
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let conn = db::open_database(&config.db_path)?;
        tracing::info!(path = %config.db_path.display(), "Database opened");

        let signer = match &config.jwt_secret {
            Some(secret) => TokenSigner::new(secret.as_bytes()).map_err(CoreError::Crypto)?,
            None => {
                tracing::warn!(
                    "No credential secret configured; using a random key. \
                     Issued credentials will not survive a restart."
                );
                TokenSigner::random()
            }
        };

        Ok(Self::new(
            conn,
            signer,
            PasswordHasher::new(config.pbkdf2_iterations),
        ))
    }

    /// In-memory store with a random signer.
    pub fn in_memory(hasher: PasswordHasher) -> Result<Self, CoreError> {
        let conn = db::open_memory_database()?;
        Ok(Self::new(conn, TokenSigner::random(), hasher))
    }

    // ── Store access ────────────────────────────────────────

    /// Lock the store connection for a single operation.
    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.db.lock().map_err(|_| CoreError::LockPoisoned)
    }

    // ── Credentials ─────────────────────────────────────────

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Hash checked when a login names no account, so an unknown username
    /// costs the same PBKDF2 run as a wrong password.
    pub fn decoy_hash(&self) -> &str {
        self.decoy_hash.get_or_init(|| self.hasher.hash("no-such-account"))
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Credential setup error: {0}")]
    Crypto(CryptoError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_config(db_path: PathBuf, secret: Option<&str>) -> AppConfig {
        AppConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            db_path,
            jwt_secret: secret.map(String::from),
            admin_password: None,
            pbkdf2_iterations: 1_000,
        }
    }

    #[test]
    fn in_memory_state_is_migrated() {
        let core = CoreState::in_memory(PasswordHasher::new(1_000)).unwrap();
        let conn = core.lock_db().unwrap();
        assert_eq!(db::count_users(&conn).unwrap(), 0);
        assert_eq!(db::count_patients(&conn).unwrap(), 0);
    }

    #[test]
    fn from_config_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("clinic.db");
        let core = CoreState::from_config(&test_config(path.clone(), Some("secret"))).unwrap();
        assert!(path.exists());
        assert_eq!(core.hasher().iterations(), 1_000);
    }

    #[test]
    fn configured_secret_is_stable_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path().join("clinic.db"), Some("shared-secret"));
        let user = crate::models::User {
            id: 3,
            username: "staff1".into(),
            role: crate::models::Role::Staff,
            created_at: chrono::Utc::now(),
        };

        let now = chrono::Utc::now();
        let token = {
            let first = CoreState::from_config(&config).unwrap();
            first.signer().issue(&user, now).unwrap().0
        };
        let second = CoreState::from_config(&config).unwrap();
        assert_eq!(second.signer().verify(&token, now).unwrap().id, 3);
    }

    #[test]
    fn decoy_hash_uses_configured_work_factor() {
        let core = CoreState::in_memory(PasswordHasher::new(1_500)).unwrap();
        assert!(core.decoy_hash().starts_with("pbkdf2-sha256$1500$"));
        assert_eq!(core.decoy_hash(), core.decoy_hash());
    }

    #[test]
    fn lock_is_released_between_operations() {
        let core = CoreState::in_memory(PasswordHasher::new(1_000)).unwrap();
        drop(core.lock_db().unwrap());
        assert!(core.lock_db().is_ok());
    }
}
