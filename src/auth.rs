//! Auth Gate: password login, credential verification, role checks and
//! staff-account administration.
//!
//! Credentials are verified on every protected request; nothing is cached
//! server-side. Password changes do not invalidate credentials already
//! issued (they expire on their own after 24 hours).
//!
//! PBKDF2 work never runs while the store lock is held: account lookups and
//! writes each take the lock briefly, hashing happens in between.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::core_state::{CoreError, CoreState};
use crate::crypto::{verify_password, Claims, CryptoError, TokenSigner};
use crate::db::{self, DatabaseError};
use crate::models::{require_text, NewUser, Role, User, ValidationError};

/// Minimum accepted length for a new or reset password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Username created by the first-start bootstrap.
pub const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Insufficient role for this action")]
    Forbidden,
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Credential error: {0}")]
    Crypto(CryptoError),
}

/// Successful login: the credential plus the public user view.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user: SessionUser,
    pub expires_at: i64,
}

/// The identity fields a credential carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<&Claims> for SessionUser {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.id,
            username: claims.username.clone(),
            role: claims.role,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Login / authorize
// ═══════════════════════════════════════════════════════════

/// Verify `username`/`password` and issue a credential.
///
/// Unknown user and wrong password are indistinguishable to the caller,
/// including in cost: an unknown username is checked against a decoy hash.
pub fn login(core: &CoreState, username: &str, password: &str) -> Result<LoginResult, AuthError> {
    let record = {
        let conn = core.lock_db()?;
        db::get_user_by_username(&conn, username)?
    };

    let Some(record) = record else {
        let _ = verify_password(password, core.decoy_hash());
        tracing::info!(username, "Login rejected");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_stored(password, &record.password_hash)? {
        tracing::info!(username, "Login rejected");
        return Err(AuthError::InvalidCredentials);
    }

    let (token, claims) = core
        .signer()
        .issue(&record.user, Utc::now())
        .map_err(AuthError::Crypto)?;

    tracing::info!(user_id = record.user.id, role = %record.user.role, "Login succeeded");

    Ok(LoginResult {
        token,
        user: SessionUser::from(&claims),
        expires_at: claims.exp,
    })
}

/// Check a presented credential and an optional role requirement.
pub fn authorize(
    signer: &TokenSigner,
    credential: Option<&str>,
    required_role: Option<Role>,
) -> Result<Claims, AuthError> {
    authorize_at(signer, credential, required_role, Utc::now())
}

pub fn authorize_at(
    signer: &TokenSigner,
    credential: Option<&str>,
    required_role: Option<Role>,
    now: DateTime<Utc>,
) -> Result<Claims, AuthError> {
    let token = credential.ok_or(AuthError::Unauthenticated)?;
    let claims = signer.verify(token, now).map_err(|e| {
        tracing::debug!(error = %e, "Credential rejected");
        AuthError::Unauthenticated
    })?;

    if let Some(required) = required_role {
        if !claims.role.satisfies(required) {
            return Err(AuthError::Forbidden);
        }
    }
    Ok(claims)
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn verify_stored(password: &str, encoded: &str) -> Result<bool, AuthError> {
    verify_password(password, encoded).map_err(|e| {
        tracing::error!(error = %e, "Stored password hash unusable");
        AuthError::Crypto(e)
    })
}

fn validate_new_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new(
            "password",
            format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// Account administration
// ═══════════════════════════════════════════════════════════

/// Create a staff or admin account.
pub fn create_user(core: &CoreState, new_user: &NewUser) -> Result<User, AuthError> {
    require_text("username", &new_user.username)?;
    if new_user.username.trim() != new_user.username {
        return Err(ValidationError::new("username", "must not start or end with spaces").into());
    }
    validate_new_password(&new_user.password)?;

    let hash = core.hasher().hash(&new_user.password);
    let conn = core.lock_db()?;
    let user = db::insert_user(&conn, &new_user.username, &hash, new_user.role).map_err(|e| {
        match e {
            DatabaseError::ConstraintViolation(_) => {
                AuthError::Validation(ValidationError::new("username", "already exists"))
            }
            other => AuthError::Store(other),
        }
    })?;

    tracing::info!(user_id = user.id, role = %user.role, "User created");
    Ok(user)
}

/// Delete an account. Refuses to delete the acting user or the last admin.
pub fn delete_user(conn: &Connection, acting_user_id: i64, target_id: i64) -> Result<(), AuthError> {
    if acting_user_id == target_id {
        return Err(ValidationError::new("id", "you cannot delete your own account").into());
    }

    let target = db::get_user(conn, target_id)?
        .ok_or_else(|| AuthError::UserNotFound(target_id.to_string()))?;

    if target.user.role == Role::Admin && db::count_admins(conn)? <= 1 {
        return Err(ValidationError::new("id", "cannot delete the last admin account").into());
    }

    if !db::delete_user(conn, target_id)? {
        return Err(AuthError::UserNotFound(target_id.to_string()));
    }
    tracing::info!(user_id = target_id, by = acting_user_id, "User deleted");
    Ok(())
}

/// Self-service password change; the current password must match.
pub fn change_password(
    core: &CoreState,
    user_id: i64,
    current_password: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    let record = {
        let conn = core.lock_db()?;
        db::get_user(&conn, user_id)?
    }
    .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;

    if !verify_stored(current_password, &record.password_hash)? {
        return Err(AuthError::InvalidCredentials);
    }
    validate_new_password(new_password)?;

    let hash = core.hasher().hash(new_password);
    let conn = core.lock_db()?;
    if !db::update_password_hash(&conn, user_id, &hash)? {
        return Err(AuthError::UserNotFound(user_id.to_string()));
    }
    tracing::info!(user_id, "Password changed");
    Ok(())
}

/// Admin reset of another account's password, by username.
pub fn reset_password(core: &CoreState, username: &str, new_password: &str) -> Result<(), AuthError> {
    let record = {
        let conn = core.lock_db()?;
        db::get_user_by_username(&conn, username)?
    }
    .ok_or_else(|| AuthError::UserNotFound(username.to_string()))?;
    validate_new_password(new_password)?;

    let hash = core.hasher().hash(new_password);
    let conn = core.lock_db()?;
    if !db::update_password_hash(&conn, record.user.id, &hash)? {
        return Err(AuthError::UserNotFound(username.to_string()));
    }
    tracing::info!(user_id = record.user.id, "Password reset");
    Ok(())
}

/// Create the `admin` account when the users table is empty.
///
/// Returns the created user, or `None` if accounts already exist.
pub fn ensure_bootstrap_admin(core: &CoreState, password: &str) -> Result<Option<User>, AuthError> {
    let existing = {
        let conn = core.lock_db()?;
        db::count_users(&conn)?
    };
    if existing > 0 {
        return Ok(None);
    }
    let user = create_user(
        core,
        &NewUser {
            username: BOOTSTRAP_ADMIN_USERNAME.into(),
            password: password.into(),
            role: Role::Admin,
        },
    )?;
    tracing::warn!("Created bootstrap admin account '{BOOTSTRAP_ADMIN_USERNAME}'");
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PasswordHasher;
    use chrono::Duration;
    use std::sync::Arc;
    use std::time::{Duration as StdDuration, Instant};

    fn core() -> CoreState {
        CoreState::in_memory(PasswordHasher::new(1_000)).unwrap()
    }

    fn seed(core: &CoreState, username: &str, password: &str, role: Role) -> User {
        create_user(
            core,
            &NewUser {
                username: username.into(),
                password: password.into(),
                role,
            },
        )
        .unwrap()
    }

    #[test]
    fn login_returns_credential_with_stored_role() {
        let core = core();
        let staff = seed(&core, "reception", "front-desk-1", Role::Staff);

        let result = login(&core, "reception", "front-desk-1").unwrap();
        assert_eq!(result.user.id, staff.id);
        assert_eq!(result.user.role, Role::Staff);

        let claims = authorize(core.signer(), Some(&result.token), None).unwrap();
        assert_eq!(claims.role, Role::Staff);
        assert_eq!(claims.username, "reception");
        assert_eq!(claims.exp, result.expires_at);
    }

    #[test]
    fn wrong_password_is_invalid_credentials() {
        let core = core();
        seed(&core, "reception", "front-desk-1", Role::Staff);

        let err = login(&core, "reception", "front-desk-2").unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn unknown_or_differently_cased_user_is_invalid_credentials() {
        let core = core();
        seed(&core, "reception", "front-desk-1", Role::Staff);

        assert!(matches!(
            login(&core, "nobody", "front-desk-1").unwrap_err(),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            login(&core, "Reception", "front-desk-1").unwrap_err(),
            AuthError::InvalidCredentials
        ));
    }

    #[test]
    fn unknown_user_costs_a_full_hash() {
        let core = CoreState::in_memory(PasswordHasher::new(100_000)).unwrap();
        seed(&core, "reception", "front-desk-1", Role::Staff);
        // Warm the decoy so both timings below cover one PBKDF2 run.
        let _ = core.decoy_hash();

        let started = Instant::now();
        assert!(login(&core, "reception", "wrong-pass").is_err());
        let wrong_password = started.elapsed();

        let started = Instant::now();
        assert!(login(&core, "ghost", "wrong-pass").is_err());
        let unknown_user = started.elapsed();

        assert!(
            unknown_user * 3 >= wrong_password,
            "unknown user took {unknown_user:?}, wrong password took {wrong_password:?}"
        );
    }

    #[test]
    fn login_does_not_hold_store_lock_while_hashing() {
        let core = Arc::new(CoreState::in_memory(PasswordHasher::new(200_000)).unwrap());
        seed(&core, "reception", "front-desk-1", Role::Staff);

        let started = Instant::now();
        assert!(login(&core, "reception", "wrong-pass").is_err());
        let hash_cost = started.elapsed();

        let worker = {
            let core = Arc::clone(&core);
            std::thread::spawn(move || login(&core, "reception", "wrong-pass").is_err())
        };

        let mut longest_wait = StdDuration::ZERO;
        while !worker.is_finished() {
            let started = Instant::now();
            drop(core.lock_db().unwrap());
            longest_wait = longest_wait.max(started.elapsed());
            std::thread::sleep(StdDuration::from_millis(1));
        }
        assert!(worker.join().unwrap());
        assert!(
            longest_wait < hash_cost / 2,
            "store lock waited {longest_wait:?}, hash costs {hash_cost:?}"
        );
    }

    #[test]
    fn authorize_rejects_missing_garbage_and_expired() {
        let signer = TokenSigner::new(b"auth-test-secret").unwrap();
        assert!(matches!(
            authorize(&signer, None, None).unwrap_err(),
            AuthError::Unauthenticated
        ));
        assert!(matches!(
            authorize(&signer, Some("not.a.token"), None).unwrap_err(),
            AuthError::Unauthenticated
        ));

        let user = User {
            id: 1,
            username: "a".into(),
            role: Role::Admin,
            created_at: Utc::now(),
        };
        let issued_at = Utc::now() - Duration::hours(25);
        let (token, _) = signer.issue(&user, issued_at).unwrap();
        assert!(matches!(
            authorize(&signer, Some(&token), None).unwrap_err(),
            AuthError::Unauthenticated
        ));
    }

    #[test]
    fn authorize_enforces_required_role() {
        let core = core();
        seed(&core, "staff1", "password-1", Role::Staff);
        seed(&core, "boss", "password-2", Role::Admin);

        let staff_token = login(&core, "staff1", "password-1").unwrap().token;
        let admin_token = login(&core, "boss", "password-2").unwrap().token;
        let signer = core.signer();

        assert!(matches!(
            authorize(signer, Some(&staff_token), Some(Role::Admin)).unwrap_err(),
            AuthError::Forbidden
        ));
        assert!(authorize(signer, Some(&staff_token), Some(Role::Staff)).is_ok());
        assert!(authorize(signer, Some(&admin_token), Some(Role::Admin)).is_ok());
        assert!(authorize(signer, Some(&admin_token), Some(Role::Staff)).is_ok());
    }

    #[test]
    fn credential_survives_password_change_until_expiry() {
        let core = core();
        let user = seed(&core, "staff1", "password-1", Role::Staff);
        let token = login(&core, "staff1", "password-1").unwrap().token;

        change_password(&core, user.id, "password-1", "password-9").unwrap();

        assert!(authorize(core.signer(), Some(&token), None).is_ok());
        assert!(login(&core, "staff1", "password-9").is_ok());
        assert!(login(&core, "staff1", "password-1").is_err());
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn create_user_validates_and_rejects_duplicates() {
        let core = core();
        seed(&core, "staff1", "password-1", Role::Staff);

        let dup = create_user(
            &core,
            &NewUser {
                username: "staff1".into(),
                password: "password-2".into(),
                role: Role::Staff,
            },
        )
        .unwrap_err();
        assert!(matches!(dup, AuthError::Validation(ref v) if v.field == "username"));

        let short = create_user(
            &core,
            &NewUser {
                username: "staff2".into(),
                password: "short".into(),
                role: Role::Staff,
            },
        )
        .unwrap_err();
        assert!(matches!(short, AuthError::Validation(ref v) if v.field == "password"));
    }

    #[test]
    fn delete_user_protects_self_and_last_admin() {
        let core = core();
        let admin = seed(&core, "boss", "password-1", Role::Admin);
        let staff = seed(&core, "staff1", "password-2", Role::Staff);
        let second_admin = seed(&core, "boss2", "password-3", Role::Admin);
        let conn = core.lock_db().unwrap();

        assert!(matches!(
            delete_user(&conn, admin.id, admin.id).unwrap_err(),
            AuthError::Validation(_)
        ));

        delete_user(&conn, admin.id, second_admin.id).unwrap();
        // `boss` is now the only admin; staff cannot remove them either.
        assert!(matches!(
            delete_user(&conn, staff.id, admin.id).unwrap_err(),
            AuthError::Validation(_)
        ));

        delete_user(&conn, admin.id, staff.id).unwrap();
        assert!(matches!(
            delete_user(&conn, admin.id, staff.id).unwrap_err(),
            AuthError::UserNotFound(_)
        ));
    }

    #[test]
    fn change_password_requires_current_password() {
        let core = core();
        let user = seed(&core, "staff1", "password-1", Role::Staff);

        let err = change_password(&core, user.id, "wrong-pass", "password-2").unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = change_password(&core, user.id, "password-1", "short").unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[test]
    fn reset_password_by_username() {
        let core = core();
        seed(&core, "staff1", "password-1", Role::Staff);

        reset_password(&core, "staff1", "brand-new-pass").unwrap();
        assert!(login(&core, "staff1", "brand-new-pass").is_ok());

        assert!(matches!(
            reset_password(&core, "ghost", "brand-new-pass").unwrap_err(),
            AuthError::UserNotFound(_)
        ));
    }

    #[test]
    fn bootstrap_admin_only_on_empty_table() {
        let core = core();
        let created = ensure_bootstrap_admin(&core, "first-run-pass").unwrap();
        assert_eq!(created.unwrap().role, Role::Admin);

        let again = ensure_bootstrap_admin(&core, "first-run-pass").unwrap();
        assert!(again.is_none());
        assert!(login(&core, BOOTSTRAP_ADMIN_USERNAME, "first-run-pass").is_ok());
    }
}
