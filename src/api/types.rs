//! Shared types for the API layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::core_state::CoreState;
use crate::crypto::Claims;
use crate::models::Role;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Wraps `CoreState` plus API-specific caches.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub login_limiter: Arc<Mutex<LoginLimiter>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self {
            core,
            login_limiter: Arc::new(Mutex::new(LoginLimiter::new())),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// User context: injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated user, injected into request extensions by the auth
/// middleware after the credential has been verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserContext {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for UserContext {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            username: claims.username,
            role: claims.role,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Login limiter: failed attempts per username
// ═══════════════════════════════════════════════════════════

const HOUR: Duration = Duration::from_secs(3600);

/// Sliding-window counter of failed logins, keyed by username.
pub struct LoginLimiter {
    failures: HashMap<String, Vec<Instant>>,
    per_minute: u32,
    per_hour: u32,
}

impl LoginLimiter {
    pub fn new() -> Self {
        Self::with_limits(10, 50)
    }

    pub fn with_limits(per_minute: u32, per_hour: u32) -> Self {
        Self {
            failures: HashMap::new(),
            per_minute,
            per_hour,
        }
    }

    /// `Ok(())` if another attempt is allowed, otherwise
    /// `Err(retry_after_secs)`.
    pub fn check(&mut self, username: &str) -> Result<(), u64> {
        self.check_at(username, Instant::now())
    }

    pub fn check_at(&mut self, username: &str, now: Instant) -> Result<(), u64> {
        let Some(entries) = self.failures.get_mut(username) else {
            return Ok(());
        };

        // Clean entries older than 1 hour
        entries.retain(|ts| now.duration_since(*ts) < HOUR);
        if entries.is_empty() {
            self.failures.remove(username);
            return Ok(());
        }

        let last_minute = entries
            .iter()
            .filter(|ts| now.duration_since(**ts) < Duration::from_secs(60))
            .count() as u32;
        if last_minute >= self.per_minute {
            return Err(60);
        }
        if entries.len() as u32 >= self.per_hour {
            return Err(3600);
        }
        Ok(())
    }

    pub fn record_failure(&mut self, username: &str) {
        self.record_failure_at(username, Instant::now());
    }

    /// Also sweeps usernames whose failures have all aged out, so attempts
    /// against many distinct names cannot grow the table without bound.
    pub fn record_failure_at(&mut self, username: &str, now: Instant) {
        self.failures.retain(|_, entries| {
            entries.retain(|ts| now.duration_since(*ts) < HOUR);
            !entries.is_empty()
        });
        self.failures
            .entry(username.to_string())
            .or_default()
            .push(now);
    }

    pub fn clear(&mut self, username: &str) {
        self.failures.remove(username);
    }

    pub fn tracked_usernames(&self) -> usize {
        self.failures.len()
    }
}

impl Default for LoginLimiter {
    fn default() -> Self {
        Self::new()
    }
}
