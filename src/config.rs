use std::net::SocketAddr;
use std::path::PathBuf;

use crate::crypto::PBKDF2_ITERATIONS;

/// Application-level constants
pub const APP_NAME: &str = "EyeClinic";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DATABASE_FILE: &str = "clinic.db";

pub const ENV_BIND: &str = "EYECLINIC_BIND";
pub const ENV_PORT: &str = "PORT";
pub const ENV_DB_PATH: &str = "EYECLINIC_DB_PATH";
pub const ENV_JWT_SECRET: &str = "EYECLINIC_JWT_SECRET";
pub const ENV_ADMIN_PASSWORD: &str = "EYECLINIC_ADMIN_PASSWORD";
pub const ENV_PBKDF2_ITERATIONS: &str = "EYECLINIC_PBKDF2_ITERATIONS";

/// Tracing filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "eyeclinic_lib=info,tower_http=info"
}

/// Get the application data directory
/// ~/EyeClinic/ on all platforms
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(APP_NAME))
        .ok_or(ConfigError::NoHomeDir)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("Cannot determine home directory; set EYECLINIC_DB_PATH")]
    NoHomeDir,
}

/// Runtime settings, read once at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    /// HMAC key for credentials. `None` means a random per-process key.
    pub jwt_secret: Option<String>,
    /// Password for the `admin` account created on an empty users table.
    pub admin_password: Option<String>,
    pub pbkdf2_iterations: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("db_path", &self.db_path)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("admin_password", &self.admin_password.as_ref().map(|_| "[REDACTED]"))
            .field("pbkdf2_iterations", &self.pbkdf2_iterations)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match (get(ENV_BIND), get(ENV_PORT)) {
            (Some(bind), _) => parse_bind(ENV_BIND, &bind)?,
            (None, Some(port)) => {
                let port: u16 = port.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: ENV_PORT,
                    reason: format!("'{port}' is not a port number"),
                })?;
                let mut addr = parse_bind(ENV_BIND, DEFAULT_BIND)?;
                addr.set_port(port);
                addr
            }
            (None, None) => parse_bind(ENV_BIND, DEFAULT_BIND)?,
        };

        let db_path = match get(ENV_DB_PATH) {
            Some(path) => PathBuf::from(path),
            None => app_data_dir()?.join(DATABASE_FILE),
        };

        let pbkdf2_iterations = match get(ENV_PBKDF2_ITERATIONS) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: ENV_PBKDF2_ITERATIONS,
                        reason: format!("'{raw}' is not a positive integer"),
                    })
                }
            },
            None => PBKDF2_ITERATIONS,
        };

        Ok(Self {
            bind_addr,
            db_path,
            jwt_secret: get(ENV_JWT_SECRET),
            admin_password: get(ENV_ADMIN_PASSWORD),
            pbkdf2_iterations,
        })
    }
}

fn parse_bind(var: &'static str, raw: &str) -> Result<SocketAddr, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        reason: format!("'{raw}' is not a host:port address"),
    })
}
