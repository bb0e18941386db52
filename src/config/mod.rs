//! Warehouse connection configuration.
//!
//! Supports configuration via environment variables:
//! - `ABACUS_ACCOUNT`: Warehouse account identifier
//! - `ABACUS_USER`: Username
//! - `ABACUS_PASSWORD`: Password
//! - `ABACUS_DATABASE`: Database name
//! - `ABACUS_SCHEMA`: Schema name
//! - `ABACUS_WAREHOUSE`: Compute warehouse name
//!
//! Missing credentials (account, user or password) are a recoverable
//! condition: the composition root falls back to the mock backend instead
//! of failing the process. Missing database, schema or warehouse with
//! credentials present is a fatal configuration error.

use std::env;

/// Error type for warehouse configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Account, user or password is absent. Recoverable via mock fallback.
    #[error("Warehouse credentials not configured (missing {0})")]
    MissingCredentials(&'static str),

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
}

/// Warehouse connection configuration.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Account identifier, normalized (no URL scheme or host suffix).
    pub account: String,
    /// Username.
    pub user: String,
    /// Password.
    pub password: String,
    /// Database name.
    pub database: String,
    /// Schema name.
    pub schema: String,
    /// Compute warehouse name.
    pub warehouse: String,
    /// Session keep-alive heartbeat, in seconds.
    pub keep_alive_heartbeat_secs: u64,
}

/// Default session keep-alive heartbeat (one hour).
pub const DEFAULT_HEARTBEAT_SECS: u64 = 3600;

impl WarehouseConfig {
    /// Load configuration from `ABACUS_*` environment variables.
    ///
    /// Returns [`ConfigError::MissingCredentials`] if any of account, user
    /// or password is absent, and [`ConfigError::MissingEnvVar`] if the
    /// credentials are present but database, schema or warehouse is not.
    pub fn from_env() -> Result<Self, ConfigError> {
        let account = credential("ABACUS_ACCOUNT")?;
        let user = credential("ABACUS_USER")?;
        let password = credential("ABACUS_PASSWORD")?;

        let database = required("ABACUS_DATABASE")?;
        let schema = required("ABACUS_SCHEMA")?;
        let warehouse = required("ABACUS_WAREHOUSE")?;

        Ok(Self {
            account: normalize_account(&account),
            user,
            password,
            database,
            schema,
            warehouse,
            keep_alive_heartbeat_secs: DEFAULT_HEARTBEAT_SECS,
        })
    }
}

fn credential(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingCredentials(name)),
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingEnvVar(name)),
    }
}

/// Normalize an account identifier.
///
/// Accepts a bare account id, a full host, or a URL; strips the scheme and
/// the well-known host suffix so the driver always receives the bare id.
pub fn normalize_account(raw: &str) -> String {
    raw.trim_start_matches("https://")
        .trim_end_matches(".snowflakecomputing.com")
        .to_string()
}
