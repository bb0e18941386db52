//! Protocol types for driver communication.
//!
//! Requests and responses are single JSON objects, one per line. The same
//! envelope shapes are reused by the stdio tool server in
//! [`crate::server`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::WarehouseConfig;

/// A row returned by the warehouse: column name to JSON value, in the
/// column order the driver emitted.
pub type Row = serde_json::Map<String, Value>;

// ============================================================================
// Request/Response Envelope
// ============================================================================

/// Request envelope sent to the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Unique request ID for correlation.
    pub id: String,
    /// Method name (e.g., "statement.execute").
    pub method: String,
    /// Method-specific parameters.
    pub params: Value,
}

/// Response envelope received from the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID this response corresponds to.
    pub id: String,
    /// Whether the request succeeded.
    pub success: bool,
    /// Result data (present if success = true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error information (present if success = false).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ResponseEnvelope {
    /// Build a success response.
    pub fn ok(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response.
    pub fn err(id: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: false,
            result: None,
            error: Some(ErrorInfo {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// Error information in a failed response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

// ============================================================================
// Method Names
// ============================================================================

/// Driver method names.
pub mod methods {
    pub const OPEN_SESSION: &str = "session.open";
    pub const EXECUTE: &str = "statement.execute";
    pub const CLOSE_SESSION: &str = "session.close";
}

// ============================================================================
// Session Methods
// ============================================================================

/// Parameters for `session.open`.
#[derive(Debug, Clone, Serialize)]
pub struct OpenSessionParams {
    pub account: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub schema: String,
    pub warehouse: String,
    /// Keep the session alive with a heartbeat at this interval.
    pub keep_alive_heartbeat_secs: u64,
}

impl From<&WarehouseConfig> for OpenSessionParams {
    fn from(config: &WarehouseConfig) -> Self {
        Self {
            account: config.account.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            database: config.database.clone(),
            schema: config.schema.clone(),
            warehouse: config.warehouse.clone(),
            keep_alive_heartbeat_secs: config.keep_alive_heartbeat_secs,
        }
    }
}

/// Response for `session.open`.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenSessionResponse {
    /// Opaque session handle used by subsequent statements.
    pub session_id: String,
}

/// Parameters for `statement.execute`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteParams {
    pub session_id: String,
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Positional bind values, one per placeholder.
    pub binds: Vec<Value>,
}

/// Response for `statement.execute`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteResponse {
    /// Result rows, unmodified.
    #[serde(default)]
    pub rows: Vec<Row>,
}

/// Parameters for `session.close`.
#[derive(Debug, Clone, Serialize)]
pub struct CloseSessionParams {
    pub session_id: String,
}
