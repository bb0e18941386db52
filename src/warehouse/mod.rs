//! Warehouse connection management.
//!
//! The [`ConnectionManager`] owns the single warehouse session: lazy
//! connect with exponential-backoff retry for transient network failures,
//! a parameterized `execute`, and idempotent teardown. It is constructed
//! once at the composition root and injected into the backend; the session
//! state lives behind an async mutex that is held across the whole connect
//! attempt, which is what collapses concurrent `connect()` callers onto
//! one physical attempt.
//!
//! Driver errors are never surfaced verbatim. Connect and query failures
//! are classified into fixed categories with fixed messages, so raw
//! driver text (which can echo credentials or query fragments) stays in
//! the logs at most as a truncated prefix.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::WarehouseConfig;
use crate::driver::protocol::{
    methods, CloseSessionParams, ExecuteParams, ExecuteResponse, OpenSessionParams,
    OpenSessionResponse, Row,
};
use crate::driver::{DriverClient, DriverError, DriverResult};

/// Retries after the first failed attempt (4 attempts total).
const MAX_RETRIES: u32 = 3;

/// Backoff base; delay before retry `k` is `2^k * BASE_DELAY_MS`.
const BASE_DELAY_MS: u64 = 1000;

/// Longest SQL prefix that may appear in log events.
const SQL_LOG_PREFIX_LEN: usize = 80;

/// Opaque session handle issued by the driver.
pub type SessionId = String;

/// Transport seam between the connection manager and the driver.
///
/// The live implementation is [`DriverClient`]; tests substitute fakes to
/// exercise retry and single-flight behavior without a driver process.
#[async_trait]
pub trait WarehouseTransport: Send + Sync {
    /// Open a session, returning its handle.
    async fn open_session(&self, config: &WarehouseConfig) -> DriverResult<SessionId>;

    /// Execute a parameterized statement on an open session.
    async fn execute(&self, session_id: &str, sql: &str, binds: &[Value])
        -> DriverResult<Vec<Row>>;

    /// Close a session.
    async fn close_session(&self, session_id: &str) -> DriverResult<()>;
}

#[async_trait]
impl WarehouseTransport for DriverClient {
    async fn open_session(&self, config: &WarehouseConfig) -> DriverResult<SessionId> {
        let response: OpenSessionResponse = self
            .request(methods::OPEN_SESSION, OpenSessionParams::from(config))
            .await?;
        Ok(response.session_id)
    }

    async fn execute(
        &self,
        session_id: &str,
        sql: &str,
        binds: &[Value],
    ) -> DriverResult<Vec<Row>> {
        let response: ExecuteResponse = self
            .request(
                methods::EXECUTE,
                ExecuteParams {
                    session_id: session_id.to_string(),
                    sql: sql.to_string(),
                    binds: binds.to_vec(),
                },
            )
            .await?;
        Ok(response.rows)
    }

    async fn close_session(&self, session_id: &str) -> DriverResult<()> {
        self.request(
            methods::CLOSE_SESSION,
            CloseSessionParams {
                session_id: session_id.to_string(),
            },
        )
        .await
    }
}

// ============================================================================
// Error classification
// ============================================================================

/// Sanitized category for a failed connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailureKind {
    AccountMisconfigured,
    AuthenticationFailed,
    DatabaseOrSchemaMissing,
    WarehouseUnavailable,
    Other,
}

impl ConnectFailureKind {
    /// Fixed, credential-free message for this category.
    pub const fn message(self) -> &'static str {
        match self {
            Self::AccountMisconfigured => {
                "Warehouse account is misconfigured; check the account identifier"
            }
            Self::AuthenticationFailed => "Warehouse authentication failed; check credentials",
            Self::DatabaseOrSchemaMissing => "Configured database or schema does not exist",
            Self::WarehouseUnavailable => "Compute warehouse is unavailable",
            Self::Other => "Could not connect to the warehouse",
        }
    }
}

/// Sanitized category for a failed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFailureKind {
    NotFound,
    WarehouseSuspended,
    SyntaxError,
    Other,
}

impl QueryFailureKind {
    /// Fixed message for this category; never includes the query text.
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotFound => "Queried object does not exist or is not authorized",
            Self::WarehouseSuspended => "Compute warehouse is suspended",
            Self::SyntaxError => "Statement was rejected by the warehouse",
            Self::Other => "Query execution failed",
        }
    }
}

/// Errors surfaced by the connection manager. All messages are fixed per
/// category; raw driver text never leaves the log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WarehouseError {
    #[error("{}", .kind.message())]
    ConnectionFailed { kind: ConnectFailureKind },

    #[error("{}", .kind.message())]
    QueryFailed { kind: QueryFailureKind },
}

/// Classify a failed connect attempt. Authentication indicators win over
/// the broader account/database checks.
fn classify_connect(err: &DriverError) -> ConnectFailureKind {
    let text = err.to_string().to_lowercase();

    if text.contains("auth") || text.contains("password") || text.contains("390100") {
        ConnectFailureKind::AuthenticationFailed
    } else if text.contains("account") {
        ConnectFailureKind::AccountMisconfigured
    } else if text.contains("database") || text.contains("schema") {
        ConnectFailureKind::DatabaseOrSchemaMissing
    } else if text.contains("warehouse") {
        ConnectFailureKind::WarehouseUnavailable
    } else {
        ConnectFailureKind::Other
    }
}

/// Classify a failed statement by driver error code or message.
fn classify_query(err: &DriverError) -> QueryFailureKind {
    let text = err.to_string().to_lowercase();

    if err.code() == Some("002003") || text.contains("does not exist") {
        QueryFailureKind::NotFound
    } else if err.code() == Some("000630") || text.contains("suspended") {
        QueryFailureKind::WarehouseSuspended
    } else if err.code() == Some("001003") || text.contains("syntax") {
        QueryFailureKind::SyntaxError
    } else {
        QueryFailureKind::Other
    }
}

// ============================================================================
// Connection manager
// ============================================================================

#[derive(Debug)]
enum SessionState {
    Disconnected,
    Connected(SessionId),
}

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    /// A connect attempt is in flight; callers arriving now will share it.
    Connecting,
    Connected,
}

impl ConnectionStatus {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Connected => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

/// Owner of the single warehouse session.
pub struct ConnectionManager {
    transport: Arc<dyn WarehouseTransport>,
    config: WarehouseConfig,
    state: Mutex<SessionState>,
    /// Mirrors the session state for lock-free observation. `Connecting`
    /// only while a connect attempt is actually in flight, not whenever
    /// the state mutex happens to be contended.
    status: AtomicU8,
}

impl ConnectionManager {
    /// Create a manager over the given transport. No connection is made
    /// until the first `connect()` or `execute()`.
    pub fn new(config: WarehouseConfig, transport: Arc<dyn WarehouseTransport>) -> Self {
        Self {
            transport,
            config,
            state: Mutex::new(SessionState::Disconnected),
            status: AtomicU8::new(ConnectionStatus::Disconnected.as_u8()),
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.status.store(status.as_u8(), Ordering::SeqCst);
    }

    /// Establish the warehouse session if not already established.
    ///
    /// Idempotent: returns immediately when connected. The state lock is
    /// held for the duration of the attempt, so concurrent callers await
    /// the same physical connection rather than racing a second one.
    /// Transient network failures are retried up to 3 times with delays
    /// of 2s, 4s and 8s; all other failures propagate immediately as a
    /// sanitized [`WarehouseError::ConnectionFailed`].
    pub async fn connect(&self) -> Result<(), WarehouseError> {
        let mut state = self.state.lock().await;
        if let SessionState::Connected(_) = *state {
            return Ok(());
        }

        self.set_status(ConnectionStatus::Connecting);
        let mut attempt: u32 = 0;
        loop {
            match self.transport.open_session(&self.config).await {
                Ok(session_id) => {
                    info!("connected to warehouse");
                    *state = SessionState::Connected(session_id);
                    self.set_status(ConnectionStatus::Connected);
                    return Ok(());
                }
                Err(err) => {
                    attempt += 1;
                    let kind = classify_connect(&err);
                    if !err.is_transient() || attempt > MAX_RETRIES {
                        error!(category = ?kind, attempts = attempt, "warehouse connection failed");
                        self.set_status(ConnectionStatus::Disconnected);
                        return Err(WarehouseError::ConnectionFailed { kind });
                    }
                    let delay = Duration::from_millis(BASE_DELAY_MS << attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "transient connection failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Execute a parameterized statement, connecting first if needed.
    ///
    /// On success resolves the row set unmodified. On failure the error is
    /// classified into a fixed category; the log event carries only a
    /// truncated SQL prefix and the bind count.
    pub async fn execute(&self, sql: &str, binds: &[Value]) -> Result<Vec<Row>, WarehouseError> {
        self.connect().await?;

        let session_id = {
            let state = self.state.lock().await;
            match &*state {
                SessionState::Connected(id) => id.clone(),
                // connect() just succeeded; a concurrent disconnect is the
                // only way here, and reconnecting transparently would hide it.
                SessionState::Disconnected => {
                    return Err(WarehouseError::ConnectionFailed {
                        kind: ConnectFailureKind::Other,
                    })
                }
            }
        };

        match self.transport.execute(&session_id, sql, binds).await {
            Ok(rows) => {
                debug!(
                    sql_prefix = %sql_prefix(sql),
                    binds = binds.len(),
                    rows = rows.len(),
                    "statement complete"
                );
                Ok(rows)
            }
            Err(err) => {
                let kind = classify_query(&err);
                error!(
                    category = ?kind,
                    sql_prefix = %sql_prefix(sql),
                    binds = binds.len(),
                    "statement failed"
                );
                Err(WarehouseError::QueryFailed { kind })
            }
        }
    }

    /// Tear down the session. Idempotent no-op when disconnected.
    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        if let SessionState::Connected(session_id) = &*state {
            if let Err(err) = self.transport.close_session(session_id).await {
                // The session is being abandoned either way.
                warn!(error = %classify_query(&err).message(), "session close failed");
            }
            info!("disconnected from warehouse");
        }
        *state = SessionState::Disconnected;
        self.set_status(ConnectionStatus::Disconnected);
    }

    /// Observable connection state. Reports `Connecting` only while a
    /// connect attempt is in flight; other brief uses of the state lock
    /// (the session-id read in `execute`, teardown) do not register.
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus::from_u8(self.status.load(Ordering::SeqCst))
    }
}

fn sql_prefix(sql: &str) -> &str {
    let end = sql
        .char_indices()
        .nth(SQL_LOG_PREFIX_LEN)
        .map_or(sql.len(), |(i, _)| i);
    &sql[..end]
}
