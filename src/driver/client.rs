//! Async client for the warehouse driver process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tracing::{error, warn};

use super::error::{DriverError, DriverResult};
use super::protocol::{ErrorInfo, RequestEnvelope, ResponseEnvelope};

/// Default timeout for driver requests (30 seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the driver binary location.
const DRIVER_PATH_VAR: &str = "ABACUS_DRIVER_PATH";

/// Async client for the warehouse driver.
///
/// The client spawns the driver as a child process and communicates via
/// NDJSON over stdin/stdout. Each request has a unique ID for correlation
/// with responses, enabling concurrent requests over one process.
pub struct DriverClient {
    /// Writer for sending requests to driver stdin.
    stdin: Arc<Mutex<BufWriter<ChildStdin>>>,

    /// Map of pending request IDs to response channels.
    pending: Arc<Mutex<HashMap<String, oneshot::Sender<ResponseEnvelope>>>>,

    /// Handle to the driver child process.
    _child: Child,

    /// Handle to the background reader task.
    _reader_task: tokio::task::JoinHandle<()>,

    /// Request timeout duration.
    timeout: Duration,
}

impl DriverClient {
    /// Spawn a driver process at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver process cannot be spawned.
    pub async fn spawn<P: AsRef<Path>>(driver_path: P) -> DriverResult<Self> {
        Self::spawn_with_timeout(driver_path, Duration::from_secs(DEFAULT_TIMEOUT_SECS)).await
    }

    /// Spawn a driver resolved from the environment.
    ///
    /// Checks `ABACUS_DRIVER_PATH` first, then a small set of conventional
    /// locations relative to the working directory.
    pub async fn spawn_from_env() -> DriverResult<Self> {
        let path = Self::resolve_driver_path()?;
        Self::spawn(path).await
    }

    /// Resolve the driver binary path.
    fn resolve_driver_path() -> DriverResult<PathBuf> {
        if let Ok(path) = std::env::var(DRIVER_PATH_VAR) {
            return Ok(PathBuf::from(path));
        }

        let candidates = ["abacus-driver", "./abacus-driver", "./driver/abacus-driver"];
        for candidate in candidates {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Ok(path);
            }
        }

        Err(DriverError::SpawnFailed(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Warehouse driver binary not found. Set {DRIVER_PATH_VAR}."),
        )))
    }

    /// Spawn a driver process with a custom request timeout.
    pub async fn spawn_with_timeout<P: AsRef<Path>>(
        driver_path: P,
        timeout: Duration,
    ) -> DriverResult<Self> {
        let mut child = Command::new(driver_path.as_ref())
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(DriverError::SpawnFailed)?;

        let stdin = child.stdin.take().expect("stdin not captured");
        let stdout = child.stdout.take().expect("stdout not captured");

        let stdin = Arc::new(Mutex::new(BufWriter::new(stdin)));
        let pending: Arc<Mutex<HashMap<String, oneshot::Sender<ResponseEnvelope>>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let reader_task = Self::spawn_reader_task(stdout, pending.clone());

        Ok(Self {
            stdin,
            pending,
            _child: child,
            _reader_task: reader_task,
            timeout,
        })
    }

    /// Spawn the background task that reads responses from the driver.
    fn spawn_reader_task(
        stdout: ChildStdout,
        pending: Arc<Mutex<HashMap<String, oneshot::Sender<ResponseEnvelope>>>>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        // EOF - driver exited
                        break;
                    }
                    Ok(_) => match serde_json::from_str::<ResponseEnvelope>(&line) {
                        Ok(resp) => {
                            let mut pending = pending.lock().await;
                            if let Some(tx) = pending.remove(&resp.id) {
                                let _ = tx.send(resp);
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "driver: failed to parse response");
                        }
                    },
                    Err(e) => {
                        error!(error = %e, "driver: read error");
                        break;
                    }
                }
            }

            // Driver exited - fail all pending requests
            let mut pending = pending.lock().await;
            for (id, tx) in pending.drain() {
                let _ = tx.send(ResponseEnvelope {
                    id,
                    success: false,
                    result: None,
                    error: Some(ErrorInfo {
                        code: "DRIVER_EXITED".to_string(),
                        message: "Driver process exited unexpectedly".to_string(),
                    }),
                });
            }
        })
    }

    /// Send a request to the driver and wait for the response.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails, writing to the driver
    /// fails, the request times out, the driver returns an error response,
    /// or the response cannot be deserialized.
    pub async fn request<P, R>(&self, method: &str, params: P) -> DriverResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = uuid::Uuid::new_v4().to_string();

        let request = RequestEnvelope {
            id: id.clone(),
            method: method.to_string(),
            params: serde_json::to_value(params).map_err(DriverError::SerializeFailed)?,
        };

        // Register response channel
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id.clone(), tx);
        }

        // Send request
        {
            let mut stdin = self.stdin.lock().await;
            let line =
                serde_json::to_string(&request).map_err(DriverError::SerializeFailed)? + "\n";
            stdin
                .write_all(line.as_bytes())
                .await
                .map_err(DriverError::WriteFailed)?;
            stdin.flush().await.map_err(DriverError::WriteFailed)?;
        }

        // Wait for response with timeout
        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(_)) => {
                // Channel closed - driver exited
                return Err(DriverError::ChannelClosed);
            }
            Err(_) => {
                // Timeout - clean up the pending entry
                let mut pending = self.pending.lock().await;
                pending.remove(&id);
                return Err(DriverError::Timeout(self.timeout.as_secs()));
            }
        };

        if response.success {
            let result = response.result.unwrap_or(serde_json::Value::Null);
            serde_json::from_value(result).map_err(DriverError::DeserializeFailed)
        } else {
            let error = response.error.unwrap_or_else(|| ErrorInfo {
                code: "UNKNOWN".to_string(),
                message: "Unknown error".to_string(),
            });
            if error.code == "DRIVER_EXITED" {
                return Err(DriverError::DriverExited);
            }
            Err(DriverError::remote(error.code, error.message))
        }
    }

    /// Whether the driver process appears to be running.
    pub fn is_alive(&self) -> bool {
        !self._reader_task.is_finished()
    }

    /// Current request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
