//! NDJSON tool server over stdio.
//!
//! One JSON request per line on stdin, one JSON response per line on
//! stdout. The envelope shapes are shared with the driver protocol:
//!
//! ```text
//! -> {"id":"1","method":"tools.list","params":{}}
//! <- {"id":"1","success":true,"result":{"tools":[...]}}
//! -> {"id":"2","method":"tools.call","params":{"name":"list_reports","arguments":{}}}
//! <- {"id":"2","success":true,"result":{"content":"# Available Tables..."}}
//! ```
//!
//! Malformed lines get an error response with id `"-"` rather than
//! killing the loop; the loop ends on stdin EOF.

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::driver::protocol::{RequestEnvelope, ResponseEnvelope};
use crate::service::ReportService;
use crate::tools::{self, ToolError};

/// Server method names.
pub mod methods {
    pub const TOOLS_LIST: &str = "tools.list";
    pub const TOOLS_CALL: &str = "tools.call";
}

/// Errors that end the serve loop.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to read from stdin: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("failed to write to stdout: {0}")]
    Stdout(#[source] std::io::Error),

    #[error("failed to serialize a response: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Serve tool requests from stdin until EOF.
pub async fn serve(service: &ReportService) -> Result<(), ServerError> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut lines = stdin.lines();

    info!("tool server listening on stdio");

    while let Some(line) = lines.next_line().await.map_err(ServerError::Stdin)? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RequestEnvelope>(line) {
            Ok(request) => handle_request(service, request).await,
            Err(err) => {
                debug!(%err, "discarding malformed request line");
                ResponseEnvelope::err("-", "BAD_REQUEST", format!("malformed request: {err}"))
            }
        };

        let mut payload = serde_json::to_vec(&response).map_err(ServerError::Serialize)?;
        payload.push(b'\n');
        stdout.write_all(&payload).await.map_err(ServerError::Stdout)?;
        stdout.flush().await.map_err(ServerError::Stdout)?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}

async fn handle_request(service: &ReportService, request: RequestEnvelope) -> ResponseEnvelope {
    match request.method.as_str() {
        methods::TOOLS_LIST => {
            ResponseEnvelope::ok(request.id, json!({ "tools": tools::tools() }))
        }

        methods::TOOLS_CALL => {
            let params: ToolCallParams = match serde_json::from_value(request.params) {
                Ok(params) => params,
                Err(err) => {
                    return ResponseEnvelope::err(
                        request.id,
                        "BAD_REQUEST",
                        format!("invalid tools.call params: {err}"),
                    )
                }
            };

            match tools::handle_tool_call(service, &params.name, params.arguments).await {
                Ok(content) => ResponseEnvelope::ok(request.id, json!({ "content": content })),
                Err(err) => {
                    error!(tool = %params.name, %err, "tool call failed");
                    ResponseEnvelope::err(request.id, error_code(&err), err.to_string())
                }
            }
        }

        other => ResponseEnvelope::err(
            request.id,
            "UNKNOWN_METHOD",
            format!("unknown method: {other}"),
        ),
    }
}

fn error_code(err: &ToolError) -> &'static str {
    match err {
        ToolError::UnknownTool(_) => "UNKNOWN_TOOL",
        ToolError::InvalidArguments { .. } => "BAD_REQUEST",
        ToolError::Service(_) => "TOOL_FAILED",
    }
}
