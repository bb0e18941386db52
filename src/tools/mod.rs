//! Tool catalog and dispatch.
//!
//! The protocol layer (stdio server, CLI) sees three tools. Arguments
//! arrive as JSON objects and are parsed with serde; results are returned
//! as rendered markdown. All validation beyond argument shape happens in
//! the layers below.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::render;
use crate::service::{ReportRequest, ReportService, ServiceError, DEFAULT_LIMIT};
use crate::sql::FilterValue;

/// A tool exposed to the protocol layer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Errors surfaced by tool dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// The tool catalog, in the order tools are advertised.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "list_reports",
            description: "List all report tables and views available for querying",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "pattern": {
                        "type": "string",
                        "description": "Optional wildcard pattern (alphanumeric, _ and %) to filter by name"
                    }
                }
            }),
        },
        ToolDef {
            name: "get_report",
            description: "Fetch rows from a whitelisted report with optional date range, filters, ordering and limit",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "report_name": { "type": "string", "description": "Report name, e.g. SALES" },
                    "start_date": { "type": "string", "description": "Start date (YYYY-MM-DD)" },
                    "end_date": { "type": "string", "description": "End date (YYYY-MM-DD)" },
                    "date_column": { "type": "string", "description": "Date column override" },
                    "limit": { "type": "integer", "description": "Row limit, clamped to [1, 10000]", "default": 1000 },
                    "order_by": { "type": "string", "description": "\"COLUMN\" or \"COLUMN ASC|DESC\"" },
                    "filters": { "type": "object", "description": "Column to value, list of values, or \"NULL\"" }
                },
                "required": ["report_name"]
            }),
        },
        ToolDef {
            name: "get_cash_flow_statement",
            description: "Get the cash flow statement for a date range with transaction breakdown",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "start_date": { "type": "string", "description": "Start date (YYYY-MM-DD)" },
                    "end_date": { "type": "string", "description": "End date (YYYY-MM-DD)" }
                },
                "required": ["start_date", "end_date"]
            }),
        },
    ]
}

#[derive(Debug, Deserialize)]
struct ListReportsArgs {
    #[serde(default)]
    pattern: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetReportArgs {
    report_name: String,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    date_column: Option<String>,
    /// Any JSON number; fractional values are floored before clamping.
    #[serde(default)]
    limit: Option<f64>,
    #[serde(default)]
    order_by: Option<String>,
    /// Insertion order is preserved through to predicate order.
    #[serde(default)]
    filters: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct GetCashFlowArgs {
    start_date: String,
    end_date: String,
}

fn parse_args<T: serde::de::DeserializeOwned>(
    tool: &'static str,
    args: Value,
) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|source| ToolError::InvalidArguments { tool, source })
}

/// Dispatch a tool call to the service, returning rendered markdown.
pub async fn handle_tool_call(
    service: &ReportService,
    name: &str,
    args: Value,
) -> Result<String, ToolError> {
    match name {
        "list_reports" => {
            let args: ListReportsArgs = parse_args("list_reports", args)?;
            let relations = service.list_reports(args.pattern.as_deref()).await?;
            Ok(render::relations_table(&relations))
        }

        "get_report" => {
            let args: GetReportArgs = parse_args("get_report", args)?;
            let filters = args
                .filters
                .into_iter()
                .filter_map(|(column, value)| {
                    FilterValue::from_json(value).map(|v| (column, v))
                })
                .collect();

            let request = ReportRequest {
                report: args.report_name,
                start_date: args.start_date,
                end_date: args.end_date,
                date_column: args.date_column,
                filters,
                order_by: args.order_by,
                limit: args.limit.map_or(DEFAULT_LIMIT, |l| l.floor() as i64),
            };
            let rows = service.get_report(&request).await?;
            Ok(render::rows_table(&rows))
        }

        "get_cash_flow_statement" => {
            let args: GetCashFlowArgs = parse_args("get_cash_flow_statement", args)?;
            let summary = service
                .get_cash_flow_statement(&args.start_date, &args.end_date)
                .await?;
            Ok(render::cash_flow_statement(&summary))
        }

        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}
