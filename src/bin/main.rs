//! Abacus CLI - business reports over the warehouse
//!
//! Usage:
//!   abacus serve
//!   abacus list-reports [--pattern <pattern>]
//!   abacus report <name> [--from <date>] [--to <date>] [--filter K=V ...]
//!   abacus cash-flow --from <date> --to <date>
//!
//! Examples:
//!   abacus list-reports --pattern 'CASH%'
//!   abacus report SALES --from 2026-01-01 --to 2026-01-31 --filter PAYMENT_STATUS=paid
//!   abacus cash-flow --from 2026-01-01 --to 2026-01-31

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use abacus::server;
use abacus::service::{ReportRequest, ReportService, DEFAULT_LIMIT};
use abacus::sql::FilterValue;
use abacus::{render, tools};

#[derive(Parser)]
#[command(name = "abacus")]
#[command(about = "Abacus - read-only business reporting over the warehouse")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve tool requests over stdio (NDJSON)
    Serve,

    /// List available report tables and views
    ListReports {
        /// Wildcard pattern (alphanumeric, _ and %)
        #[arg(short, long)]
        pattern: Option<String>,
    },

    /// Fetch rows from a report
    Report {
        /// Report name, e.g. SALES
        name: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Date column override
        #[arg(long)]
        date_column: Option<String>,

        /// Row limit
        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: i64,

        /// Ordering, "COLUMN" or "COLUMN DESC"
        #[arg(short, long)]
        order_by: Option<String>,

        /// Column filter as KEY=VALUE, repeatable. VALUE may be NULL.
        #[arg(short, long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,
    },

    /// Print the cash flow statement for a date range
    CashFlow {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let service = match ReportService::from_env().await {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Serve => cmd_serve(&service).await,
        Commands::ListReports { pattern } => cmd_list_reports(&service, pattern).await,
        Commands::Report {
            name,
            from,
            to,
            date_column,
            limit,
            order_by,
            filters,
        } => cmd_report(&service, name, from, to, date_column, limit, order_by, filters).await,
        Commands::CashFlow { from, to } => cmd_cash_flow(&service, from, to).await,
    }
}

async fn cmd_serve(service: &ReportService) -> ExitCode {
    match server::serve(service).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_list_reports(service: &ReportService, pattern: Option<String>) -> ExitCode {
    let args = match pattern {
        Some(p) => serde_json::json!({ "pattern": p }),
        None => serde_json::json!({}),
    };
    print_tool_result(tools::handle_tool_call(service, "list_reports", args).await)
}

#[allow(clippy::too_many_arguments)]
async fn cmd_report(
    service: &ReportService,
    name: String,
    from: Option<String>,
    to: Option<String>,
    date_column: Option<String>,
    limit: i64,
    order_by: Option<String>,
    filters: Vec<String>,
) -> ExitCode {
    let filters = match parse_filters(&filters) {
        Ok(filters) => filters,
        Err(bad) => {
            eprintln!("Error: invalid filter '{}', expected KEY=VALUE", bad);
            return ExitCode::FAILURE;
        }
    };

    let request = ReportRequest {
        report: name,
        start_date: from,
        end_date: to,
        date_column,
        filters,
        order_by,
        limit,
    };

    match service.get_report(&request).await {
        Ok(rows) => {
            println!("{}", render::rows_table(&rows));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_cash_flow(service: &ReportService, from: String, to: String) -> ExitCode {
    match service.get_cash_flow_statement(&from, &to).await {
        Ok(summary) => {
            println!("{}", render::cash_flow_statement(&summary));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_tool_result(result: Result<String, tools::ToolError>) -> ExitCode {
    match result {
        Ok(content) => {
            println!("{}", content);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Parse repeated `KEY=VALUE` filter flags. `NULL` selects the IS NULL
/// predicate; everything else binds as a string value.
fn parse_filters(raw: &[String]) -> Result<Vec<(String, FilterValue)>, String> {
    raw.iter()
        .map(|entry| {
            let (key, value) = entry.split_once('=').ok_or_else(|| entry.clone())?;
            if key.is_empty() {
                return Err(entry.clone());
            }
            Ok((
                key.to_string(),
                FilterValue::Scalar(Value::String(value.to_string())),
            ))
        })
        .collect()
}
