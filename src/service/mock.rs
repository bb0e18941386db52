//! Deterministic in-memory backend.
//!
//! Engaged when warehouse credentials are absent, so the tool surface
//! stays usable (demos, local development, tests) without a warehouse.
//! Report names still go through the registry whitelist so that unknown
//! reports fail the same way they would against the live backend.

use async_trait::async_trait;
use tracing::info;

use super::{Backend, RelationInfo, ReportRequest, ServiceError};
use crate::cashflow::CashFlowRow;
use crate::driver::protocol::Row;
use crate::sql::{validate_pattern, validate_table_name};

const MOCK_DATABASE: &str = "ABACUS_DEMO";
const MOCK_SCHEMA: &str = "REPORTING";

/// Backend serving fixed data.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockBackend;

impl MockBackend {
    pub fn new() -> Self {
        Self
    }

    fn relations() -> Vec<RelationInfo> {
        let entry = |name: &str, comment: &str| RelationInfo {
            name: name.to_string(),
            kind: "VIEW".to_string(),
            database_name: MOCK_DATABASE.to_string(),
            schema_name: MOCK_SCHEMA.to_string(),
            comment: Some(comment.to_string()),
        };

        vec![
            entry("CASH_FLOW", "Cash flow transactions"),
            entry("BOOKINGS", "Customer bookings"),
            entry("CLIENTS", "Client information"),
            entry("LOCATIONS", "Business locations"),
            entry("TEAM_MEMBERS", "Staff members"),
        ]
    }

    fn cash_flow_rows(start_date: &str, end_date: &str) -> Vec<CashFlowRow> {
        let row = |reference: &str,
                   date: &str,
                   transaction_type: &str,
                   amount: f64,
                   opening: f64,
                   closing: f64,
                   team_member: Option<&str>,
                   client: Option<&str>| CashFlowRow {
            transaction_ref: reference.to_string(),
            payment_date: date.to_string(),
            transaction_type: transaction_type.to_string(),
            amount,
            opening_balance: opening,
            closing_balance: closing,
            currency: "GBP".to_string(),
            location: Some("Main Branch".to_string()),
            team_member: team_member.map(|s| s.to_string()),
            client: client.map(|s| s.to_string()),
        };

        vec![
            row("TXN001", start_date, "sale", 150.0, 1000.0, 1150.0,
                Some("John Doe"), Some("Jane Smith")),
            row("TXN002", start_date, "deposit_collection", 50.0, 1150.0, 1200.0,
                Some("John Doe"), Some("Bob Johnson")),
            row("TXN003", end_date, "platform_fee", -5.25, 1200.0, 1194.75, None, None),
            row("TXN004", end_date, "payout", -500.0, 1194.75, 694.75, None, None),
        ]
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn list_relations(&self, pattern: Option<&str>) -> Result<Vec<RelationInfo>, ServiceError> {
        info!(pattern, "mock: listing relations");

        let relations = Self::relations();
        match pattern {
            None => Ok(relations),
            Some(pattern) => {
                validate_pattern(pattern)?;
                let needle = pattern.replace('%', "").to_uppercase();
                Ok(relations
                    .into_iter()
                    .filter(|r| r.name.contains(&needle))
                    .collect())
            }
        }
    }

    async fn fetch_report(&self, request: &ReportRequest) -> Result<Vec<Row>, ServiceError> {
        info!(report = %request.report, "mock: fetching report");

        let table = validate_table_name(&request.report)?;
        if table.name != "CASH_FLOW" {
            return Ok(Vec::new());
        }

        let start = request.start_date.as_deref().unwrap_or("2026-01-01");
        let end = request.end_date.as_deref().unwrap_or("2026-01-31");
        Self::cash_flow_rows(start, end)
            .iter()
            .map(|row| match serde_json::to_value(row) {
                Ok(serde_json::Value::Object(map)) => Ok(map),
                Ok(_) => unreachable!("cash flow rows serialize to objects"),
                Err(err) => Err(ServiceError::RowDecode(err)),
            })
            .collect()
    }

    async fn fetch_cash_flow(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<CashFlowRow>, ServiceError> {
        info!(start_date, end_date, "mock: fetching cash flow");
        Ok(Self::cash_flow_rows(start_date, end_date))
    }
}
