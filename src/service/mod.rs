//! Report service and backend selection.
//!
//! The [`Backend`] trait is the capability seam between the tool surface
//! and the data source: fetch rows for a report, fetch cash-flow rows,
//! list catalog relations. Two implementations exist - the live
//! [`WarehouseBackend`] and the deterministic [`MockBackend`] - and the
//! composition root picks one exactly once at startup based on whether
//! warehouse credentials are configured.

mod mock;

pub use mock::MockBackend;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cashflow::{summarize, CashFlowRow, CashFlowSummary, Period};
use crate::config::{ConfigError, WarehouseConfig};
use crate::driver::protocol::Row;
use crate::driver::{DriverClient, DriverError};
use crate::sql::{
    build_report_query, cash_flow_query, show_relations_query, FilterValue, RelationKind,
    ReportQueryParams, SqlBuildError,
};
use crate::warehouse::{ConnectionManager, WarehouseError, WarehouseTransport};

/// Default row limit for report fetches.
pub const DEFAULT_LIMIT: i64 = 1000;

/// Errors surfaced by the report service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Sql(#[from] SqlBuildError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to start warehouse driver: {0}")]
    Driver(#[from] DriverError),

    #[error("failed to decode a cash flow row")]
    RowDecode(#[source] serde_json::Error),
}

/// One catalog entry returned by `list_reports`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationInfo {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub database_name: String,
    #[serde(default)]
    pub schema_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A `get_report` request, validated downstream by the query builder.
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub report: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Date column override; the registry's date column applies otherwise.
    pub date_column: Option<String>,
    /// Filters in caller order.
    pub filters: Vec<(String, FilterValue)>,
    pub order_by: Option<String>,
    pub limit: i64,
}

impl ReportRequest {
    pub fn new(report: impl Into<String>) -> Self {
        Self {
            report: report.into(),
            limit: DEFAULT_LIMIT,
            ..Default::default()
        }
    }
}

/// Capability interface over a report data source.
#[async_trait]
pub trait Backend: Send + Sync {
    /// List tables and views, optionally filtered by a wildcard pattern.
    async fn list_relations(&self, pattern: Option<&str>) -> Result<Vec<RelationInfo>, ServiceError>;

    /// Fetch rows for a whitelisted report.
    async fn fetch_report(&self, request: &ReportRequest) -> Result<Vec<Row>, ServiceError>;

    /// Fetch cash-flow rows for a date range, ascending by payment date.
    async fn fetch_cash_flow(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<CashFlowRow>, ServiceError>;
}

// ============================================================================
// Live backend
// ============================================================================

/// Backend over the real warehouse: builds parameterized queries and runs
/// them through the injected [`ConnectionManager`].
pub struct WarehouseBackend {
    manager: ConnectionManager,
}

impl WarehouseBackend {
    pub fn new(config: WarehouseConfig, transport: Arc<dyn WarehouseTransport>) -> Self {
        Self {
            manager: ConnectionManager::new(config, transport),
        }
    }

    /// Access the connection manager, mainly for explicit teardown.
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }
}

#[async_trait]
impl Backend for WarehouseBackend {
    async fn list_relations(&self, pattern: Option<&str>) -> Result<Vec<RelationInfo>, ServiceError> {
        info!(pattern, "listing relations");

        let mut relations = Vec::new();
        for kind in [RelationKind::Table, RelationKind::View] {
            let spec = show_relations_query(kind, pattern)?;
            let rows = self.manager.execute(&spec.sql, &spec.binds).await?;
            relations.extend(rows.into_iter().filter_map(parse_relation));
        }
        Ok(relations)
    }

    async fn fetch_report(&self, request: &ReportRequest) -> Result<Vec<Row>, ServiceError> {
        info!(
            report = %request.report,
            start_date = request.start_date.as_deref(),
            end_date = request.end_date.as_deref(),
            limit = request.limit,
            "fetching report"
        );

        let spec = build_report_query(&ReportQueryParams {
            table: &request.report,
            start_date: request.start_date.as_deref(),
            end_date: request.end_date.as_deref(),
            date_column: request.date_column.as_deref(),
            filters: request.filters.clone(),
            order_by: request.order_by.as_deref(),
            limit: request.limit,
        })?;

        Ok(self.manager.execute(&spec.sql, &spec.binds).await?)
    }

    async fn fetch_cash_flow(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<CashFlowRow>, ServiceError> {
        info!(start_date, end_date, "fetching cash flow");

        let spec = cash_flow_query(start_date, end_date);
        let rows = self.manager.execute(&spec.sql, &spec.binds).await?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(serde_json::Value::Object(row))
                    .map_err(ServiceError::RowDecode)
            })
            .collect()
    }
}

/// Parse one SHOW TABLES/VIEWS row. Drivers differ in casing; accept both.
fn parse_relation(row: Row) -> Option<RelationInfo> {
    let get = |key: &str| -> Option<String> {
        row.get(key)
            .or_else(|| row.get(key.to_uppercase().as_str()))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };

    Some(RelationInfo {
        name: get("name")?,
        kind: get("kind").unwrap_or_else(|| "TABLE".to_string()),
        database_name: get("database_name").unwrap_or_default(),
        schema_name: get("schema_name").unwrap_or_default(),
        comment: get("comment").filter(|c| !c.is_empty()),
    })
}

// ============================================================================
// Report service
// ============================================================================

/// Orchestrates the tool surface over whichever backend was selected.
pub struct ReportService {
    backend: Arc<dyn Backend>,
}

impl ReportService {
    /// Build a service over an explicit backend.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Composition root: select the backend from the environment.
    ///
    /// Complete credentials select the live warehouse backend (spawning
    /// the driver process); absent credentials select the mock backend.
    /// Credentials present but database/schema/warehouse missing is a
    /// fatal configuration error.
    pub async fn from_env() -> Result<Self, ServiceError> {
        match WarehouseConfig::from_env() {
            Ok(config) => {
                let client = DriverClient::spawn_from_env().await?;
                Ok(Self::new(Arc::new(WarehouseBackend::new(
                    config,
                    Arc::new(client),
                ))))
            }
            Err(ConfigError::MissingCredentials(var)) => {
                warn!(missing = var, "warehouse credentials not configured, using mock data");
                Ok(Self::new(Arc::new(MockBackend::new())))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// List available tables and views.
    pub async fn list_reports(
        &self,
        pattern: Option<&str>,
    ) -> Result<Vec<RelationInfo>, ServiceError> {
        self.backend.list_relations(pattern).await
    }

    /// Fetch rows for a named report.
    ///
    /// When the request has no ordering, the registry's default ordering
    /// for the report is applied (validated like any caller input).
    pub async fn get_report(&self, request: &ReportRequest) -> Result<Vec<Row>, ServiceError> {
        let request = match (&request.order_by, crate::catalog::report_metadata(&request.report)) {
            (None, Some(meta)) if meta.default_order_by.is_some() => {
                let mut request = request.clone();
                request.order_by = meta.default_order_by.map(|s| s.to_string());
                request
            }
            _ => request.clone(),
        };
        self.backend.fetch_report(&request).await
    }

    /// Compute the cash-flow summary for a date range.
    pub async fn get_cash_flow_statement(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<CashFlowSummary, ServiceError> {
        let rows = self.backend.fetch_cash_flow(start_date, end_date).await?;
        Ok(summarize(
            &rows,
            Period {
                start_date: start_date.to_string(),
                end_date: end_date.to_string(),
            },
        ))
    }
}
