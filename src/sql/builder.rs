//! Parameterized SELECT builder.
//!
//! Builds the single query shape the report surface needs: a filtered,
//! ordered, limited SELECT over one whitelisted table. Values never appear
//! in the SQL text; they are pushed onto the bind list in the same order
//! their `?` placeholders are emitted.

use serde_json::Value;

use super::ident::{quote_identifier, validate_column_name, validate_pattern, validate_table_name};
use super::SqlBuildError;

/// Hard cap on rows returned by a single query.
pub const MAX_LIMIT: i64 = 10_000;

/// A built query: SQL text plus positional bind values.
///
/// Built once per request and consumed exactly once by execution. The
/// number of `?` placeholders in `sql` always equals `binds.len()`.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a built query has no effect until executed"]
pub struct QuerySpec {
    pub sql: String,
    pub binds: Vec<Value>,
}

/// A filter value supplied by the caller.
///
/// Scalars become `col = ?`, lists become `col IN (?, ...)`, and the
/// literal strings `"NULL"`/`"null"` become `col IS NULL` with no bind.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(Value),
    List(Vec<Value>),
}

impl FilterValue {
    /// Build a filter value from a raw JSON value. Returns `None` for JSON
    /// null, which callers treat as "filter not set".
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Array(items) => Some(Self::List(items)),
            other => Some(Self::Scalar(other)),
        }
    }

    fn is_null_literal(&self) -> bool {
        matches!(self, Self::Scalar(Value::String(s)) if s == "NULL" || s == "null")
    }
}

/// Parameters for [`build_report_query`].
#[derive(Debug, Clone, Default)]
pub struct ReportQueryParams<'a> {
    pub table: &'a str,
    pub start_date: Option<&'a str>,
    pub end_date: Option<&'a str>,
    /// Date column override; falls back to the registry's date column.
    pub date_column: Option<&'a str>,
    /// Filters in caller order; order is preserved in the predicate list.
    pub filters: Vec<(String, FilterValue)>,
    /// `"COLUMN"` or `"COLUMN ASC|DESC"`.
    pub order_by: Option<&'a str>,
    pub limit: i64,
}

/// Build a parameterized SELECT for a whitelisted report.
///
/// The table must exist in the report registry; every column is validated
/// before it reaches the SQL text, and the limit is floor-then-clamped to
/// `[1, 10000]`.
pub fn build_report_query(params: &ReportQueryParams<'_>) -> Result<QuerySpec, SqlBuildError> {
    let table = validate_table_name(params.table)?;
    let quoted_table = quote_identifier(table.name)?;

    let mut sql = format!("SELECT * FROM {quoted_table}");
    let mut conditions: Vec<String> = Vec::new();
    let mut binds: Vec<Value> = Vec::new();

    // Date range, compared at whole-day granularity.
    let date_column = params.date_column.or(table.date_column);
    if let (Some(column), true) = (
        date_column,
        params.start_date.is_some() || params.end_date.is_some(),
    ) {
        let date_expr = format!("CAST({} AS DATE)", validate_column_name(column, table)?);
        match (params.start_date, params.end_date) {
            (Some(start), Some(end)) => {
                conditions.push(format!("{date_expr} BETWEEN ? AND ?"));
                binds.push(Value::from(start));
                binds.push(Value::from(end));
            }
            (Some(start), None) => {
                conditions.push(format!("{date_expr} >= ?"));
                binds.push(Value::from(start));
            }
            (None, Some(end)) => {
                conditions.push(format!("{date_expr} <= ?"));
                binds.push(Value::from(end));
            }
            (None, None) => unreachable!(),
        }
    }

    // Caller filters, in insertion order.
    for (column, value) in &params.filters {
        let quoted = validate_column_name(column, table)?;
        match value {
            FilterValue::List(items) => {
                if items.is_empty() {
                    return Err(SqlBuildError::EmptyFilterList(column.clone()));
                }
                let placeholders = vec!["?"; items.len()].join(", ");
                conditions.push(format!("{quoted} IN ({placeholders})"));
                binds.extend(items.iter().cloned());
            }
            scalar if scalar.is_null_literal() => {
                conditions.push(format!("{quoted} IS NULL"));
            }
            FilterValue::Scalar(item) => {
                conditions.push(format!("{quoted} = ?"));
                binds.push(item.clone());
            }
        }
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    if let Some(order_by) = params.order_by {
        sql.push_str(&build_order_by(order_by, table)?);
    }

    sql.push_str(&format!(" LIMIT {}", clamp_limit(params.limit)));

    Ok(QuerySpec { sql, binds })
}

fn build_order_by(
    order_by: &str,
    table: &crate::catalog::ReportMetadata,
) -> Result<String, SqlBuildError> {
    let mut parts = order_by.split_whitespace();
    let column = parts.next().unwrap_or("");
    let quoted = validate_column_name(column, table)?;

    match parts.next() {
        None => Ok(format!(" ORDER BY {quoted}")),
        Some(direction) => {
            let upper = direction.to_uppercase();
            if upper != "ASC" && upper != "DESC" {
                return Err(SqlBuildError::InvalidOrderDirection(direction.to_string()));
            }
            Ok(format!(" ORDER BY {quoted} {upper}"))
        }
    }
}

/// Clamp a requested row limit into `[1, MAX_LIMIT]`.
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_LIMIT)
}

/// The fixed cash-flow fetch: full date range, ascending payment date.
///
/// Ascending order is what lets the aggregator read the opening balance
/// from the first row and the closing balance from the last.
pub fn cash_flow_query(start_date: &str, end_date: &str) -> QuerySpec {
    QuerySpec {
        sql: "SELECT * FROM \"CASH_FLOW\" WHERE \"PAYMENT_DATE\" BETWEEN ? AND ? \
              ORDER BY \"PAYMENT_DATE\" ASC"
            .to_string(),
        binds: vec![Value::from(start_date), Value::from(end_date)],
    }
}

/// Catalog relation kinds listed by [`show_relations_query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Table,
    View,
}

impl RelationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "TABLES",
            Self::View => "VIEWS",
        }
    }
}

/// Build a `SHOW TABLES|VIEWS [LIKE '<pattern>']` statement.
///
/// SHOW does not support bind parameters, so the pattern is validated to a
/// safe character set before being embedded as a literal.
pub fn show_relations_query(
    kind: RelationKind,
    pattern: Option<&str>,
) -> Result<QuerySpec, SqlBuildError> {
    let mut sql = format!("SHOW {}", kind.as_str());
    if let Some(pattern) = pattern {
        validate_pattern(pattern)?;
        sql.push_str(&format!(" LIKE '{pattern}'"));
    }
    Ok(QuerySpec {
        sql,
        binds: Vec::new(),
    })
}
