//! SQL construction module.
//!
//! Two layers, both pure:
//!
//! - [`ident`] - identifier quoting and whitelist validation
//! - [`builder`] - parameterized SELECT construction
//!
//! The invariant enforced here is that no caller-supplied value is ever
//! interpolated into SQL text. Identifiers pass through the registry
//! whitelist or a strict character class; values travel as positional
//! bind parameters matched 1:1 with `?` placeholders.

pub mod builder;
pub mod ident;

pub use builder::{
    build_report_query, cash_flow_query, show_relations_query, FilterValue, QuerySpec,
    RelationKind, ReportQueryParams, MAX_LIMIT,
};
pub use ident::{quote_identifier, validate_column_name, validate_pattern, validate_table_name};

/// Errors raised while validating identifiers or building queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlBuildError {
    /// Identifier contains characters outside the permitted set.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Table name has no entry in the report registry.
    #[error("Unknown table: {0}. Use list_reports to see available tables.")]
    UnknownTable(String),

    /// ORDER BY direction was neither ASC nor DESC.
    #[error("Invalid ORDER BY direction: {0}. Use ASC or DESC.")]
    InvalidOrderDirection(String),

    /// List filter with no values; `IN ()` is not valid SQL.
    #[error("Filter for column {0} has no values")]
    EmptyFilterList(String),

    /// LIKE pattern contains characters outside alphanumeric, `_` and `%`.
    #[error("Invalid pattern. Only alphanumeric characters, underscore, and % are allowed.")]
    InvalidPattern,
}
