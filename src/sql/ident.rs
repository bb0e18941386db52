//! Identifier quoting and whitelist validation.
//!
//! Table names are only ever accepted via an exact registry match; there
//! is no pattern fallback for tables because the report surface is closed.
//! Column names are whitelisted against the report's known-column set
//! first, with a strict character class as the belt for columns not yet
//! catalogued.

use once_cell::sync::Lazy;
use regex::Regex;

use super::SqlBuildError;
use crate::catalog::{report_metadata, ReportMetadata};

/// Warehouse identifier rules: letters, digits, `_` and `$`, not starting
/// with a digit or `$`.
static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("valid regex"));

/// Stricter pattern for columns absent from the metadata whitelist.
static STRICT_COLUMN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid regex"));

/// Safe characters for `SHOW ... LIKE` patterns.
static PATTERN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_%]+$").expect("valid regex"));

/// Validate and quote an identifier destined for SQL text.
///
/// Strips any embedded double quotes, checks the remainder against the
/// identifier pattern, and returns the uppercased name wrapped in double
/// quotes. Idempotent on the unwrapped form of its own output.
pub fn quote_identifier(raw: &str) -> Result<String, SqlBuildError> {
    let cleaned = raw.replace('"', "");

    if !IDENTIFIER_RE.is_match(&cleaned) {
        return Err(SqlBuildError::InvalidIdentifier(raw.to_string()));
    }

    Ok(format!("\"{}\"", cleaned.to_uppercase()))
}

/// Validate a table name against the report registry.
///
/// Returns the registry entry; the lookup is case-insensitive and there is
/// no fallback for names without an exact match.
pub fn validate_table_name(raw: &str) -> Result<&'static ReportMetadata, SqlBuildError> {
    report_metadata(raw).ok_or_else(|| SqlBuildError::UnknownTable(raw.to_string()))
}

/// Validate a column name for use in a predicate or ORDER BY.
///
/// Columns in the report's known set (filters, summary fields, date
/// column, universal ID/status columns) are accepted as-is; anything else
/// must additionally satisfy the strict column pattern.
pub fn validate_column_name(
    raw: &str,
    table: &ReportMetadata,
) -> Result<String, SqlBuildError> {
    let upper = raw.to_uppercase();

    if !table.is_known_column(&upper) && !STRICT_COLUMN_RE.is_match(raw) {
        return Err(SqlBuildError::InvalidIdentifier(raw.to_string()));
    }

    quote_identifier(&upper)
}

/// Validate a wildcard pattern for `SHOW TABLES|VIEWS LIKE`.
///
/// SHOW statements do not accept bind parameters, so the pattern is
/// restricted to a safe character set before being embedded as a string
/// literal.
pub fn validate_pattern(pattern: &str) -> Result<(), SqlBuildError> {
    if PATTERN_RE.is_match(pattern) {
        Ok(())
    } else {
        Err(SqlBuildError::InvalidPattern)
    }
}
