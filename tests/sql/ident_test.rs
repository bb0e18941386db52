//! Identifier validation against hostile input.

use abacus::sql::{
    quote_identifier, validate_column_name, validate_pattern, validate_table_name, SqlBuildError,
};

#[test]
fn test_quote_identifier_basic() {
    assert_eq!(quote_identifier("sales").unwrap(), "\"SALES\"");
    assert_eq!(quote_identifier("PAYMENT_DATE").unwrap(), "\"PAYMENT_DATE\"");
    assert_eq!(quote_identifier("_internal").unwrap(), "\"_INTERNAL\"");
}

#[test]
fn test_quote_identifier_strips_embedded_quotes() {
    assert_eq!(quote_identifier("\"CASH_FLOW\"").unwrap(), "\"CASH_FLOW\"");
    // Quote stripping happens before validation, so a quote-smuggled
    // payload is judged on what remains.
    assert!(quote_identifier("\"a\"\"; DROP TABLE x; --\"").is_err());
}

#[test]
fn test_quote_identifier_rejects_sql_metacharacters() {
    for bad in [
        "name; DROP TABLE SALES",
        "name--comment",
        "name'",
        "a b",
        "semi;colon",
        "paren(",
        "star*",
        "",
        " ",
    ] {
        assert!(
            matches!(quote_identifier(bad), Err(SqlBuildError::InvalidIdentifier(_))),
            "expected rejection for {bad:?}"
        );
    }
}

#[test]
fn test_table_name_is_whitelist_only() {
    // Case-insensitive exact match against the registry.
    assert_eq!(validate_table_name("cash_flow").unwrap().name, "CASH_FLOW");
    assert_eq!(validate_table_name("Sales").unwrap().name, "SALES");

    // Syntactically valid identifiers that are not reports are refused.
    for bad in ["USERS", "INFORMATION_SCHEMA", "ACCOUNT_USAGE", "SNOWFLAKE"] {
        assert!(
            matches!(validate_table_name(bad), Err(SqlBuildError::UnknownTable(_))),
            "expected unknown-table for {bad:?}"
        );
    }
}

#[test]
fn test_unknown_table_error_mentions_list_reports() {
    let err = validate_table_name("NOT_A_REPORT").unwrap_err();
    assert!(err.to_string().contains("list_reports"));
}

#[test]
fn test_column_name_accepts_registry_columns() {
    let table = validate_table_name("SALES").unwrap();
    // Universal columns are known for every report.
    assert_eq!(
        validate_column_name("location_id", table).unwrap(),
        "\"LOCATION_ID\""
    );
    // The report's own date column is known.
    assert_eq!(
        validate_column_name("SALE_DATE", table).unwrap(),
        "\"SALE_DATE\""
    );
}

#[test]
fn test_column_name_strict_fallback() {
    let table = validate_table_name("SALES").unwrap();
    // Uncatalogued but well-formed: accepted via the strict pattern.
    assert_eq!(
        validate_column_name("GrossAmount", table).unwrap(),
        "\"GROSSAMOUNT\""
    );
    // Uncatalogued and malformed: rejected.
    assert!(validate_column_name("_leading_underscore", table).is_err());
    assert!(validate_column_name("1col", table).is_err());
    assert!(validate_column_name("col; --", table).is_err());
}

#[test]
fn test_pattern_rejects_quotes_and_spaces() {
    assert!(validate_pattern("CASH_FLOW").is_ok());
    assert!(validate_pattern("%REPORT%").is_ok());
    assert!(validate_pattern("abc123").is_ok());

    for bad in ["x' OR '1'='1", "a b", "x;", "", "100%\""] {
        assert!(
            matches!(validate_pattern(bad), Err(SqlBuildError::InvalidPattern)),
            "expected rejection for {bad:?}"
        );
    }
}
