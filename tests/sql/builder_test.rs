//! End-to-end query construction over the report registry.

use abacus::sql::{
    build_report_query, cash_flow_query, show_relations_query, FilterValue, RelationKind,
    ReportQueryParams, SqlBuildError, MAX_LIMIT,
};
use serde_json::json;

fn placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

#[test]
fn test_full_query_shape() {
    let spec = build_report_query(&ReportQueryParams {
        table: "sales",
        start_date: Some("2026-01-01"),
        end_date: Some("2026-03-31"),
        filters: vec![
            (
                "PAYMENT_STATUS".to_string(),
                FilterValue::Scalar(json!("paid")),
            ),
            (
                "LOCATION_ID".to_string(),
                FilterValue::List(vec![json!(1), json!(2), json!(3)]),
            ),
        ],
        order_by: Some("SALE_DATE DESC"),
        limit: 500,
        ..Default::default()
    })
    .unwrap();

    assert_eq!(
        spec.sql,
        "SELECT * FROM \"SALES\" \
         WHERE CAST(\"SALE_DATE\" AS DATE) BETWEEN ? AND ? \
         AND \"PAYMENT_STATUS\" = ? \
         AND \"LOCATION_ID\" IN (?, ?, ?) \
         ORDER BY \"SALE_DATE\" DESC LIMIT 500"
    );
    assert_eq!(
        spec.binds,
        vec![
            json!("2026-01-01"),
            json!("2026-03-31"),
            json!("paid"),
            json!(1),
            json!(2),
            json!(3),
        ]
    );
    assert_eq!(placeholders(&spec.sql), spec.binds.len());
}

#[test]
fn test_date_column_override() {
    let spec = build_report_query(&ReportQueryParams {
        table: "SALES",
        start_date: Some("2026-01-01"),
        date_column: Some("CREATED_AT"),
        limit: 10,
        ..Default::default()
    })
    .unwrap();
    assert!(spec.sql.contains("CAST(\"CREATED_AT\" AS DATE) >= ?"));
}

#[test]
fn test_null_literal_filter_binds_nothing() {
    let spec = build_report_query(&ReportQueryParams {
        table: "CLIENTS",
        filters: vec![
            ("CLIENT_ID".to_string(), FilterValue::Scalar(json!("NULL"))),
            ("STATUS".to_string(), FilterValue::Scalar(json!("active"))),
        ],
        limit: 10,
        ..Default::default()
    })
    .unwrap();
    assert!(spec.sql.contains("\"CLIENT_ID\" IS NULL"));
    assert_eq!(spec.binds, vec![json!("active")]);
    assert_eq!(placeholders(&spec.sql), spec.binds.len());
}

#[test]
fn test_hostile_values_stay_out_of_sql_text() {
    let payloads = [
        "'; DROP TABLE SALES; --",
        "1 OR 1=1",
        "UNION SELECT password FROM users",
    ];
    for payload in payloads {
        let spec = build_report_query(&ReportQueryParams {
            table: "SALES",
            filters: vec![(
                "PAYMENT_STATUS".to_string(),
                FilterValue::Scalar(json!(payload)),
            )],
            limit: 10,
            ..Default::default()
        })
        .unwrap();
        assert!(!spec.sql.contains(payload), "payload leaked into SQL text");
        assert_eq!(spec.binds, vec![json!(payload)]);
    }
}

#[test]
fn test_hostile_filter_column_is_rejected() {
    let err = build_report_query(&ReportQueryParams {
        table: "SALES",
        filters: vec![(
            "STATUS = 'x' OR 1=1 --".to_string(),
            FilterValue::Scalar(json!("x")),
        )],
        limit: 10,
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, SqlBuildError::InvalidIdentifier(_)));
}

#[test]
fn test_empty_list_filter_never_reaches_sql() {
    let err = build_report_query(&ReportQueryParams {
        table: "SALES",
        filters: vec![("LOCATION_ID".to_string(), FilterValue::List(Vec::new()))],
        limit: 10,
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, SqlBuildError::EmptyFilterList(_)));
    assert!(err.to_string().contains("LOCATION_ID"));
}

#[test]
fn test_limit_is_clamped_into_range() {
    let too_big = build_report_query(&ReportQueryParams {
        table: "TAXES",
        limit: 1_000_000,
        ..Default::default()
    })
    .unwrap();
    assert!(too_big.sql.ends_with(&format!("LIMIT {MAX_LIMIT}")));

    let too_small = build_report_query(&ReportQueryParams {
        table: "TAXES",
        limit: -1,
        ..Default::default()
    })
    .unwrap();
    assert!(too_small.sql.ends_with("LIMIT 1"));
}

#[test]
fn test_order_by_without_direction() {
    let spec = build_report_query(&ReportQueryParams {
        table: "BOOKINGS",
        order_by: Some("BOOKING_DATE"),
        limit: 10,
        ..Default::default()
    })
    .unwrap();
    assert!(spec.sql.contains("ORDER BY \"BOOKING_DATE\" LIMIT"));
}

#[test]
fn test_order_by_hostile_direction() {
    let err = build_report_query(&ReportQueryParams {
        table: "BOOKINGS",
        order_by: Some("BOOKING_DATE DESC; DROP TABLE BOOKINGS"),
        limit: 10,
        ..Default::default()
    })
    .unwrap_err();
    // Tokenized on whitespace: the third token makes the direction invalid.
    assert!(matches!(
        err,
        SqlBuildError::InvalidOrderDirection(_) | SqlBuildError::InvalidIdentifier(_)
    ));
}

#[test]
fn test_cash_flow_query_is_fixed() {
    let spec = cash_flow_query("2026-01-01", "2026-01-31");
    assert_eq!(
        spec.sql,
        "SELECT * FROM \"CASH_FLOW\" WHERE \"PAYMENT_DATE\" BETWEEN ? AND ? \
         ORDER BY \"PAYMENT_DATE\" ASC"
    );
    assert_eq!(spec.binds, vec![json!("2026-01-01"), json!("2026-01-31")]);
}

#[test]
fn test_show_relations_pattern_is_validated() {
    assert_eq!(
        show_relations_query(RelationKind::View, Some("%FLOW%"))
            .unwrap()
            .sql,
        "SHOW VIEWS LIKE '%FLOW%'"
    );
    assert!(show_relations_query(RelationKind::View, Some("'; SELECT 1; --")).is_err());
}
