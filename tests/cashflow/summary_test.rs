//! Cash-flow summarization over realistic row sets.

use abacus::cashflow::{summarize, CashFlowRow, CashFlowSummary, Period};

fn row(
    reference: &str,
    date: &str,
    transaction_type: &str,
    amount: f64,
    opening: f64,
    closing: f64,
) -> CashFlowRow {
    CashFlowRow {
        transaction_ref: reference.to_string(),
        payment_date: date.to_string(),
        transaction_type: transaction_type.to_string(),
        amount,
        opening_balance: opening,
        closing_balance: closing,
        currency: "GBP".to_string(),
        location: Some("Main Branch".to_string()),
        team_member: None,
        client: None,
    }
}

fn january() -> Period {
    Period {
        start_date: "2026-01-01".to_string(),
        end_date: "2026-01-31".to_string(),
    }
}

#[test]
fn test_month_of_mixed_transactions() {
    let rows = vec![
        row("TXN001", "2026-01-02", "sale", 150.0, 1000.0, 1150.0),
        row("TXN002", "2026-01-05", "deposit_collection", 50.0, 1150.0, 1200.0),
        row("TXN003", "2026-01-20", "platform_fee", -5.25, 1200.0, 1194.75),
        row("TXN004", "2026-01-28", "payout", -500.0, 1194.75, 694.75),
    ];
    let summary = summarize(&rows, january());

    assert_eq!(summary.total_transactions, 4);
    assert_eq!(summary.total_inflow, 200.0);
    assert_eq!(summary.total_outflow, 505.25);
    assert_eq!(summary.net_cash_flow, -305.25);
    // Balances are positional: opening from the first row, closing from
    // the last, which is why the fetch orders ascending by payment date.
    assert_eq!(summary.opening_balance, 1000.0);
    assert_eq!(summary.closing_balance, 694.75);
}

#[test]
fn test_breakdown_keys_and_totals() {
    let rows = vec![
        row("TXN001", "2026-01-02", "sale", 100.0, 0.0, 100.0),
        row("TXN002", "2026-01-03", "sale", 250.0, 100.0, 350.0),
        row("TXN003", "2026-01-04", "refund", -40.0, 350.0, 310.0),
    ];
    let summary = summarize(&rows, january());

    assert_eq!(summary.transactions_by_type.len(), 2);
    let sale = &summary.transactions_by_type["sale"];
    assert_eq!(sale.count, 2);
    assert_eq!(sale.amount, 350.0);
    // Breakdown amounts stay signed; only the outflow total is absolute.
    let refund = &summary.transactions_by_type["refund"];
    assert_eq!(refund.count, 1);
    assert_eq!(refund.amount, -40.0);
}

#[test]
fn test_empty_period_is_all_zeros() {
    let summary = summarize(&[], january());
    assert_eq!(
        summary,
        CashFlowSummary {
            period: january(),
            total_transactions: 0,
            total_inflow: 0.0,
            total_outflow: 0.0,
            net_cash_flow: 0.0,
            opening_balance: 0.0,
            closing_balance: 0.0,
            transactions_by_type: Default::default(),
        }
    );
}

#[test]
fn test_single_inflow_only() {
    let rows = vec![row("TXN001", "2026-01-15", "sale", 99.99, 0.0, 99.99)];
    let summary = summarize(&rows, january());
    assert_eq!(summary.total_inflow, 99.99);
    assert_eq!(summary.total_outflow, 0.0);
    assert_eq!(summary.net_cash_flow, 99.99);
    assert_eq!(summary.opening_balance, 0.0);
    assert_eq!(summary.closing_balance, 99.99);
}

#[test]
fn test_period_is_echoed_verbatim() {
    let period = Period {
        start_date: "2025-07-01".to_string(),
        end_date: "2025-07-31".to_string(),
    };
    let summary = summarize(&[], period.clone());
    assert_eq!(summary.period, period);
}

#[test]
fn test_summary_serializes_camel_case() {
    let summary = summarize(
        &[row("TXN001", "2026-01-02", "sale", 10.0, 0.0, 10.0)],
        january(),
    );
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["totalInflow"], 10.0);
    assert_eq!(json["netCashFlow"], 10.0);
    assert_eq!(json["period"]["startDate"], "2026-01-01");
    assert_eq!(json["transactionsByType"]["sale"]["count"], 1);
}
