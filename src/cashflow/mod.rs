//! Cash-flow aggregation.
//!
//! Post-processes raw cash-flow rows into a summary: totals, balances and
//! a per-type breakdown. The input must already be sorted ascending by
//! payment date; the fixed cash-flow fetch guarantees that, and the
//! aggregator reads the opening balance from the first row and the
//! closing balance from the last.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One cash-flow transaction, as fetched from the warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CashFlowRow {
    pub transaction_ref: String,
    /// ISO `YYYY-MM-DD` payment date.
    pub payment_date: String,
    pub transaction_type: String,
    /// Signed amount: inflow > 0, outflow < 0.
    pub amount: f64,
    pub opening_balance: f64,
    pub closing_balance: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_member: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

/// The reporting period a summary covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_date: String,
    pub end_date: String,
}

/// Count and signed amount total for one transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeBreakdown {
    pub count: u64,
    pub amount: f64,
}

/// Derived cash-flow summary, recomputed on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowSummary {
    pub period: Period,
    pub total_transactions: u64,
    /// Sum of positive amounts.
    pub total_inflow: f64,
    /// Sum of absolute values of negative amounts.
    pub total_outflow: f64,
    pub net_cash_flow: f64,
    /// First row's opening balance, 0 for an empty period.
    pub opening_balance: f64,
    /// Last row's closing balance, 0 for an empty period.
    pub closing_balance: f64,
    pub transactions_by_type: BTreeMap<String, TypeBreakdown>,
}

/// Summarize cash-flow rows in a single linear pass.
///
/// Zero-amount rows contribute to neither inflow nor outflow but still
/// count toward the transaction total and their type bucket.
pub fn summarize(rows: &[CashFlowRow], period: Period) -> CashFlowSummary {
    let mut total_inflow = 0.0;
    let mut total_outflow = 0.0;
    let mut transactions_by_type: BTreeMap<String, TypeBreakdown> = BTreeMap::new();

    for row in rows {
        if row.amount > 0.0 {
            total_inflow += row.amount;
        } else if row.amount < 0.0 {
            total_outflow += -row.amount;
        }

        let bucket = transactions_by_type
            .entry(row.transaction_type.clone())
            .or_default();
        bucket.count += 1;
        bucket.amount += row.amount;
    }

    CashFlowSummary {
        period,
        total_transactions: rows.len() as u64,
        total_inflow,
        total_outflow,
        net_cash_flow: total_inflow - total_outflow,
        opening_balance: rows.first().map_or(0.0, |r| r.opening_balance),
        closing_balance: rows.last().map_or(0.0, |r| r.closing_balance),
        transactions_by_type,
    }
}
