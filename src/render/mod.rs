//! Markdown rendering of tool results.

use serde_json::Value;

use crate::cashflow::CashFlowSummary;
use crate::driver::protocol::Row;
use crate::service::RelationInfo;

/// Render the relation catalog as a markdown table.
pub fn relations_table(relations: &[RelationInfo]) -> String {
    if relations.is_empty() {
        return "No tables or views found.".to_string();
    }

    let mut out = String::from("# Available Tables and Views\n\n");
    out.push_str("| Name | Type | Database | Schema | Comment |\n");
    out.push_str("|------|------|----------|--------|---------|\n");

    for relation in relations {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            relation.name,
            relation.kind,
            relation.database_name,
            relation.schema_name,
            relation.comment.as_deref().unwrap_or("-"),
        ));
    }

    out.push_str(&format!("\n**Total:** {} objects", relations.len()));
    out
}

/// Render a cash-flow summary as a markdown statement.
pub fn cash_flow_statement(summary: &CashFlowSummary) -> String {
    let mut out = String::from("# Cash Flow Statement\n\n");
    out.push_str(&format!(
        "**Period:** {} to {}\n\n",
        summary.period.start_date, summary.period.end_date
    ));

    out.push_str("## Summary\n\n");
    out.push_str("| Metric | Amount |\n");
    out.push_str("|--------|--------|\n");
    out.push_str(&format!("| Opening Balance | {:.2} |\n", summary.opening_balance));
    out.push_str(&format!("| Total Inflow | {:.2} |\n", summary.total_inflow));
    out.push_str(&format!("| Total Outflow | {:.2} |\n", summary.total_outflow));
    out.push_str(&format!("| Net Cash Flow | {:.2} |\n", summary.net_cash_flow));
    out.push_str(&format!("| Closing Balance | {:.2} |\n", summary.closing_balance));
    out.push_str(&format!(
        "| Total Transactions | {} |\n\n",
        summary.total_transactions
    ));

    out.push_str("## Transaction Breakdown\n\n");
    out.push_str("| Type | Count | Total Amount |\n");
    out.push_str("|------|-------|--------------|\n");
    for (transaction_type, breakdown) in &summary.transactions_by_type {
        out.push_str(&format!(
            "| {} | {} | {:.2} |\n",
            transaction_type, breakdown.count, breakdown.amount
        ));
    }

    out
}

/// Render a generic row set as a markdown table.
///
/// Column order follows the first row's key order (the order the driver
/// emitted them in).
pub fn rows_table(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return "No rows returned.".to_string();
    };

    let columns: Vec<&String> = first.keys().collect();

    let mut out = String::new();
    out.push_str(&format!(
        "| {} |\n",
        columns
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    ));
    out.push_str(&format!("|{}\n", "------|".repeat(columns.len())));

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| row.get(*column).map_or_else(|| "-".to_string(), cell))
            .collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    out.push_str(&format!("\n**Rows:** {}", rows.len()));
    out
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
