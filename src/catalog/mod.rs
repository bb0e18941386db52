//! Report metadata registry.
//!
//! The registry is the primary injection defense: a report name must have
//! an exact entry here before any SQL is built for it, and the per-report
//! column sets drive column-name validation in [`crate::sql`]. The table
//! is static, loaded once, and keyed by uppercase report name.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Schema metadata for one whitelisted report (warehouse table or view).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportMetadata {
    /// Canonical uppercase report name.
    pub name: &'static str,
    /// Human-readable description, surfaced in the tool catalog.
    pub description: &'static str,
    /// Column used for date-range filtering, if the report has one.
    pub date_column: Option<&'static str>,
    /// Ordering applied when a request does not specify one.
    pub default_order_by: Option<&'static str>,
    /// Columns commonly used as filters.
    pub common_filters: &'static [&'static str],
    /// Numeric columns meaningful for summaries.
    pub summary_fields: &'static [&'static str],
}

/// Columns accepted as filters on every report regardless of metadata.
pub const UNIVERSAL_COLUMNS: &[&str] = &[
    "LOCATION_ID",
    "CLIENT_ID",
    "TEAM_MEMBER_ID",
    "SERVICE_ID",
    "PRODUCT_ID",
    "IS_DELETED",
    "STATUS",
    "PAYMENT_STATUS",
];

macro_rules! report {
    ($name:literal, $desc:literal, date: $date:expr, order: $order:expr,
     filters: [$($filter:literal),*], summary: [$($summary:literal),*]) => {
        ReportMetadata {
            name: $name,
            description: $desc,
            date_column: $date,
            default_order_by: $order,
            common_filters: &[$($filter),*],
            summary_fields: &[$($summary),*],
        }
    };
}

/// All reports exposed for querying.
pub static REPORTS: &[ReportMetadata] = &[
    // Financial & sales reports
    report!("CASH_FLOW", "Cash flow statement data",
        date: Some("PAYMENT_DATE"), order: Some("PAYMENT_DATE ASC"),
        filters: ["TRANSACTION_TYPE", "LOCATION", "TEAM_MEMBER"],
        summary: ["AMOUNT", "OPENING_BALANCE", "CLOSING_BALANCE"]),
    report!("SALES", "Comprehensive sales transactions",
        date: Some("SALE_DATE"), order: Some("SALE_DATE DESC"),
        filters: ["LOCATION_ID", "TEAM_MEMBER_ID", "CLIENT_ID", "PAYMENT_STATUS"],
        summary: ["TOTAL_SALES", "GROSS_SALES", "NET_SALES", "TOTAL_REFUND", "TOTAL_DISCOUNT"]),
    report!("SALE_ITEMS", "Individual items within sales",
        date: Some("SALE_DATE"), order: Some("SALE_DATE DESC"),
        filters: ["SALE_ID", "ITEM_CATEGORY", "SUPPLIER", "BRAND"], summary: []),
    report!("PAYMENTS", "All payment records",
        date: Some("PAYMENT_DATE"), order: Some("PAYMENT_DATE DESC"),
        filters: ["SALE_ID", "APPOINTMENT_ID", "CLIENT_ID", "LOCATION_ID"], summary: []),
    report!("COMMISSIONS", "Team member commission records",
        date: Some("COMMISSION_DATE"), order: Some("COMMISSION_DATE DESC"),
        filters: ["TEAM_MEMBER_ID", "LOCATION_ID", "CLIENT_ID"],
        summary: ["GROSS_SALES", "COMMISSION"]),
    report!("SERVICE_CHARGES", "Service charges applied during sales",
        date: Some("CHARGE_DATE"), order: Some("CHARGE_DATE DESC"),
        filters: ["SALE_ID", "LOCATION_ID", "TEAM_MEMBER_ID"], summary: []),
    report!("TAXES", "Tax information",
        date: None, order: Some("TAX_ID"), filters: [], summary: []),
    report!("TIPS", "Tip records",
        date: Some("TIP_DATE"), order: Some("TIP_DATE DESC"),
        filters: ["TEAM_MEMBER_ID", "LOCATION_ID"], summary: []),
    report!("WAGES", "Wage information",
        date: Some("WAGE_DATE"), order: Some("WAGE_DATE DESC"),
        filters: ["TEAM_MEMBER_ID"], summary: []),
    report!("DEPOSITS", "Upfront payment deposits",
        date: Some("DEPOSIT_DATE"), order: Some("DEPOSIT_DATE DESC"),
        filters: ["CLIENT_ID", "LOCATION_ID"], summary: []),
    report!("GIFT_CARDS", "Gift card transactions",
        date: Some("TRANSACTION_DATE"), order: Some("TRANSACTION_DATE DESC"),
        filters: ["GIFT_CARD_ID", "CLIENT_ID"], summary: []),
    // Booking & appointment data
    report!("BOOKINGS", "Service bookings for appointments",
        date: Some("BOOKING_DATE"), order: Some("BOOKING_DATE DESC"),
        filters: ["APPOINTMENT_ID", "SERVICE_ID", "CLIENT_ID", "TEAM_MEMBER_ID", "STATUS"],
        summary: []),
    report!("WAITLIST", "Waitlist information",
        date: Some("WAITLIST_DATE"), order: Some("WAITLIST_DATE DESC"),
        filters: ["CLIENT_ID", "SERVICE_ID", "LOCATION_ID"], summary: []),
    // Client management
    report!("CLIENTS", "Client information and history",
        date: None, order: Some("CLIENT_NAME"),
        filters: ["CLIENT_ID", "LOCATION_ID", "IS_DELETED"], summary: []),
    report!("CLIENT_NOTES", "Notes about clients",
        date: Some("NOTE_DATE"), order: Some("NOTE_DATE DESC"),
        filters: ["CLIENT_ID", "TEAM_MEMBER_ID"], summary: []),
    report!("MEMBERSHIPS", "Client membership information",
        date: Some("START_DATE"), order: Some("START_DATE DESC"),
        filters: ["CLIENT_ID", "MEMBERSHIP_TYPE", "STATUS"], summary: []),
    // Inventory & products
    report!("PRODUCTS", "Products offered for sale",
        date: None, order: Some("PRODUCT_NAME"),
        filters: ["PRODUCT_ID", "SUPPLIER", "BRAND", "IS_DELETED"], summary: []),
    report!("STOCK_MOVEMENTS", "Inventory movement tracking",
        date: Some("MOVEMENT_DATE"), order: Some("MOVEMENT_DATE DESC"),
        filters: ["PRODUCT_ID", "LOCATION_ID", "MOVEMENT_TYPE"], summary: []),
    report!("STOCK_ORDERS", "Stock order records",
        date: Some("ORDER_DATE"), order: Some("ORDER_DATE DESC"),
        filters: ["ORDER_ID", "SUPPLIER_ID", "STATUS"], summary: []),
    // Business operations
    report!("LOCATIONS", "Business locations",
        date: None, order: Some("LOCATION_NAME"),
        filters: ["LOCATION_ID", "IS_DELETED"], summary: []),
    report!("SERVICES", "Services offered",
        date: None, order: Some("SERVICE_NAME"),
        filters: ["SERVICE_ID", "SERVICE_CATEGORY", "IS_DELETED"], summary: []),
    report!("TEAM_MEMBERS", "Staff information",
        date: None, order: Some("TEAM_MEMBER_NAME"),
        filters: ["TEAM_MEMBER_ID", "LOCATION_ID", "ROLE", "IS_DELETED"], summary: []),
    report!("OCCUPANCY", "Employee occupancy and shifts",
        date: Some("OCCUPANCY_DATE"), order: Some("OCCUPANCY_DATE DESC"),
        filters: ["TEAM_MEMBER_ID", "LOCATION_ID"], summary: []),
    report!("TIMESHEETS", "Timesheet records",
        date: Some("TIMESHEET_DATE"), order: Some("TIMESHEET_DATE DESC"),
        filters: ["TEAM_MEMBER_ID", "LOCATION_ID"], summary: []),
    report!("TIME_OFF", "Time off records",
        date: Some("TIME_OFF_DATE"), order: Some("TIME_OFF_DATE DESC"),
        filters: ["TEAM_MEMBER_ID", "TIME_OFF_TYPE", "STATUS"], summary: []),
];

static REPORT_INDEX: Lazy<HashMap<&'static str, &'static ReportMetadata>> =
    Lazy::new(|| REPORTS.iter().map(|r| (r.name, r)).collect());

/// Look up report metadata by name, case-insensitively.
pub fn report_metadata(name: &str) -> Option<&'static ReportMetadata> {
    REPORT_INDEX.get(name.to_uppercase().as_str()).copied()
}

impl ReportMetadata {
    /// Whether `column` (already uppercased) is in this report's known set:
    /// common filters, summary fields, the date column, or the universal
    /// ID/status columns.
    pub fn is_known_column(&self, column: &str) -> bool {
        self.common_filters.contains(&column)
            || self.summary_fields.contains(&column)
            || self.date_column == Some(column)
            || UNIVERSAL_COLUMNS.contains(&column)
    }
}
