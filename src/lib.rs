//! # Abacus
//!
//! Read-only business reporting tools backed by a cloud data warehouse.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │           Tool surface (tools, server, CLI)              │
//! │   list_reports / get_report / get_cash_flow_statement    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                    ReportService                         │
//! │          (Backend trait: warehouse or mock)              │
//! └─────────────────────────────────────────────────────────┘
//!            │                              │
//!            ▼ [catalog + sql]              ▼ [cashflow]
//! ┌──────────────────────────┐   ┌─────────────────────────┐
//! │  Metadata registry and   │   │  Cash-flow aggregation  │
//! │  safe query builder      │   │  (summarize)            │
//! └──────────────────────────┘   └─────────────────────────┘
//!            │
//!            ▼ [warehouse]
//! ┌─────────────────────────────────────────────────────────┐
//! │   ConnectionManager (single-flight connect, retry)       │
//! └─────────────────────────────────────────────────────────┘
//!            │
//!            ▼ [driver]
//! ┌─────────────────────────────────────────────────────────┐
//! │      Warehouse driver process (NDJSON over stdio)        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every identifier that reaches SQL text is validated against the report
//! registry or a strict pattern, and every value travels as a positional
//! bind parameter. The warehouse connection is owned by one injected
//! `ConnectionManager`; when credentials are absent the service runs
//! against a deterministic in-memory mock backend instead.

pub mod cashflow;
pub mod catalog;
pub mod config;
pub mod driver;
pub mod render;
pub mod server;
pub mod service;
pub mod sql;
pub mod tools;
pub mod warehouse;

pub use cashflow::{summarize, CashFlowRow, CashFlowSummary};
pub use catalog::{report_metadata, ReportMetadata};
pub use config::{ConfigError, WarehouseConfig};
pub use service::{Backend, ReportRequest, ReportService, ServiceError};
pub use sql::{build_report_query, FilterValue, QuerySpec, SqlBuildError};
pub use warehouse::{ConnectionManager, WarehouseError};
