//! Warehouse driver communication.
//!
//! The warehouse is reached through a driver sidecar process speaking
//! NDJSON (newline-delimited JSON) over stdin/stdout. Each request carries
//! a unique ID for correlation with responses, so concurrent requests can
//! share one driver process.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                   ConnectionManager                      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼  session.open / statement.execute / session.close
//! ┌─────────────────────────────────────────────────────────┐
//! │                     DriverClient                         │
//! │              (NDJSON over stdin/stdout)                  │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod client;
mod error;
pub mod protocol;

pub use client::DriverClient;
pub use error::{DriverError, DriverResult};
