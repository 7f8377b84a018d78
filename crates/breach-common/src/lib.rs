//! Breach Loader Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging setup, and error handling for the breach loader
//! workspace.
//!
//! - **Error Handling**: [`BreachError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber configuration ([`logging`])
//! - **Types**: import ledger vocabulary ([`types::ImportState`],
//!   [`types::LogicalDate`])
//!
//! # Example
//!
//! ```no_run
//! use breach_common::types::LogicalDate;
//!
//! fn vintage() -> breach_common::Result<()> {
//!     let date: LogicalDate = "November 19 2020".parse()?;
//!     assert_eq!(date.to_string(), "November 19 2020");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{BreachError, Result};
