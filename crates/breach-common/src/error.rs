//! Error types shared by the breach loader crates

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, BreachError>;

/// Errors that can surface from the shared crate
#[derive(Error, Debug)]
pub enum BreachError {
    #[error("Invalid logical date '{input}': expected a date like 'November 19 2020'")]
    InvalidDate { input: String },

    #[error("Missing required date, e.g. 'November 19 2020'")]
    MissingDate,

    #[error("Unknown import state: {0}")]
    UnknownState(String),
}
