//! Error taxonomy for an import run
//!
//! - [`RowError`]: one input line is skipped and counted
//! - [`StoreError`]: one batch (or the ledger write) failed; counted or logged
//! - [`LoaderError`]: the run is aborted before the ledger is written

use crate::identifier::IdentifierEncoding;
use crate::models::RowKind;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fatal loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Recoverable per-line failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("line has no ':' separator")]
    MissingSeparator,

    #[error("line has an empty key or value")]
    EmptyField,

    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    #[error("count '{value}' is not an integer")]
    InvalidCount { value: String },

    #[error("identifier is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("re-encoded identifier is not printable text")]
    NonTextIdentifier,
}

/// Failures talking to the destination store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("batch mixes {expected} rows with {found} rows")]
    MixedBatch { expected: RowKind, found: RowKind },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Invalid per-run or process configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingEnv(&'static str),

    #[error("batch size must be greater than 0")]
    ZeroBatchSize,

    #[error(
        "batch size {batch_size} needs {params} bind parameters per statement, limit is {limit}"
    )]
    TooManyParameters {
        batch_size: usize,
        params: usize,
        limit: usize,
    },

    #[error("'{0}' is not a valid table name")]
    InvalidTableName(String),

    #[error("column width must be greater than 0")]
    ZeroWidth,

    #[error("{encoding} identifiers need {needed} characters, identifier column is {width}")]
    IdentifierTooWide {
        encoding: IdentifierEncoding,
        needed: usize,
        width: u16,
    },
}

/// Fatal errors: the run stops and no ledger entry is written
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read input: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to prepare destination schema: {0}")]
    Schema(#[source] StoreError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Common(#[from] breach_common::BreachError),
}
