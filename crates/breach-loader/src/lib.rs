//! Breach Loader Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Streams breached-credential corpora (`hexdigest:count` or
//! `hexdigest:plaintext` lines) into PostgreSQL with batched multi-row
//! upserts, and records every run in an append-only ledger.
//!
//! # Pipeline
//!
//! - [`parser`]: `key:value` lines from any `AsyncBufRead`
//! - [`identifier`]: lowercase hex passthrough or hex → [`ascii85`]
//! - [`batch`]: fixed-size row buffer
//! - [`writer`]: `INSERT … ON CONFLICT` per batch via [`writer::RowSink`]
//! - [`ledger`]: one audit row per run via [`ledger::ImportLedger`]
//! - [`pipeline`]: the driver tying it together
//!
//! # Example
//!
//! ```no_run
//! use breach_loader::config::RunConfig;
//! use breach_loader::db::{create_pool, DbConfig};
//! use breach_loader::ledger::PgImportLedger;
//! use breach_loader::models::RowKind;
//! use breach_loader::pipeline::ImportPipeline;
//! use breach_loader::writer::PgUpsertWriter;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = create_pool(&DbConfig::from_env()?).await?;
//!     let config = RunConfig::for_kind(RowKind::Count);
//!     let pipeline = ImportPipeline::new(
//!         config.clone(),
//!         PgUpsertWriter::new(pool.clone(), config.layout.clone()),
//!         PgImportLedger::new(pool, config.ledger_table.clone()),
//!     )?;
//!
//!     let summary = pipeline
//!         .run("pwned-passwords-sha1-ordered-by-hash-v8.txt", "July 1 2021".parse()?)
//!         .await?;
//!     tracing::info!(accepted = summary.accepted, "done");
//!     Ok(())
//! }
//! ```

pub mod ascii85;
pub mod batch;
pub mod config;
pub mod db;
pub mod error;
pub mod identifier;
pub mod ledger;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod schema;
pub mod writer;

pub use error::{LoaderError, Result};
