//! Import driver: one file, one pass, one ledger entry
//!
//! ```text
//! Init ──► Streaming ──► Flushing ──► Logging ──► Done
//!   │          │
//!   └──────────┴──► fatal error (no ledger entry)
//! ```
//!
//! Row errors (bad lines) and batch errors (failed upserts) are counted and
//! decide the ledger state. Infrastructure errors (schema, open, read) abort
//! the run before anything is recorded.

use crate::batch::BatchAccumulator;
use crate::config::RunConfig;
use crate::error::{LoaderError, Result, RowError};
use crate::ledger::ImportLedger;
use crate::models::{LedgerEntry, Row};
use crate::parser::{parse_row, LineReader};
use crate::writer::RowSink;
use breach_common::types::{ImportState, LogicalDate};
use serde::Serialize;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{debug, error, info, instrument, warn};

/// Read buffer for input files
const READ_BUFFER_BYTES: usize = 1 << 20;

/// Row errors logged at `warn` before the rest drop to `debug`
const LOGGED_ROW_ERRORS: u64 = 10;

/// Phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverState {
    Init,
    Streaming,
    Flushing,
    Logging,
    Done,
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub source_name: String,
    /// Lines that parsed and encoded into a row
    pub accepted: u64,
    /// Lines skipped as malformed
    pub row_errors: u64,
    /// Batches whose upsert failed, one unit per batch
    pub batch_errors: u64,
    /// Non-empty batches handed to the sink
    pub batches: u64,
    /// Rows the store reported as inserted or updated
    pub rows_affected: u64,
    pub state: ImportState,
    /// Whether the ledger write succeeded
    pub ledger_recorded: bool,
}

impl RunSummary {
    pub fn errors(&self) -> u64 {
        self.row_errors + self.batch_errors
    }
}

#[derive(Debug, Default)]
struct RunCounters {
    accepted: u64,
    row_errors: u64,
    batch_errors: u64,
    batches: u64,
    rows_affected: u64,
}

impl RunCounters {
    fn errors(&self) -> u64 {
        self.row_errors + self.batch_errors
    }
}

/// Mutable state owned by a single run
struct RunContext<'a> {
    config: &'a RunConfig,
    batch: BatchAccumulator,
    counters: RunCounters,
    state: DriverState,
}

impl<'a> RunContext<'a> {
    fn new(config: &'a RunConfig) -> Self {
        Self {
            config,
            batch: BatchAccumulator::new(config.kind, config.batch_size),
            counters: RunCounters::default(),
            state: DriverState::Init,
        }
    }

    fn transition(&mut self, next: DriverState) {
        debug!(from = ?self.state, to = ?next, "Driver state change");
        self.state = next;
    }

    fn row_error(&mut self, line_number: u64, err: &RowError) {
        self.counters.row_errors += 1;
        if self.counters.row_errors <= LOGGED_ROW_ERRORS {
            warn!(line = line_number, error = %err, "Skipping line");
        } else {
            debug!(line = line_number, error = %err, "Skipping line");
        }
    }
}

/// Streams one input through parse → encode → batch → upsert → ledger
pub struct ImportPipeline<S, L> {
    config: RunConfig,
    sink: S,
    ledger: L,
}

impl<S: RowSink, L: ImportLedger> ImportPipeline<S, L> {
    /// Fails if `config` cannot run against Postgres
    pub fn new(config: RunConfig, sink: S, ledger: L) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sink,
            ledger,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Import the file at `path`
    #[instrument(
        skip_all,
        fields(source = %self.config.source_name, kind = %self.config.kind, path = %path.as_ref().display())
    )]
    pub async fn run(&self, path: impl AsRef<Path>, logical_date: LogicalDate) -> Result<RunSummary> {
        let path = path.as_ref();
        info!(date = %logical_date, "Processing file");

        self.prepare().await?;
        let file = File::open(path).await.map_err(|source| LoaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        self.import(
            BufReader::with_capacity(READ_BUFFER_BYTES, file),
            logical_date,
        )
        .await
    }

    /// Import from an already opened reader
    pub async fn run_reader<R>(&self, reader: R, logical_date: LogicalDate) -> Result<RunSummary>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        self.prepare().await?;
        self.import(reader, logical_date).await
    }

    async fn prepare(&self) -> Result<()> {
        self.sink.prepare().await.map_err(LoaderError::Schema)?;
        self.ledger.prepare().await.map_err(LoaderError::Schema)?;
        Ok(())
    }

    async fn import<R>(&self, reader: R, logical_date: LogicalDate) -> Result<RunSummary>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let mut ctx = RunContext::new(&self.config);
        let mut lines = LineReader::new(reader);

        ctx.transition(DriverState::Streaming);
        loop {
            let parsed = match lines.next_line().await.map_err(LoaderError::Read)? {
                None => break,
                Some(line) => {
                    line.and_then(|line| parse_row(self.config.kind, self.config.encoding, line))
                }
            };

            match parsed {
                Ok(row) => {
                    ctx.counters.accepted += 1;
                    ctx.batch.append(row);
                    if ctx.batch.should_flush() {
                        info!(processed = ctx.counters.accepted, "Processing batch");
                        self.flush(&mut ctx).await;
                    }
                }
                Err(err) => ctx.row_error(lines.line_number(), &err),
            }
        }

        // Always called, even with nothing buffered
        ctx.transition(DriverState::Flushing);
        self.flush(&mut ctx).await;

        ctx.transition(DriverState::Logging);
        let errors = ctx.counters.errors();
        let state = ImportState::from_error_count(errors);
        if errors > 0 {
            warn!(errors, "{} error(s) found", errors);
        }

        let entry = LedgerEntry {
            source_name: self.config.source_name.clone(),
            state,
            logical_date,
        };
        let ledger_recorded = match self.ledger.record(&entry).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, state = %state, "Failed to write import ledger entry");
                false
            }
        };

        ctx.transition(DriverState::Done);
        let counters = ctx.counters;
        let summary = RunSummary {
            source_name: entry.source_name,
            accepted: counters.accepted,
            row_errors: counters.row_errors,
            batch_errors: counters.batch_errors,
            batches: counters.batches,
            rows_affected: counters.rows_affected,
            state,
            ledger_recorded,
        };

        info!(
            accepted = summary.accepted,
            errors = summary.errors(),
            batches = summary.batches,
            state = %summary.state,
            "Import finished"
        );

        Ok(summary)
    }

    /// Drain the accumulator into the sink. A failed batch is dropped and
    /// counted once.
    async fn flush(&self, ctx: &mut RunContext<'_>) {
        let rows = ctx.batch.drain();
        let size = rows.len();

        match self.sink.upsert(&rows).await {
            Ok(affected) => {
                if size > 0 {
                    ctx.counters.batches += 1;
                }
                ctx.counters.rows_affected += affected;
            }
            Err(e) => {
                ctx.counters.batches += 1;
                ctx.counters.batch_errors += 1;
                error!(
                    error = %e,
                    rows = size,
                    first_identifier = rows.first().map(Row::identifier).unwrap_or_default(),
                    table = %ctx.config.layout.table,
                    "Batch upsert failed"
                );
            }
        }
    }
}
