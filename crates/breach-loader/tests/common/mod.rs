//! Shared helpers for breach-loader integration tests
//!
//! - In-memory [`RecordingSink`] and [`MemoryLedger`] for driver tests
//! - [`TestPostgres`]: a throwaway PostgreSQL container (requires Docker)

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use breach_common::types::LogicalDate;
use breach_loader::error::StoreError;
use breach_loader::ledger::ImportLedger;
use breach_loader::models::{LedgerEntry, Row};
use breach_loader::writer::RowSink;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashSet;
use std::io::{self, Write};
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader, ReadBuf};

pub const SHA1_A: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
pub const SHA1_B: &str = "BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";
pub const SHA1_PASSWORD: &str = "5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8";

pub fn logical_date() -> LogicalDate {
    "November 19 2020".parse().unwrap()
}

/// Write `contents` to a temporary file that lives as long as the handle
pub fn input_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// `n` distinct, valid count-form lines
pub fn count_lines(n: usize) -> String {
    (0..n).map(|i| format!("{:040X}:{}\n", i, i + 1)).collect()
}

/// Yields `contents`, then fails every further read
pub fn failing_after(contents: &str) -> BufReader<impl AsyncRead + Unpin + Send + '_> {
    BufReader::new(contents.as_bytes().chain(BrokenRead))
}

struct BrokenRead;

impl AsyncRead for BrokenRead {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut TaskContext<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::other("input/output error")))
    }
}

// ============================================================================
// In-memory stores
// ============================================================================

/// Records every batch handed to it; batches listed in `fail_batches`
/// (0-based call index) are rejected.
#[derive(Default)]
pub struct RecordingSink {
    pub batches: Mutex<Vec<Vec<Row>>>,
    pub prepared: Mutex<u32>,
    fail_batches: HashSet<usize>,
    fail_prepare: bool,
}

impl RecordingSink {
    pub fn failing_on(batches: impl IntoIterator<Item = usize>) -> Self {
        Self {
            fail_batches: batches.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn failing_prepare() -> Self {
        Self {
            fail_prepare: true,
            ..Self::default()
        }
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn rows(&self) -> Vec<Row> {
        self.batches.lock().unwrap().concat()
    }
}

#[async_trait]
impl RowSink for RecordingSink {
    async fn prepare(&self) -> Result<(), StoreError> {
        if self.fail_prepare {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        *self.prepared.lock().unwrap() += 1;
        Ok(())
    }

    async fn upsert(&self, rows: &[Row]) -> Result<u64, StoreError> {
        let mut batches = self.batches.lock().unwrap();
        let call = batches.len();
        batches.push(rows.to_vec());
        if self.fail_batches.contains(&call) {
            return Err(StoreError::Database(sqlx::Error::Protocol(
                "value too long for type character varying(40)".to_string(),
            )));
        }
        Ok(rows.len() as u64)
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    pub entries: Mutex<Vec<LedgerEntry>>,
    fail: bool,
}

impl MemoryLedger {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImportLedger for MemoryLedger {
    async fn record(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

// ============================================================================
// PostgreSQL Test Container
// ============================================================================

/// PostgreSQL container with a connected pool; dropped with the test
pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    pool: PgPool,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        let container = Postgres::default()
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let pool = PgPoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&format!("postgresql://postgres:postgres@{}:{}/postgres", host, port))
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self {
            _container: container,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
