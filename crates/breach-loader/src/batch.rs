//! Fixed-size row buffer between the parser and the upsert writer

use crate::models::{Row, RowKind};

/// Buffers rows of a single kind until a batch is full
#[derive(Debug)]
pub struct BatchAccumulator {
    kind: RowKind,
    batch_size: usize,
    rows: Vec<Row>,
}

impl BatchAccumulator {
    /// `batch_size` is clamped to at least one row
    pub fn new(kind: RowKind, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            kind,
            batch_size,
            rows: Vec::with_capacity(batch_size),
        }
    }

    pub fn kind(&self) -> RowKind {
        self.kind
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn append(&mut self, row: Row) {
        debug_assert_eq!(row.kind(), self.kind, "row kind does not match batch");
        self.rows.push(row);
    }

    pub fn should_flush(&self) -> bool {
        self.rows.len() >= self.batch_size
    }

    /// Hand over the buffered rows and start a fresh, empty batch
    pub fn drain(&mut self) -> Vec<Row> {
        std::mem::replace(&mut self.rows, Vec::with_capacity(self.batch_size))
    }
}
