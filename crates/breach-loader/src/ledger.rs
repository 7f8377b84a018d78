//! Append-only import ledger

use crate::error::StoreError;
use crate::models::LedgerEntry;
use crate::schema;
use async_trait::async_trait;
use sqlx::PgPool;

/// Where run outcomes are recorded
#[async_trait]
pub trait ImportLedger: Send + Sync {
    async fn prepare(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Append exactly one entry
    async fn record(&self, entry: &LedgerEntry) -> Result<(), StoreError>;
}

/// Postgres implementation of [`ImportLedger`]
#[derive(Debug, Clone)]
pub struct PgImportLedger {
    pool: PgPool,
    table: String,
}

impl PgImportLedger {
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }
}

#[async_trait]
impl ImportLedger for PgImportLedger {
    async fn prepare(&self) -> Result<(), StoreError> {
        schema::ensure_ledger_table(&self.pool, &self.table).await
    }

    async fn record(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        let query = format!(
            "INSERT INTO {} (name, state, import_date) VALUES ($1, $2, $3)",
            self.table
        );
        sqlx::query(&query)
            .bind(&entry.source_name)
            .bind(entry.state.as_str())
            .bind(entry.logical_date.date())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
