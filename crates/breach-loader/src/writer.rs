//! Multi-row upsert of one batch

use crate::config::TableLayout;
use crate::error::StoreError;
use crate::models::{ConflictPolicy, Row, IDENTIFIER_COLUMN};
use crate::schema;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

/// Destination for batches of rows
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Make sure the destination exists; called once before streaming
    async fn prepare(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Write one batch, returning the number of rows the store reports as
    /// affected. An empty batch must be a no-op.
    async fn upsert(&self, rows: &[Row]) -> Result<u64, StoreError>;
}

/// Build the `INSERT … ON CONFLICT` statement for a homogeneous batch.
///
/// Returns `Ok(None)` for an empty batch.
pub fn build_upsert<'a>(
    table: &str,
    rows: &'a [Row],
) -> Result<Option<QueryBuilder<'a, Postgres>>, StoreError> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    let kind = first.kind();
    if let Some(other) = rows.iter().find(|row| row.kind() != kind) {
        return Err(StoreError::MixedBatch {
            expected: kind,
            found: other.kind(),
        });
    }

    let mut query_builder: QueryBuilder<'a, Postgres> = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) ",
        table,
        kind.columns().join(", ")
    ));

    query_builder.push_values(rows, |mut b, row| match row {
        Row::Count { identifier, count } => {
            b.push_bind(identifier.as_str()).push_bind(*count);
        }
        Row::Password {
            identifier,
            password,
        } => {
            b.push_bind(identifier.as_str()).push_bind(password.as_str());
        }
        Row::Presence { identifier } => {
            b.push_bind(identifier.as_str());
        }
    });

    query_builder.push(format!(" ON CONFLICT ({}) ", IDENTIFIER_COLUMN));
    match kind.conflict_policy() {
        ConflictPolicy::UpdateColumns(columns) => {
            query_builder.push("DO UPDATE SET ");
            let mut assignments = query_builder.separated(", ");
            for column in columns {
                assignments.push(format!("{column} = EXCLUDED.{column}"));
            }
        }
        ConflictPolicy::DoNothing => {
            query_builder.push("DO NOTHING");
        }
    }

    Ok(Some(query_builder))
}

/// Postgres implementation of [`RowSink`]
#[derive(Debug, Clone)]
pub struct PgUpsertWriter {
    pool: PgPool,
    layout: TableLayout,
}

impl PgUpsertWriter {
    pub fn new(pool: PgPool, layout: TableLayout) -> Self {
        Self { pool, layout }
    }
}

#[async_trait]
impl RowSink for PgUpsertWriter {
    async fn prepare(&self) -> Result<(), StoreError> {
        schema::ensure_credential_table(&self.pool, &self.layout).await
    }

    async fn upsert(&self, rows: &[Row]) -> Result<u64, StoreError> {
        let Some(mut query_builder) = build_upsert(&self.layout.table, rows)? else {
            return Ok(0);
        };

        let result = query_builder.build().execute(&self.pool).await?;
        debug!(
            rows = rows.len(),
            affected = result.rows_affected(),
            "Batch upserted"
        );
        Ok(result.rows_affected())
    }
}
