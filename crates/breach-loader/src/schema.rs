//! Idempotent DDL for the credential table and the import ledger

use crate::config::TableLayout;
use crate::error::StoreError;
use crate::models::{COUNT_COLUMN, IDENTIFIER_COLUMN, PASSWORD_COLUMN};
use sqlx::PgPool;
use tracing::debug;

/// `CREATE TABLE IF NOT EXISTS` for the credential table.
///
/// `count` and `password` are both nullable so that runs of different kinds
/// can fill them independently.
pub fn credential_table_ddl(layout: &TableLayout) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\
         {id} VARCHAR({id_width}) NOT NULL PRIMARY KEY, \
         {password} VARCHAR({password_width}), \
         {count} INT)",
        table = layout.table,
        id = IDENTIFIER_COLUMN,
        id_width = layout.identifier_width,
        password = PASSWORD_COLUMN,
        password_width = layout.password_width,
        count = COUNT_COLUMN,
    )
}

/// `CREATE TABLE IF NOT EXISTS` for the append-only ledger
pub fn ledger_table_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\
         import_id SERIAL PRIMARY KEY, \
         name VARCHAR(200) NOT NULL, \
         state VARCHAR(50) NOT NULL, \
         import_date DATE NOT NULL)"
    )
}

pub async fn ensure_credential_table(pool: &PgPool, layout: &TableLayout) -> Result<(), StoreError> {
    debug!(table = %layout.table, "Ensuring credential table exists");
    sqlx::query(&credential_table_ddl(layout))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn ensure_ledger_table(pool: &PgPool, table: &str) -> Result<(), StoreError> {
    debug!(table, "Ensuring ledger table exists");
    sqlx::query(&ledger_table_ddl(table)).execute(pool).await?;
    Ok(())
}
