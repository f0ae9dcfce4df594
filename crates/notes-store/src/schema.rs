//! Schema definitions and migration utilities.

use sqlx::PgPool;

use crate::error::{StoreError, StoreResult};

/// Embedded migration SQL for the documents table (001_documents.sql).
pub const DOCUMENTS_MIGRATION: &str = include_str!("../../../migrations/001_documents.sql");

/// Run all migrations against the database.
///
/// Every statement is `IF NOT EXISTS`, so this can run on each startup.
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    tracing::info!("Running database migrations...");

    tracing::debug!("Running documents migration (001_documents.sql)...");
    sqlx::raw_sql(DOCUMENTS_MIGRATION)
        .execute(pool)
        .await
        .map_err(|e| StoreError::MigrationError(format!("Documents migration failed: {}", e)))?;

    tracing::info!("Migrations completed successfully");
    Ok(())
}
