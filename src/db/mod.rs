use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    domain::{ReportEvent, ReportFilter},
    errors::AppError,
};

pub mod memory;
pub mod pg;

/// Read-only access to the report event table.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Rows matching `filter`, newest first.
    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<ReportEvent>, AppError>;
    async fn count_reports(&self, filter: &ReportFilter) -> Result<i64, AppError>;
    async fn most_recent(&self) -> Result<Option<ReportEvent>, AppError>;
}

pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
