use async_trait::async_trait;
use sqlx::migrate::MigrateError;
use thiserror::Error;

use clusterpilot_core::domain::row::SegmentRow;
use clusterpilot_core::errors::ApplicationError;

pub mod memory;
pub mod sql;

pub use memory::InMemoryClusterSource;
pub use sql::SqlClusterSource;

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] MigrateError),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("table name `{0}` is not a plain identifier")]
    InvalidTable(String),
}

impl From<WarehouseError> for ApplicationError {
    fn from(error: WarehouseError) -> Self {
        ApplicationError::Warehouse(error.to_string())
    }
}

/// Supplier of raw segment rows. Rows are returned unvalidated.
#[async_trait]
pub trait ClusterSource: Send + Sync {
    async fn fetch_rows(&self) -> Result<Vec<SegmentRow>, WarehouseError>;

    /// Human-readable origin, used in logs and diagnostics.
    fn describe(&self) -> String;
}
