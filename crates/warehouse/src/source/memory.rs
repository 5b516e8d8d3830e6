use async_trait::async_trait;
use tokio::sync::RwLock;

use clusterpilot_core::domain::row::SegmentRow;

use super::{ClusterSource, WarehouseError};

#[derive(Default)]
pub struct InMemoryClusterSource {
    rows: RwLock<Vec<SegmentRow>>,
}

impl InMemoryClusterSource {
    pub fn new(rows: Vec<SegmentRow>) -> Self {
        Self { rows: RwLock::new(rows) }
    }

    pub async fn push(&self, row: SegmentRow) {
        self.rows.write().await.push(row);
    }
}

#[async_trait]
impl ClusterSource for InMemoryClusterSource {
    async fn fetch_rows(&self) -> Result<Vec<SegmentRow>, WarehouseError> {
        Ok(self.rows.read().await.clone())
    }

    fn describe(&self) -> String {
        "in-memory rows".to_string()
    }
}
