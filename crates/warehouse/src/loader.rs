//! Turns raw rows from a `ClusterSource` into validated segment records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use clusterpilot_core::domain::segment::SegmentRecord;

use crate::source::{ClusterSource, WarehouseError};

/// A row that failed validation, kept so operators can see what was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRow {
    pub cluster_id: String,
    pub field: &'static str,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LoadedSegments {
    pub records: Vec<SegmentRecord>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, PartialEq)]
pub enum SegmentLookup<'a> {
    Found(&'a SegmentRecord),
    Rejected(&'a RejectedRow),
    Missing,
}

impl LoadedSegments {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn lookup(&self, cluster_id: &str) -> SegmentLookup<'_> {
        if let Some(record) = self.records.iter().find(|record| record.cluster_id.0 == cluster_id)
        {
            return SegmentLookup::Found(record);
        }
        match self.rejected.iter().find(|row| row.cluster_id == cluster_id) {
            Some(rejected) => SegmentLookup::Rejected(rejected),
            None => SegmentLookup::Missing,
        }
    }
}

/// `now` anchors the days-since-last-access derivation for every row.
pub async fn load_segments<S>(source: &S, now: DateTime<Utc>) -> Result<LoadedSegments, WarehouseError>
where
    S: ClusterSource + ?Sized,
{
    let rows = source.fetch_rows().await?;
    let mut loaded = LoadedSegments::default();

    for row in rows {
        let cluster_id = row.cluster_label().to_string();
        match row.into_record(now) {
            Ok(record) => loaded.records.push(record),
            Err(error) => {
                warn!(
                    event_name = "warehouse.segment.rejected",
                    cluster_id = %cluster_id,
                    field = error.field(),
                    error = %error,
                    "segment row failed validation"
                );
                loaded.rejected.push(RejectedRow {
                    cluster_id,
                    field: error.field(),
                    reason: error.to_string(),
                });
            }
        }
    }

    if loaded.is_empty() {
        warn!(
            event_name = "warehouse.segments.empty",
            source = %source.describe(),
            rejected = loaded.rejected.len(),
            "no usable segments were loaded"
        );
    } else {
        info!(
            event_name = "warehouse.segments.loaded",
            source = %source.describe(),
            loaded = loaded.records.len(),
            rejected = loaded.rejected.len(),
            "segments loaded"
        );
    }

    Ok(loaded)
}
