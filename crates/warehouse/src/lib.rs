pub mod connection;
pub mod fixtures;
pub mod loader;
pub mod migrations;
pub mod source;

pub use connection::{connect_with_config, connect_with_settings, WarehousePool};
pub use fixtures::{DemoClusters, SeedResult, VerificationResult};
pub use loader::{load_segments, LoadedSegments, RejectedRow, SegmentLookup};
pub use source::{ClusterSource, InMemoryClusterSource, SqlClusterSource, WarehouseError};
