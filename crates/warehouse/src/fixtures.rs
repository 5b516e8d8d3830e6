use sqlx::Executor;

use crate::connection::WarehousePool;
use crate::source::WarehouseError;

/// Seed contract: id, interest, and whether the row is expected to validate.
const DEMO_CLUSTERS: &[DemoClusterContract] = &[
    DemoClusterContract { cluster_id: "cl-001", interest: "sports", valid: true },
    DemoClusterContract { cluster_id: "cl-002", interest: "news", valid: true },
    DemoClusterContract { cluster_id: "cl-003", interest: "recipes", valid: true },
    DemoClusterContract { cluster_id: "cl-004", interest: "news", valid: true },
    DemoClusterContract { cluster_id: "cl-005", interest: "sports", valid: true },
    DemoClusterContract { cluster_id: "cl-006", interest: "news", valid: true },
    DemoClusterContract { cluster_id: "cl-007", interest: "entretenimento", valid: true },
    DemoClusterContract { cluster_id: "cl-008", interest: "recipes", valid: true },
    DemoClusterContract { cluster_id: "cl-009", interest: "news", valid: false },
];

#[derive(Debug, Clone, Copy)]
struct DemoClusterContract {
    cluster_id: &'static str,
    interest: &'static str,
    valid: bool,
}

/// Deterministic demo segments for the `marketing_clusters` table.
///
/// One row (`cl-009`) has no age on purpose so the rejection path is visible
/// in demos.
pub struct DemoClusters;

impl DemoClusters {
    pub const SQL: &'static str = include_str!("../../../config/fixtures/demo_clusters.sql");
    pub const TABLE: &'static str = "marketing_clusters";

    pub async fn load(pool: &WarehousePool) -> Result<SeedResult, WarehouseError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            table: Self::TABLE,
            cluster_ids: DEMO_CLUSTERS.iter().map(|cluster| cluster.cluster_id).collect(),
        })
    }

    pub async fn verify(pool: &WarehousePool) -> Result<VerificationResult, WarehouseError> {
        let mut checks = Vec::new();

        for cluster in DEMO_CLUSTERS {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM marketing_clusters WHERE cluster_id = ?1 AND content_interest = ?2)",
            )
            .bind(cluster.cluster_id)
            .bind(cluster.interest)
            .fetch_one(pool)
            .await?;
            checks.push((cluster.cluster_id, exists == 1));
        }

        let all_present = checks.iter().all(|(_, exists)| *exists);
        Ok(VerificationResult { all_present, checks })
    }

    pub fn valid_cluster_ids() -> Vec<&'static str> {
        DEMO_CLUSTERS
            .iter()
            .filter(|cluster| cluster.valid)
            .map(|cluster| cluster.cluster_id)
            .collect()
    }

    pub fn invalid_cluster_ids() -> Vec<&'static str> {
        DEMO_CLUSTERS
            .iter()
            .filter(|cluster| !cluster.valid)
            .map(|cluster| cluster.cluster_id)
            .collect()
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub table: &'static str,
    pub cluster_ids: Vec<&'static str>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
