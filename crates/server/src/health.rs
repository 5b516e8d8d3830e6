use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use clusterpilot_warehouse::WarehousePool;
use serde::Serialize;

use crate::api::ApiState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub warehouse: HealthCheck,
    pub enrichment: HealthCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let warehouse = match &state.pool {
        Some(pool) => warehouse_check(pool).await,
        None => HealthCheck {
            status: "ready",
            detail: format!("serving rows from {}", state.source.describe()),
        },
    };
    let ready = warehouse.status == "ready";

    let enrichment = if state.enricher.is_some() {
        HealthCheck { status: "ready", detail: "llm paraphrasing available".to_string() }
    } else {
        HealthCheck { status: "disabled", detail: "rule-engine copy only".to_string() }
    };

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "clusterpilot-server runtime initialized".to_string(),
        },
        warehouse,
        enrichment,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn warehouse_check(pool: &WarehousePool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "warehouse query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("warehouse query failed: {error}") }
        }
    }
}
