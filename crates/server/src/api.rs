//! JSON API over the cluster warehouse.
//!
//! Every request reloads the segment table through the configured
//! `ClusterSource`, so edits to the warehouse show up without a restart.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use clusterpilot_agent::{EnrichmentOutcome, EnrichmentStatus, MessageEnricher};
use clusterpilot_core::{
    recommend_with_trace, ApplicationError, CampaignRecommendation, ClusterId, DecisionTrace,
    DeviceType, DomainError, EngagementChannel, FacetOptions, FilterConfig, Interest,
    InterfaceError, SegmentRecord,
};
use clusterpilot_warehouse::{
    load_segments, ClusterSource, LoadedSegments, RejectedRow, SegmentLookup, WarehousePool,
};

use crate::health;

#[derive(Clone)]
pub struct ApiState {
    /// Present when the source is backed by the SQL warehouse; used by `/health`.
    pub pool: Option<WarehousePool>,
    pub source: Arc<dyn ClusterSource>,
    pub enricher: Option<Arc<MessageEnricher>>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/clusters", get(list_clusters))
        .route("/api/v1/clusters/{cluster_id}", get(get_cluster))
        .route("/api/v1/clusters/{cluster_id}/recommendation", post(recommend_cluster))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    correlation_id: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>, correlation_id: &str) -> Self {
        Self(InterfaceError::BadRequest {
            message: message.into(),
            correlation_id: correlation_id.to_string(),
        })
    }

    fn from_application(error: ApplicationError, correlation_id: &str) -> Self {
        Self(error.into_interface(correlation_id))
    }

    fn status(&self) -> StatusCode {
        match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Server-side failures keep their detail in the logs only.
        let detail = match &self.0 {
            InterfaceError::BadRequest { message, .. }
            | InterfaceError::NotFound { message, .. } => Some(message.clone()),
            InterfaceError::ServiceUnavailable { .. } | InterfaceError::Internal { .. } => None,
        };
        let body = ErrorBody {
            error: self.0.user_message(),
            detail,
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Cluster listing
// ---------------------------------------------------------------------------

/// Query string of `GET /api/v1/clusters`. List values are comma-separated.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterQuery {
    pub interest: Option<String>,
    pub location: Option<String>,
    pub engagement: Option<String>,
    pub subscriber: Option<String>,
    pub device: Option<String>,
    pub age: Option<String>,
    pub peak_hour_from: Option<u8>,
    pub peak_hour_to: Option<u8>,
    pub minutes_from: Option<f64>,
    pub minutes_to: Option<f64>,
}

impl ClusterQuery {
    pub fn to_filter(&self) -> Result<FilterConfig, String> {
        let subscriber = split_list(&self.subscriber)
            .map(|value| match value.to_lowercase().as_str() {
                "true" | "yes" | "sim" => Ok(true),
                "false" | "no" | "nao" | "não" => Ok(false),
                _ => Err(format!("subscriber must be true or false, got `{value}`")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let ages = split_list(&self.age)
            .map(|value| {
                value
                    .parse::<u32>()
                    .map_err(|_| format!("age must be a whole number, got `{value}`"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let peak_hour_range = match (self.peak_hour_from, self.peak_hour_to) {
            (None, None) => None,
            (from, to) => Some((from.unwrap_or(0), to.unwrap_or(23))),
        };
        if let Some((from, to)) = peak_hour_range {
            if from > 23 || to > 23 {
                return Err("peak hours must be between 0 and 23".to_string());
            }
        }
        let daily_minutes_range = match (self.minutes_from, self.minutes_to) {
            (None, None) => None,
            (from, to) => Some((from.unwrap_or(0.0), to.unwrap_or(f64::MAX))),
        };

        Ok(FilterConfig {
            interests: split_list(&self.interest).map(Interest::parse).collect(),
            locations: split_list(&self.location).map(str::to_string).collect(),
            previous_engagements: split_list(&self.engagement)
                .map(EngagementChannel::parse)
                .collect(),
            subscriber,
            device_types: split_list(&self.device).map(DeviceType::parse).collect(),
            ages,
            peak_hour_range,
            daily_minutes_range,
        })
    }
}

fn split_list(raw: &Option<String>) -> impl Iterator<Item = &str> {
    raw.as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterListing {
    pub correlation_id: String,
    pub filter: FilterConfig,
    pub total: usize,
    pub records: Vec<SegmentRecord>,
    pub facets: FacetOptions,
    pub rejected: Vec<RejectedRow>,
}

pub async fn list_clusters(
    State(state): State<ApiState>,
    Query(query): Query<ClusterQuery>,
) -> Result<Json<ClusterListing>, ApiError> {
    let correlation_id = new_correlation_id();
    let filter =
        query.to_filter().map_err(|message| ApiError::bad_request(message, &correlation_id))?;
    let loaded = load(&state, &correlation_id).await?;

    let records = filter.apply(&loaded.records);
    info!(
        event_name = "api.clusters.listed",
        correlation_id = %correlation_id,
        matched = records.len(),
        total = loaded.records.len(),
        rejected = loaded.rejected.len(),
        "cluster listing served"
    );

    Ok(Json(ClusterListing {
        correlation_id,
        filter,
        total: loaded.records.len(),
        facets: FacetOptions::from_records(&loaded.records),
        records,
        rejected: loaded.rejected,
    }))
}

// ---------------------------------------------------------------------------
// Single cluster + recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDetail {
    pub correlation_id: String,
    pub record: SegmentRecord,
}

pub async fn get_cluster(
    State(state): State<ApiState>,
    Path(cluster_id): Path<String>,
) -> Result<Json<ClusterDetail>, ApiError> {
    let correlation_id = new_correlation_id();
    let loaded = load(&state, &correlation_id).await?;
    let record = find_record(&loaded, &cluster_id, &correlation_id)?;

    Ok(Json(ClusterDetail { correlation_id, record }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecommendationRequest {
    pub notes: String,
    pub enrich: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub correlation_id: String,
    pub cluster_id: ClusterId,
    pub recommendation: CampaignRecommendation,
    pub trace: DecisionTrace,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentStatus>,
}

pub async fn recommend_cluster(
    State(state): State<ApiState>,
    Path(cluster_id): Path<String>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let correlation_id = new_correlation_id();
    let loaded = load(&state, &correlation_id).await?;
    let record = find_record(&loaded, &cluster_id, &correlation_id)?;

    let (recommendation, trace) = recommend_with_trace(&record, &request.notes).map_err(|error| {
        ApiError::from_application(DomainError::from(error).into(), &correlation_id)
    })?;

    let (recommendation, enrichment) = if request.enrich {
        let outcome = match &state.enricher {
            Some(enricher) => enricher.enrich(&record, &request.notes, recommendation).await,
            None => EnrichmentOutcome::skipped(recommendation, "llm provider is disabled"),
        };
        (outcome.recommendation, Some(outcome.enrichment))
    } else {
        (recommendation, None)
    };

    info!(
        event_name = "api.recommendation.served",
        correlation_id = %correlation_id,
        cluster_id = %record.cluster_id,
        channel = %recommendation.channel,
        send_time = %recommendation.send_time,
        enriched = matches!(enrichment, Some(EnrichmentStatus::Applied)),
        "campaign recommendation served"
    );

    Ok(Json(RecommendationResponse {
        correlation_id,
        cluster_id: record.cluster_id,
        recommendation,
        trace,
        enrichment,
    }))
}

async fn load(state: &ApiState, correlation_id: &str) -> Result<LoadedSegments, ApiError> {
    load_segments(state.source.as_ref(), Utc::now()).await.map_err(|error| {
        warn!(
            event_name = "api.warehouse.load_failed",
            correlation_id = %correlation_id,
            source = %state.source.describe(),
            error = %error,
            "cluster table could not be loaded"
        );
        ApiError::from_application(error.into(), correlation_id)
    })
}

fn find_record(
    loaded: &LoadedSegments,
    cluster_id: &str,
    correlation_id: &str,
) -> Result<SegmentRecord, ApiError> {
    match loaded.lookup(cluster_id.trim()) {
        SegmentLookup::Found(record) => Ok(record.clone()),
        SegmentLookup::Rejected(rejected) => Err(ApiError::bad_request(
            format!("cluster `{}` cannot be recommended: {}", rejected.cluster_id, rejected.reason),
            correlation_id,
        )),
        SegmentLookup::Missing => Err(ApiError::from_application(
            DomainError::ClusterNotFound(cluster_id.trim().to_string()).into(),
            correlation_id,
        )),
    }
}
