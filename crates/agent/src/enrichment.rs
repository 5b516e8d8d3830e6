//! Guarded paraphrasing of the deterministic message.
//!
//! The model only ever proposes new copy. Channel, send time, offer and
//! engagement estimate always come from the rule engine, and a proposal that
//! breaks any copy constraint is dropped in favour of the deterministic text.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use clusterpilot_core::{CampaignRecommendation, SegmentRecord};

use crate::llm::LlmClient;
use crate::prompt::{contains_ignoring_case, EnrichmentBrief, PromptError, PromptRenderer};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentStatus {
    Applied,
    Rejected { reason: String },
    Failed { error: String },
    /// Enrichment was requested but no provider is configured.
    Skipped { reason: String },
}

impl EnrichmentOutcome {
    pub fn skipped(recommendation: CampaignRecommendation, reason: impl Into<String>) -> Self {
        Self { recommendation, enrichment: EnrichmentStatus::Skipped { reason: reason.into() } }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentOutcome {
    pub recommendation: CampaignRecommendation,
    pub enrichment: EnrichmentStatus,
}

#[derive(Debug, Deserialize)]
struct ProposedCopy {
    message: String,
}

pub struct MessageEnricher {
    client: Arc<dyn LlmClient>,
    prompts: PromptRenderer,
}

impl MessageEnricher {
    pub fn new(client: Arc<dyn LlmClient>) -> Result<Self, PromptError> {
        Ok(Self { client, prompts: PromptRenderer::new()? })
    }

    pub async fn enrich(
        &self,
        record: &SegmentRecord,
        notes: &str,
        recommendation: CampaignRecommendation,
    ) -> EnrichmentOutcome {
        let brief = EnrichmentBrief::new(record, notes, &recommendation);
        let cluster_id = record.cluster_id.0.as_str();

        let prompt = match self.prompts.render(&brief) {
            Ok(prompt) => prompt,
            Err(error) => return failed(cluster_id, recommendation, error.to_string()),
        };
        let raw = match self.client.complete(&prompt).await {
            Ok(raw) => raw,
            Err(error) => return failed(cluster_id, recommendation, error.to_string()),
        };

        match check_proposal(&brief, &raw) {
            Ok(message) => {
                info!(
                    event_name = "agent.enrichment.applied",
                    cluster_id,
                    chars = message.chars().count(),
                    "model copy accepted"
                );
                EnrichmentOutcome {
                    recommendation: CampaignRecommendation { message, ..recommendation },
                    enrichment: EnrichmentStatus::Applied,
                }
            }
            Err(reason) => {
                warn!(
                    event_name = "agent.enrichment.rejected",
                    cluster_id,
                    reason = %reason,
                    "model copy rejected, keeping deterministic message"
                );
                EnrichmentOutcome {
                    recommendation,
                    enrichment: EnrichmentStatus::Rejected { reason },
                }
            }
        }
    }
}

fn failed(
    cluster_id: &str,
    recommendation: CampaignRecommendation,
    error: String,
) -> EnrichmentOutcome {
    warn!(
        event_name = "agent.enrichment.failed",
        cluster_id,
        error = %error,
        "enrichment unavailable, keeping deterministic message"
    );
    EnrichmentOutcome { recommendation, enrichment: EnrichmentStatus::Failed { error } }
}

fn check_proposal(brief: &EnrichmentBrief<'_>, raw: &str) -> Result<String, String> {
    let proposed: ProposedCopy = serde_json::from_str(strip_code_fence(raw))
        .map_err(|error| format!("response is not a {{\"message\"}} object: {error}"))?;
    let message = proposed.message.trim().to_string();

    if message.is_empty() {
        return Err("message is empty".to_string());
    }

    let channel = brief.recommendation.channel;
    let bounds = channel.message_bounds();
    let length = message.chars().count();
    if !bounds.contains(&length) {
        return Err(format!(
            "{length} characters is outside {}..={} for {channel}",
            bounds.start(),
            bounds.end()
        ));
    }

    if let Some(tag) = brief.offer_tag {
        if !contains_ignoring_case(&message, tag) {
            return Err(format!("offer tag `{tag}` was dropped"));
        }
    }

    if brief.signals.sensitive {
        if message.contains('!') {
            return Err("exclamation mark on a sensitive subject".to_string());
        }
        if message.chars().any(is_emoji) {
            return Err("emoji on a sensitive subject".to_string());
        }
    }

    Ok(message)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn is_emoji(c: char) -> bool {
    matches!(u32::from(c), 0x1F300..=0x1FAFF | 0x2600..=0x27BF)
}
