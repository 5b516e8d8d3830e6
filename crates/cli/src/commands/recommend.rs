use serde::Serialize;

use clusterpilot_agent::{enricher_from_config, EnrichmentOutcome, EnrichmentStatus};
use clusterpilot_core::config::AppConfig;
use clusterpilot_core::{recommend_with_trace, CampaignRecommendation, ClusterId, DecisionTrace};
use clusterpilot_warehouse::SegmentLookup;

use crate::commands::{load_clusters, load_config, runtime, CommandResult, StepFailure};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationReport {
    cluster_id: ClusterId,
    recommendation: CampaignRecommendation,
    trace: DecisionTrace,
    #[serde(skip_serializing_if = "Option::is_none")]
    enrichment: Option<EnrichmentStatus>,
}

pub fn run(cluster_id: &str, notes: &str, enrich: bool, json_output: bool) -> CommandResult {
    let config = match load_config("recommend") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime("recommend") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let report = match runtime.block_on(build_report(&config, cluster_id, notes, enrich)) {
        Ok(report) => report,
        Err(failure) => return CommandResult::from_step("recommend", failure),
    };

    let message = format!(
        "{} campaign for `{}` at {}",
        report.recommendation.channel, report.cluster_id, report.recommendation.send_time
    );
    if json_output {
        return CommandResult::success_with_data("recommend", message, &report);
    }
    CommandResult::text(render_human(&report))
}

async fn build_report(
    config: &AppConfig,
    cluster_id: &str,
    notes: &str,
    enrich: bool,
) -> Result<RecommendationReport, StepFailure> {
    let loaded = load_clusters(config).await?;
    let record = match loaded.lookup(cluster_id.trim()) {
        SegmentLookup::Found(record) => record.clone(),
        SegmentLookup::Rejected(rejected) => {
            let message = format!(
                "cluster `{}` cannot be recommended: {}",
                rejected.cluster_id, rejected.reason
            );
            return Err(("invalid_input", message, 7));
        }
        SegmentLookup::Missing => {
            return Err(("cluster_not_found", format!("cluster `{cluster_id}` was not found"), 8));
        }
    };

    let (recommendation, trace) = recommend_with_trace(&record, notes)
        .map_err(|error| ("invalid_input", error.to_string(), 7u8))?;

    if !enrich {
        return Ok(RecommendationReport {
            cluster_id: record.cluster_id,
            recommendation,
            trace,
            enrichment: None,
        });
    }

    let enricher =
        enricher_from_config(&config.llm).map_err(|error| ("llm_setup", error.to_string(), 9u8))?;
    let outcome = match enricher {
        Some(enricher) => enricher.enrich(&record, notes, recommendation).await,
        None => EnrichmentOutcome::skipped(recommendation, "llm provider is disabled"),
    };

    Ok(RecommendationReport {
        cluster_id: record.cluster_id,
        recommendation: outcome.recommendation,
        trace,
        enrichment: Some(outcome.enrichment),
    })
}

fn render_human(report: &RecommendationReport) -> String {
    let recommendation = &report.recommendation;
    let mut lines = vec![
        format!("campaign for cluster `{}`", report.cluster_id),
        format!("- channel: {}", recommendation.channel),
        format!("- send time: {}", recommendation.send_time),
        format!("- offer: {}", recommendation.offer),
        format!("- message: {}", recommendation.message),
        format!("- engagement estimate: {}", recommendation.engagement_estimate),
    ];
    match &report.enrichment {
        None => {}
        Some(EnrichmentStatus::Applied) => lines.push("- enrichment: applied".to_string()),
        Some(EnrichmentStatus::Rejected { reason }) => {
            lines.push(format!("- enrichment: rejected ({reason})"));
        }
        Some(EnrichmentStatus::Failed { error }) => {
            lines.push(format!("- enrichment: failed ({error})"));
        }
        Some(EnrichmentStatus::Skipped { reason }) => {
            lines.push(format!("- enrichment: skipped ({reason})"));
        }
    }
    lines.join("\n")
}
