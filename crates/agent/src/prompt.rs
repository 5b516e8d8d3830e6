use tera::{Context, Tera};
use thiserror::Error;

use clusterpilot_core::recommendation::{select_offer, ObjectiveSignals};
use clusterpilot_core::{CampaignRecommendation, SegmentRecord};

const ENRICHMENT_TEMPLATE: &str = "enrichment.txt";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt template failed: {0}")]
    Template(#[from] tera::Error),
    #[error("record could not be serialized: {0}")]
    Record(#[from] serde_json::Error),
}

/// Everything the enrichment prompt and its guard need to agree on.
#[derive(Clone, Debug, PartialEq)]
pub struct EnrichmentBrief<'a> {
    pub record: &'a SegmentRecord,
    pub notes: &'a str,
    pub recommendation: &'a CampaignRecommendation,
    pub signals: ObjectiveSignals,
    /// Offer tag as embedded in the deterministic message, if it was.
    pub offer_tag: Option<&'static str>,
}

impl<'a> EnrichmentBrief<'a> {
    pub fn new(
        record: &'a SegmentRecord,
        notes: &'a str,
        recommendation: &'a CampaignRecommendation,
    ) -> Self {
        let signals = ObjectiveSignals::from_notes(notes);
        let tag = select_offer(record, signals).tag;
        let offer_tag = contains_ignoring_case(&recommendation.message, tag).then_some(tag);
        Self { record, notes, recommendation, signals, offer_tag }
    }
}

pub(crate) fn contains_ignoring_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub struct PromptRenderer {
    templates: Tera,
}

impl PromptRenderer {
    pub fn new() -> Result<Self, PromptError> {
        let mut templates = Tera::default();
        templates.add_raw_template(
            ENRICHMENT_TEMPLATE,
            include_str!("../../../templates/prompts/enrichment.txt"),
        )?;
        Ok(Self { templates })
    }

    pub fn render(&self, brief: &EnrichmentBrief<'_>) -> Result<String, PromptError> {
        let bounds = brief.recommendation.channel.message_bounds();
        let mut context = Context::new();
        context.insert("record_json", &serde_json::to_string_pretty(brief.record)?);
        context.insert("notes", brief.notes.trim());
        context.insert("channel", brief.recommendation.channel.as_str());
        context.insert("send_time", &brief.recommendation.send_time);
        context.insert("offer", &brief.recommendation.offer);
        context.insert("message", &brief.recommendation.message);
        context.insert("min_chars", bounds.start());
        context.insert("max_chars", bounds.end());
        context.insert("offer_tag", &brief.offer_tag);
        context.insert("sensitive", &brief.signals.sensitive);

        Ok(self.templates.render(ENRICHMENT_TEMPLATE, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use clusterpilot_core::{
        recommend, ClusterId, DeviceType, EngagementChannel, Interest, SegmentRecord,
    };

    use super::{EnrichmentBrief, PromptRenderer};

    fn record(interest: Interest, is_subscriber: bool) -> SegmentRecord {
        SegmentRecord {
            cluster_id: ClusterId("c-prompt".to_string()),
            interest,
            age: 22,
            device_type: DeviceType::Mobile,
            is_subscriber,
            previous_engagement: EngagementChannel::None,
            peak_access_hour: None,
            location: "Recife".to_string(),
            last_access_days_ago: 2,
            avg_daily_minutes: Some(30.0),
        }
    }

    #[test]
    fn prompt_carries_bounds_offer_tag_and_record() {
        let fan = record(Interest::Sports, false);
        let recommendation = recommend(&fan, "").expect("recommendation");
        let brief = EnrichmentBrief::new(&fan, "", &recommendation);
        let prompt = PromptRenderer::new().expect("templates").render(&brief).expect("render");

        assert_eq!(brief.offer_tag, Some("7 dias grátis"));
        assert!(prompt.contains("entre 60 e 90 caracteres"));
        assert!(prompt.contains("Mantenha o trecho \"7 dias grátis\""));
        assert!(prompt.contains("\"clusterId\": \"c-prompt\""));
        assert!(prompt.contains("(sem observações)"));
        assert!(!prompt.contains("Tema sensível"));
    }

    #[test]
    fn sensitive_notes_add_the_sober_tone_rule() {
        let reader = record(Interest::News, false);
        let recommendation = recommend(&reader, "cobertura das eleições").expect("recommendation");
        let brief = EnrichmentBrief::new(&reader, "cobertura das eleições", &recommendation);
        let prompt = PromptRenderer::new().expect("templates").render(&brief).expect("render");

        assert!(brief.signals.sensitive);
        assert!(prompt.contains("Tema sensível"));
        assert!(prompt.contains("cobertura das eleições"));
    }
}
