use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::campaign::CampaignRecommendation;
use crate::domain::row::SegmentRow;
use crate::domain::segment::SegmentRecord;
use crate::errors::InvalidInputError;

use super::copy::{compose_message, MessageBrief, Tone};
use super::engagement::estimate_engagement;
use super::objective::ObjectiveSignals;
use super::offer::select_offer;
use super::rules::{select_send_time, ChannelRule, SendTimeSource};

/// Which rule fired at each decision point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionTrace {
    pub channel_rule: ChannelRule,
    pub send_time_source: SendTimeSource,
    pub tone: Tone,
    pub sensitive: bool,
    pub hot_topic: bool,
}

pub trait RecommendationEngine: Send + Sync {
    fn recommend(
        &self,
        record: &SegmentRecord,
        objective_notes: &str,
    ) -> Result<CampaignRecommendation, InvalidInputError>;

    /// Normalizes a raw warehouse row first; a row without an age is rejected here.
    fn recommend_row(
        &self,
        row: SegmentRow,
        objective_notes: &str,
        now: DateTime<Utc>,
    ) -> Result<CampaignRecommendation, InvalidInputError> {
        let record = row.into_record(now)?;
        self.recommend(&record, objective_notes)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicRecommendationEngine;

impl RecommendationEngine for DeterministicRecommendationEngine {
    fn recommend(
        &self,
        record: &SegmentRecord,
        objective_notes: &str,
    ) -> Result<CampaignRecommendation, InvalidInputError> {
        recommend(record, objective_notes)
    }
}

pub fn recommend(
    record: &SegmentRecord,
    objective_notes: &str,
) -> Result<CampaignRecommendation, InvalidInputError> {
    recommend_with_trace(record, objective_notes).map(|(recommendation, _)| recommendation)
}

pub fn recommend_with_trace(
    record: &SegmentRecord,
    objective_notes: &str,
) -> Result<(CampaignRecommendation, DecisionTrace), InvalidInputError> {
    record.validate()?;

    let signals = ObjectiveSignals::from_notes(objective_notes);
    let channel_rule = ChannelRule::decide(record);
    let channel = channel_rule.channel();
    let (send_time, send_time_source) = select_send_time(record, channel);
    let offer = select_offer(record, signals);
    let tone = Tone::select(record, signals);
    let message = compose_message(&MessageBrief { record, channel, offer, tone, signals });

    let recommendation = CampaignRecommendation {
        channel,
        send_time,
        message,
        offer: offer.label.to_string(),
        engagement_estimate: estimate_engagement(record, channel),
    };
    let trace = DecisionTrace {
        channel_rule,
        send_time_source,
        tone,
        sensitive: signals.sensitive,
        hot_topic: signals.hot_topic,
    };
    Ok((recommendation, trace))
}
