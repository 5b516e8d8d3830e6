//! Deterministic campaign recommendation.
//!
//! Given one segment record and the operator's objective notes, picks a
//! channel, a send time, an offer, message copy and an engagement estimate.
//! The same inputs always produce the same output.

mod copy;
mod engagement;
mod engine;
mod objective;
mod offer;
mod rules;

pub use copy::{compose_message, MessageBrief, Tone};
pub use engagement::{engagement_factors, estimate_engagement, EngagementFactor};
pub use engine::{
    recommend, recommend_with_trace, DecisionTrace, DeterministicRecommendationEngine,
    RecommendationEngine,
};
pub use objective::ObjectiveSignals;
pub use offer::{select_offer, Offer};
pub use rules::{
    bracket_slots, select_channel, select_send_time, ChannelRule, SendTimeSource,
    AMBIGUOUS_SEND_WINDOW,
};
