//! Channel and send-time rules.

use serde::Serialize;

use crate::domain::campaign::Channel;
use crate::domain::segment::{AgeBracket, DeviceType, EngagementChannel, SegmentRecord};

/// Used when neither a peak hour nor an age bracket gives a clear signal.
pub const AMBIGUOUS_SEND_WINDOW: &str = "10h ou 14h";

/// Rule that decided the channel, in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelRule {
    PushHistory,
    EmailHistory,
    YoungMobile,
    MatureAudience,
    Default,
}

impl ChannelRule {
    /// First matching rule wins.
    pub fn decide(record: &SegmentRecord) -> Self {
        match record.previous_engagement {
            EngagementChannel::Push => return Self::PushHistory,
            EngagementChannel::Email => return Self::EmailHistory,
            EngagementChannel::None => {}
        }

        if record.device_type == DeviceType::Mobile && (18..=44).contains(&record.age) {
            Self::YoungMobile
        } else if record.age >= 45 {
            Self::MatureAudience
        } else {
            Self::Default
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            Self::PushHistory | Self::YoungMobile | Self::Default => Channel::Push,
            Self::EmailHistory | Self::MatureAudience => Channel::Email,
        }
    }
}

pub fn select_channel(record: &SegmentRecord) -> Channel {
    ChannelRule::decide(record).channel()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendTimeSource {
    PeakHour,
    AgeBracket,
    AmbiguousWindow,
}

/// Canonical (first, second) send slots per age bracket.
pub fn bracket_slots(bracket: AgeBracket) -> (&'static str, &'static str) {
    match bracket {
        AgeBracket::Young => ("12:45", "20:45"),
        AgeBracket::Adult => ("12:45", "18:45"),
        AgeBracket::Mature => ("10:45", "14:45"),
        AgeBracket::Senior => ("09:30", "10:45"),
    }
}

pub fn select_send_time(record: &SegmentRecord, channel: Channel) -> (String, SendTimeSource) {
    if let Some(hour) = record.peak_access_hour {
        return (format!("{hour}:45"), SendTimeSource::PeakHour);
    }

    let Some(bracket) = record.age_bracket() else {
        return (AMBIGUOUS_SEND_WINDOW.to_string(), SendTimeSource::AmbiguousWindow);
    };

    let (first, second) = bracket_slots(bracket);
    // Mobile push audiences respond to the off-hours slot.
    let slot = if channel == Channel::Push && record.device_type == DeviceType::Mobile {
        second
    } else {
        first
    };
    (slot.to_string(), SendTimeSource::AgeBracket)
}
