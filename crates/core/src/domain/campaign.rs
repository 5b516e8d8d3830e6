use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Delivery channel of a campaign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Push,
    Email,
}

impl Channel {
    /// Allowed message length in characters. Email copy doubles as a subject line.
    pub fn message_bounds(&self) -> RangeInclusive<usize> {
        match self {
            Self::Push => 60..=90,
            Self::Email => 35..=45,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "Push",
            Self::Email => "Email",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecommendation {
    pub channel: Channel,
    pub send_time: String,
    pub message: String,
    pub offer: String,
    pub engagement_estimate: String,
}

impl CampaignRecommendation {
    pub fn message_len(&self) -> usize {
        self.message.chars().count()
    }

    pub fn message_within_bounds(&self) -> bool {
        self.channel.message_bounds().contains(&self.message_len())
    }
}
