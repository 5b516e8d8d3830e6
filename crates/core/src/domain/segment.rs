use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::InvalidInputError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub String);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content interest of a cohort. Unrecognized labels are kept verbatim in `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Interest {
    News,
    Sports,
    Recipes,
    Other(String),
}

impl Interest {
    pub fn parse(value: &str) -> Self {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "news" | "noticias" | "notícias" => Self::News,
            "sports" | "esportes" | "esporte" => Self::Sports,
            "recipes" | "receitas" | "receita" => Self::Recipes,
            _ => Self::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::News => "news",
            Self::Sports => "sports",
            Self::Recipes => "recipes",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for Interest {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Interest> for String {
    fn from(value: Interest) -> Self {
        value.as_str().to_string()
    }
}

/// Unknown device labels fall back to `Unknown`, which never triggers the mobile rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
    Mobile,
    Desktop,
    Tablet,
    Unknown,
}

impl DeviceType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "mobile" | "smartphone" | "celular" => Self::Mobile,
            "desktop" | "web" => Self::Desktop,
            "tablet" => Self::Tablet,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for DeviceType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<DeviceType> for String {
    fn from(value: DeviceType) -> Self {
        value.as_str().to_string()
    }
}

/// Channel the cohort engaged with last. Unknown labels fall back to `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EngagementChannel {
    Push,
    Email,
    None,
}

impl EngagementChannel {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "push" => Self::Push,
            "email" | "e-mail" => Self::Email,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Email => "email",
            Self::None => "none",
        }
    }
}

impl From<String> for EngagementChannel {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<EngagementChannel> for String {
    fn from(value: EngagementChannel) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AgeBracket {
    /// 18 to 24
    Young,
    /// 25 to 44
    Adult,
    /// 45 to 64
    Mature,
    /// 65 and over
    Senior,
}

impl AgeBracket {
    /// Minors have no bracket.
    pub fn from_age(age: u32) -> Option<Self> {
        match age {
            0..=17 => None,
            18..=24 => Some(Self::Young),
            25..=44 => Some(Self::Adult),
            45..=64 => Some(Self::Mature),
            _ => Some(Self::Senior),
        }
    }
}

/// One validated warehouse row describing a customer cohort.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRecord {
    pub cluster_id: ClusterId,
    pub interest: Interest,
    pub age: u32,
    pub device_type: DeviceType,
    pub is_subscriber: bool,
    pub previous_engagement: EngagementChannel,
    pub peak_access_hour: Option<u8>,
    pub location: String,
    pub last_access_days_ago: u32,
    pub avg_daily_minutes: Option<f64>,
}

impl SegmentRecord {
    pub fn age_bracket(&self) -> Option<AgeBracket> {
        AgeBracket::from_age(self.age)
    }

    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if self.cluster_id.0.trim().is_empty() {
            return Err(InvalidInputError::MissingField { field: "cluster_id" });
        }
        if let Some(hour) = self.peak_access_hour {
            if hour > 23 {
                return Err(InvalidInputError::OutOfRange {
                    field: "peak_access_hour",
                    value: hour.to_string(),
                });
            }
        }
        if let Some(minutes) = self.avg_daily_minutes {
            if !minutes.is_finite() || minutes < 0.0 {
                return Err(InvalidInputError::OutOfRange {
                    field: "avg_daily_minutes",
                    value: minutes.to_string(),
                });
            }
        }
        Ok(())
    }
}
