//! Raw warehouse rows and their validation into `SegmentRecord`.
//!
//! Warehouse tables are loosely typed: numbers may arrive as strings, timestamps
//! in several layouts, and older tables use different column names. `SegmentRow`
//! accepts all of that and `into_record` decides what is valid.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::segment::{ClusterId, DeviceType, EngagementChannel, Interest, SegmentRecord};
use crate::errors::InvalidInputError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub cluster_id: Option<String>,
    #[serde(default, alias = "content_interest", deserialize_with = "lenient_string")]
    pub interest: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub device_type: Option<String>,
    #[serde(default, alias = "subscriber", deserialize_with = "lenient_string")]
    pub is_subscriber: Option<String>,
    #[serde(
        default,
        alias = "prev_engagement",
        alias = "previous_engagement_channel",
        deserialize_with = "lenient_string"
    )]
    pub previous_engagement: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub peak_access_hour: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub access_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_access: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_access_days_ago: Option<String>,
    #[serde(
        default,
        alias = "avg_time_day",
        alias = "daily_minutes",
        deserialize_with = "lenient_string"
    )]
    pub avg_daily_minutes: Option<String>,
}

impl SegmentRow {
    pub fn cluster_label(&self) -> &str {
        present(&self.cluster_id).unwrap_or("<missing>")
    }

    /// Validates the row. `now` anchors the days-since-last-access derivation.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<SegmentRecord, InvalidInputError> {
        let cluster_id = required(&self.cluster_id, "cluster_id")?.to_string();
        let interest = Interest::parse(required(&self.interest, "interest")?);
        let age = parse_age(required(&self.age, "age")?)?;
        let device_type = DeviceType::parse(required(&self.device_type, "device_type")?);
        let is_subscriber =
            parse_bool("is_subscriber", required(&self.is_subscriber, "is_subscriber")?)?;

        let previous_engagement = present(&self.previous_engagement)
            .map(EngagementChannel::parse)
            .unwrap_or(EngagementChannel::None);

        let peak_access_hour = match present(&self.peak_access_hour) {
            Some(raw) => Some(parse_hour(raw)?),
            None => present(&self.access_time).map(parse_access_hour).transpose()?,
        };

        let last_access_days_ago = match present(&self.last_access_days_ago) {
            Some(raw) => parse_days(raw)?,
            None => present(&self.last_access)
                .map(|raw| days_since(raw, now))
                .transpose()?
                .unwrap_or(0),
        };

        let avg_daily_minutes =
            present(&self.avg_daily_minutes).map(parse_minutes).transpose()?;

        let record = SegmentRecord {
            cluster_id: ClusterId(cluster_id),
            interest,
            age,
            device_type,
            is_subscriber,
            previous_engagement,
            peak_access_hour,
            location: present(&self.location).unwrap_or_default().to_string(),
            last_access_days_ago,
            avg_daily_minutes,
        };
        record.validate()?;
        Ok(record)
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|text| !text.is_empty())
}

fn required<'a>(
    value: &'a Option<String>,
    field: &'static str,
) -> Result<&'a str, InvalidInputError> {
    present(value).ok_or(InvalidInputError::MissingField { field })
}

fn parse_integer(field: &'static str, raw: &str) -> Result<i64, InvalidInputError> {
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(value);
    }
    // Warehouses often hand back integral columns as floats ("34.0").
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => Ok(value as i64),
        _ => Err(InvalidInputError::Malformed { field, value: raw.to_string() }),
    }
}

fn parse_age(raw: &str) -> Result<u32, InvalidInputError> {
    let age = parse_integer("age", raw)?;
    u32::try_from(age)
        .map_err(|_| InvalidInputError::OutOfRange { field: "age", value: raw.to_string() })
}

fn parse_hour(raw: &str) -> Result<u8, InvalidInputError> {
    let hour = parse_integer("peak_access_hour", raw)?;
    match u8::try_from(hour) {
        Ok(hour) if hour <= 23 => Ok(hour),
        _ => Err(InvalidInputError::OutOfRange {
            field: "peak_access_hour",
            value: raw.to_string(),
        }),
    }
}

fn parse_days(raw: &str) -> Result<u32, InvalidInputError> {
    let days = parse_integer("last_access_days_ago", raw)?;
    u32::try_from(days).map_err(|_| InvalidInputError::OutOfRange {
        field: "last_access_days_ago",
        value: raw.to_string(),
    })
}

fn parse_minutes(raw: &str) -> Result<f64, InvalidInputError> {
    let minutes = raw.parse::<f64>().map_err(|_| InvalidInputError::Malformed {
        field: "avg_daily_minutes",
        value: raw.to_string(),
    })?;
    if !minutes.is_finite() || minutes < 0.0 {
        return Err(InvalidInputError::OutOfRange {
            field: "avg_daily_minutes",
            value: raw.to_string(),
        });
    }
    Ok(minutes)
}

fn parse_bool(field: &'static str, raw: &str) -> Result<bool, InvalidInputError> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "sim" | "y" | "s" => Ok(true),
        "false" | "0" | "no" | "não" | "nao" | "n" => Ok(false),
        _ => Err(InvalidInputError::Malformed { field, value: raw.to_string() }),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for layout in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

fn days_since(raw: &str, now: DateTime<Utc>) -> Result<u32, InvalidInputError> {
    let timestamp = parse_timestamp(raw)
        .ok_or(InvalidInputError::Malformed { field: "last_access", value: raw.to_string() })?;
    let days = (now - timestamp).num_days().max(0);
    Ok(u32::try_from(days).unwrap_or(u32::MAX))
}

/// Access times keep their own offset: the hour is the cohort's local peak.
fn parse_access_hour(raw: &str) -> Result<u8, InvalidInputError> {
    let hour = if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        Some(parsed.hour())
    } else if let Some(parsed) = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
    {
        Some(parsed.hour())
    } else {
        ["%H:%M:%S%.f", "%H:%M"]
            .iter()
            .find_map(|layout| NaiveTime::parse_from_str(raw, layout).ok())
            .map(|time| time.hour())
    };

    hour.and_then(|hour| u8::try_from(hour).ok())
        .ok_or(InvalidInputError::Malformed { field: "access_time", value: raw.to_string() })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::SegmentRow;
    use crate::domain::segment::{DeviceType, EngagementChannel, Interest};
    use crate::errors::InvalidInputError;

    fn row(value: serde_json::Value) -> SegmentRow {
        serde_json::from_value(value).expect("row should deserialize")
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 30, 12, 0, 0).single().expect("valid timestamp")
    }

    #[test]
    fn accepts_original_table_column_names() {
        let record = row(json!({
            "cluster_id": 7,
            "content_interest": "esportes",
            "age": "22",
            "device_type": "mobile",
            "subscriber": false,
            "prev_engagement": "push",
            "access_time": "2025-08-20T19:08:00-03:00",
            "last_access": "2025-08-20T19:17:00-03:00",
            "avg_time_day": 123.4,
            "location": "São Paulo"
        }))
        .into_record(now())
        .expect("row should validate");

        assert_eq!(record.cluster_id.0, "7");
        assert_eq!(record.interest, Interest::Sports);
        assert_eq!(record.age, 22);
        assert_eq!(record.device_type, DeviceType::Mobile);
        assert!(!record.is_subscriber);
        assert_eq!(record.previous_engagement, EngagementChannel::Push);
        assert_eq!(record.peak_access_hour, Some(19));
        assert_eq!(record.last_access_days_ago, 9);
        assert_eq!(record.avg_daily_minutes, Some(123.4));
        assert_eq!(record.location, "São Paulo");
    }

    #[test]
    fn missing_age_is_invalid_input() {
        let error = row(json!({
            "cluster_id": "c-1",
            "interest": "news",
            "device_type": "desktop",
            "is_subscriber": true
        }))
        .into_record(now())
        .expect_err("age is required");

        assert_eq!(error, InvalidInputError::MissingField { field: "age" });
    }

    #[test]
    fn optional_fields_fall_back_to_defaults() {
        let record = row(json!({
            "cluster_id": "c-2",
            "interest": "recipes",
            "age": 70,
            "device_type": "tablet",
            "is_subscriber": "sim",
            "previous_engagement": null
        }))
        .into_record(now())
        .expect("row should validate");

        assert_eq!(record.previous_engagement, EngagementChannel::None);
        assert_eq!(record.peak_access_hour, None);
        assert_eq!(record.last_access_days_ago, 0);
        assert_eq!(record.location, "");
        assert!(record.is_subscriber);
    }

    #[test]
    fn explicit_peak_hour_wins_over_access_time() {
        let record = row(json!({
            "cluster_id": "c-3",
            "interest": "news",
            "age": 52,
            "device_type": "desktop",
            "is_subscriber": true,
            "peak_access_hour": 9,
            "access_time": "21:30:00"
        }))
        .into_record(now())
        .expect("row should validate");

        assert_eq!(record.peak_access_hour, Some(9));
    }

    #[test]
    fn rejects_out_of_domain_values() {
        let base = json!({
            "cluster_id": "c-4",
            "interest": "news",
            "device_type": "desktop",
            "is_subscriber": true
        });

        let mut negative_age = base.clone();
        negative_age["age"] = json!(-3);
        assert!(matches!(
            row(negative_age).into_record(now()),
            Err(InvalidInputError::OutOfRange { field: "age", .. })
        ));

        let mut late_hour = base.clone();
        late_hour["age"] = json!(30);
        late_hour["peak_access_hour"] = json!(24);
        assert!(matches!(
            row(late_hour).into_record(now()),
            Err(InvalidInputError::OutOfRange { field: "peak_access_hour", .. })
        ));

        let mut bad_flag = base;
        bad_flag["age"] = json!(30);
        bad_flag["is_subscriber"] = json!("maybe");
        assert!(matches!(
            row(bad_flag).into_record(now()),
            Err(InvalidInputError::Malformed { field: "is_subscriber", .. })
        ));
    }

    #[test]
    fn future_last_access_counts_as_today() {
        let record = row(json!({
            "cluster_id": "c-5",
            "interest": "sports",
            "age": 30,
            "device_type": "mobile",
            "is_subscriber": false,
            "last_access": "2025-09-10 08:00:00"
        }))
        .into_record(now())
        .expect("row should validate");

        assert_eq!(record.last_access_days_ago, 0);
    }
}
