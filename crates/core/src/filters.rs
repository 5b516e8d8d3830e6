//! Segment filtering over an already-loaded set of records.
//!
//! `FilterConfig` is a plain value: callers build one per request and pass it
//! in. `FilterConfig::default()` is the reset state and matches everything.

use serde::{Deserialize, Serialize};

use crate::domain::segment::{
    ClusterId, DeviceType, EngagementChannel, Interest, SegmentRecord,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterConfig {
    pub interests: Vec<Interest>,
    pub locations: Vec<String>,
    pub previous_engagements: Vec<EngagementChannel>,
    pub subscriber: Vec<bool>,
    pub device_types: Vec<DeviceType>,
    pub ages: Vec<u32>,
    /// Inclusive. Records without a peak hour never match a set range.
    pub peak_hour_range: Option<(u8, u8)>,
    /// Inclusive. Records without reading time never match a set range.
    pub daily_minutes_range: Option<(f64, f64)>,
}

impl FilterConfig {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn matches(&self, record: &SegmentRecord) -> bool {
        selected(&self.interests, &record.interest)
            && self.matches_location(&record.location)
            && selected(&self.previous_engagements, &record.previous_engagement)
            && selected(&self.subscriber, &record.is_subscriber)
            && selected(&self.device_types, &record.device_type)
            && selected(&self.ages, &record.age)
            && in_range(self.peak_hour_range, record.peak_access_hour)
            && in_range(self.daily_minutes_range, record.avg_daily_minutes)
    }

    pub fn apply<'a, I>(&self, records: I) -> Vec<SegmentRecord>
    where
        I: IntoIterator<Item = &'a SegmentRecord>,
    {
        records.into_iter().filter(|record| self.matches(record)).cloned().collect()
    }

    fn matches_location(&self, location: &str) -> bool {
        if self.locations.is_empty() {
            return true;
        }
        let wanted = normalize_location(location);
        self.locations.iter().any(|candidate| normalize_location(candidate) == wanted)
    }
}

fn selected<T: PartialEq>(choices: &[T], value: &T) -> bool {
    choices.is_empty() || choices.contains(value)
}

fn in_range<T: PartialOrd + Copy>(range: Option<(T, T)>, value: Option<T>) -> bool {
    match (range, value) {
        (None, _) => true,
        (Some((low, high)), Some(value)) => low <= value && value <= high,
        (Some(_), None) => false,
    }
}

fn normalize_location(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Distinct values per filterable column, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetOptions {
    pub interests: Vec<Interest>,
    pub locations: Vec<String>,
    pub previous_engagements: Vec<EngagementChannel>,
    pub subscriber: Vec<bool>,
    pub device_types: Vec<DeviceType>,
    pub ages: Vec<u32>,
    pub peak_hour_bounds: Option<(u8, u8)>,
    pub daily_minutes_bounds: Option<(f64, f64)>,
}

impl FacetOptions {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a SegmentRecord>,
    {
        let mut facets = Self::default();
        for record in records {
            push_distinct(&mut facets.interests, &record.interest);
            if !record.location.trim().is_empty() {
                push_distinct(&mut facets.locations, &record.location);
            }
            push_distinct(&mut facets.previous_engagements, &record.previous_engagement);
            push_distinct(&mut facets.subscriber, &record.is_subscriber);
            push_distinct(&mut facets.device_types, &record.device_type);
            push_distinct(&mut facets.ages, &record.age);
            widen(&mut facets.peak_hour_bounds, record.peak_access_hour);
            widen(&mut facets.daily_minutes_bounds, record.avg_daily_minutes);
        }
        facets
    }
}

fn push_distinct<T: PartialEq + Clone>(values: &mut Vec<T>, value: &T) {
    if !values.contains(value) {
        values.push(value.clone());
    }
}

fn widen<T: PartialOrd + Copy>(bounds: &mut Option<(T, T)>, value: Option<T>) {
    let Some(value) = value else {
        return;
    };
    *bounds = match *bounds {
        None => Some((value, value)),
        Some((low, high)) => Some((
            if value < low { value } else { low },
            if value > high { value } else { high },
        )),
    };
}

/// Distinct cluster ids in input order, as offered for selection.
pub fn selectable_cluster_ids<'a, I>(records: I) -> Vec<ClusterId>
where
    I: IntoIterator<Item = &'a SegmentRecord>,
{
    let mut ids = Vec::new();
    for record in records {
        push_distinct(&mut ids, &record.cluster_id);
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::{selectable_cluster_ids, FacetOptions, FilterConfig};
    use crate::domain::segment::{
        ClusterId, DeviceType, EngagementChannel, Interest, SegmentRecord,
    };

    fn record(id: &str, interest: Interest, location: &str, age: u32) -> SegmentRecord {
        SegmentRecord {
            cluster_id: ClusterId(id.to_string()),
            interest,
            age,
            device_type: DeviceType::Mobile,
            is_subscriber: false,
            previous_engagement: EngagementChannel::None,
            peak_access_hour: None,
            location: location.to_string(),
            last_access_days_ago: 0,
            avg_daily_minutes: None,
        }
    }

    fn sample() -> Vec<SegmentRecord> {
        let mut news = record("c-1", Interest::News, "São Paulo", 52);
        news.peak_access_hour = Some(9);
        news.avg_daily_minutes = Some(42.5);
        news.previous_engagement = EngagementChannel::Email;

        let mut sports = record("c-2", Interest::Sports, "Recife", 22);
        sports.peak_access_hour = Some(21);
        sports.avg_daily_minutes = Some(12.0);

        let mut recipes = record("c-3", Interest::Recipes, " são paulo ", 34);
        recipes.is_subscriber = true;
        recipes.device_type = DeviceType::Desktop;

        vec![news, sports, recipes]
    }

    fn ids(records: &[SegmentRecord]) -> Vec<&str> {
        records.iter().map(|record| record.cluster_id.0.as_str()).collect()
    }

    #[test]
    fn default_config_keeps_everything() {
        let records = sample();
        let config = FilterConfig::default();

        assert!(config.is_empty());
        assert_eq!(config.apply(&records), records);
    }

    #[test]
    fn constraints_combine_with_and() {
        let records = sample();
        let config = FilterConfig {
            locations: vec!["SÃO PAULO".to_string()],
            subscriber: vec![true],
            ..FilterConfig::default()
        };

        assert_eq!(ids(&config.apply(&records)), vec!["c-3"]);
    }

    #[test]
    fn multi_select_values_combine_with_or() {
        let records = sample();
        let config = FilterConfig {
            interests: vec![Interest::News, Interest::Sports],
            ..FilterConfig::default()
        };

        assert_eq!(ids(&config.apply(&records)), vec!["c-1", "c-2"]);
    }

    #[test]
    fn ranges_are_inclusive_and_skip_missing_values() {
        let records = sample();
        let by_hour = FilterConfig { peak_hour_range: Some((9, 20)), ..FilterConfig::default() };
        assert_eq!(ids(&by_hour.apply(&records)), vec!["c-1"]);

        let by_minutes =
            FilterConfig { daily_minutes_range: Some((12.0, 60.0)), ..FilterConfig::default() };
        assert_eq!(ids(&by_minutes.apply(&records)), vec!["c-1", "c-2"]);
    }

    #[test]
    fn facets_list_distinct_values_in_first_seen_order() {
        let records = sample();
        let facets = FacetOptions::from_records(&records);

        assert_eq!(facets.interests, vec![Interest::News, Interest::Sports, Interest::Recipes]);
        assert_eq!(facets.subscriber, vec![false, true]);
        assert_eq!(facets.device_types, vec![DeviceType::Mobile, DeviceType::Desktop]);
        assert_eq!(facets.ages, vec![52, 22, 34]);
        assert_eq!(facets.peak_hour_bounds, Some((9, 21)));
        assert_eq!(facets.daily_minutes_bounds, Some((12.0, 42.5)));
    }

    #[test]
    fn cluster_ids_are_deduplicated() {
        let mut records = sample();
        records.push(record("c-1", Interest::News, "Natal", 40));

        assert_eq!(
            selectable_cluster_ids(&records),
            vec![
                ClusterId("c-1".to_string()),
                ClusterId("c-2".to_string()),
                ClusterId("c-3".to_string())
            ]
        );
    }
}
