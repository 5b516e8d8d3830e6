use serde::Serialize;

use clusterpilot_core::{
    DeviceType, EngagementChannel, FacetOptions, FilterConfig, Interest, SegmentRecord,
};
use clusterpilot_warehouse::RejectedRow;

use crate::commands::{load_clusters, load_config, runtime, CommandResult};

/// Filter flags as parsed from the command line.
#[derive(Clone, Debug, Default)]
pub struct ClusterFilterArgs {
    pub interests: Vec<String>,
    pub locations: Vec<String>,
    pub engagements: Vec<String>,
    pub subscriber: Option<bool>,
    pub devices: Vec<String>,
    pub ages: Vec<u32>,
    pub peak_hour_from: Option<u8>,
    pub peak_hour_to: Option<u8>,
    pub minutes_from: Option<f64>,
    pub minutes_to: Option<f64>,
}

impl ClusterFilterArgs {
    pub fn to_filter(&self) -> FilterConfig {
        let peak_hour_range = match (self.peak_hour_from, self.peak_hour_to) {
            (None, None) => None,
            (from, to) => Some((from.unwrap_or(0), to.unwrap_or(23))),
        };
        let daily_minutes_range = match (self.minutes_from, self.minutes_to) {
            (None, None) => None,
            (from, to) => Some((from.unwrap_or(0.0), to.unwrap_or(f64::MAX))),
        };

        FilterConfig {
            interests: self.interests.iter().map(|value| Interest::parse(value)).collect(),
            locations: self.locations.clone(),
            previous_engagements: self
                .engagements
                .iter()
                .map(|value| EngagementChannel::parse(value))
                .collect(),
            subscriber: self.subscriber.into_iter().collect(),
            device_types: self.devices.iter().map(|value| DeviceType::parse(value)).collect(),
            ages: self.ages.clone(),
            peak_hour_range,
            daily_minutes_range,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClusterListing<'a> {
    filter: &'a FilterConfig,
    total: usize,
    records: Vec<SegmentRecord>,
    facets: FacetOptions,
    rejected: &'a [RejectedRow],
}

pub fn run(args: &ClusterFilterArgs, json_output: bool) -> CommandResult {
    let config = match load_config("clusters") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime("clusters") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let loaded = match runtime.block_on(load_clusters(&config)) {
        Ok(loaded) => loaded,
        Err(failure) => return CommandResult::from_step("clusters", failure),
    };

    let filter = args.to_filter();
    let listing = ClusterListing {
        filter: &filter,
        total: loaded.records.len(),
        records: filter.apply(&loaded.records),
        facets: FacetOptions::from_records(&loaded.records),
        rejected: &loaded.rejected,
    };
    let message = format!("{} of {} clusters match", listing.records.len(), listing.total);

    if json_output {
        return CommandResult::success_with_data("clusters", message, &listing);
    }
    CommandResult::text(render_human(&listing, &message))
}

fn render_human(listing: &ClusterListing<'_>, message: &str) -> String {
    let mut lines = vec![message.to_string()];
    for record in &listing.records {
        let peak = record
            .peak_access_hour
            .map(|hour| format!("{hour}h"))
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "- {} | {} | age {} | {} | subscriber: {} | history: {} | peak: {} | {}",
            record.cluster_id,
            record.interest.as_str(),
            record.age,
            record.device_type.as_str(),
            if record.is_subscriber { "yes" } else { "no" },
            record.previous_engagement.as_str(),
            peak,
            record.location,
        ));
    }
    for rejected in listing.rejected {
        lines.push(format!("! {} rejected: {}", rejected.cluster_id, rejected.reason));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use clusterpilot_core::{DeviceType, EngagementChannel, Interest};

    use super::ClusterFilterArgs;

    #[test]
    fn empty_args_build_the_reset_filter() {
        assert!(ClusterFilterArgs::default().to_filter().is_empty());
    }

    #[test]
    fn flags_are_parsed_into_domain_values() {
        let args = ClusterFilterArgs {
            interests: vec!["Esportes".to_string()],
            engagements: vec!["e-mail".to_string()],
            devices: vec!["mobile".to_string()],
            subscriber: Some(false),
            peak_hour_from: Some(18),
            ..ClusterFilterArgs::default()
        };
        let filter = args.to_filter();

        assert_eq!(filter.interests, vec![Interest::Sports]);
        assert_eq!(filter.previous_engagements, vec![EngagementChannel::Email]);
        assert_eq!(filter.device_types, vec![DeviceType::Mobile]);
        assert_eq!(filter.subscriber, vec![false]);
        assert_eq!(filter.peak_hour_range, Some((18, 23)));
        assert_eq!(filter.daily_minutes_range, None);
    }
}
