//! Engagement estimate. Works in tenths of a percent so the output is exact.

use crate::domain::campaign::Channel;
use crate::domain::segment::{EngagementChannel, SegmentRecord};

const FLOOR_TENTHS: i32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngagementFactor {
    pub delta_tenths: i32,
    pub rationale: &'static str,
}

fn base_tenths(channel: Channel) -> i32 {
    match channel {
        Channel::Push => 30,
        Channel::Email => 20,
    }
}

pub fn engagement_factors(record: &SegmentRecord, channel: Channel) -> Vec<EngagementFactor> {
    let mut factors = Vec::new();
    let mut push = |delta_tenths, rationale| {
        factors.push(EngagementFactor { delta_tenths, rationale });
    };

    let history_matches = matches!(
        (record.previous_engagement, channel),
        (EngagementChannel::Push, Channel::Push) | (EngagementChannel::Email, Channel::Email)
    );
    if history_matches {
        push(8, "histórico no canal");
    }
    if record.is_subscriber {
        push(5, "assinante ativo");
    }
    match record.last_access_days_ago {
        0..=7 => push(4, "acesso recente"),
        8..=30 => {}
        _ => push(-6, "inativo há mais de 30 dias"),
    }
    match record.avg_daily_minutes {
        Some(minutes) if minutes >= 60.0 => push(5, "alto tempo de leitura"),
        Some(minutes) if minutes < 10.0 => push(-3, "baixo tempo de leitura"),
        _ => {}
    }
    if record.peak_access_hour.is_some() {
        push(3, "envio no horário de pico");
    }

    factors
}

/// Formats as `"3.5% (histórico no canal)"`; the parenthetical names the
/// factor with the largest absolute effect.
pub fn estimate_engagement(record: &SegmentRecord, channel: Channel) -> String {
    let factors = engagement_factors(record, channel);
    let total = base_tenths(channel) + factors.iter().map(|f| f.delta_tenths).sum::<i32>();
    let total = total.max(FLOOR_TENTHS);

    let mut dominant: Option<&EngagementFactor> = None;
    for factor in &factors {
        let stronger = dominant.map_or(true, |d| factor.delta_tenths.abs() > d.delta_tenths.abs());
        if stronger {
            dominant = Some(factor);
        }
    }

    let value = format!("{}.{}%", total / 10, total % 10);
    match dominant {
        Some(factor) => format!("{value} ({})", factor.rationale),
        None => value,
    }
}
