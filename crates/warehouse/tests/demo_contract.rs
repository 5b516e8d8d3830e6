use chrono::{TimeZone, Utc};

use clusterpilot_core::{recommend, Channel, FilterConfig, Interest};
use clusterpilot_warehouse::{
    connect_with_settings, load_segments, migrations, DemoClusters, SegmentLookup,
    SqlClusterSource,
};

type DemoContractResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
}

async fn seeded_source() -> DemoContractResult<SqlClusterSource> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    DemoClusters::load(&pool).await.map_err(|error| format!("seed: {error}"))?;
    SqlClusterSource::new(pool, DemoClusters::TABLE).map_err(|error| format!("source: {error}"))
}

#[tokio::test]
async fn demo_rows_load_and_reject_as_contracted() -> DemoContractResult {
    let source = seeded_source().await?;
    let now = Utc.with_ymd_and_hms(2025, 8, 30, 12, 0, 0).unwrap();

    let loaded = load_segments(&source, now).await.map_err(|error| format!("load: {error}"))?;

    let loaded_ids: Vec<&str> =
        loaded.records.iter().map(|record| record.cluster_id.0.as_str()).collect();
    require_eq!(loaded_ids, DemoClusters::valid_cluster_ids());
    let rejected_ids: Vec<&str> =
        loaded.rejected.iter().map(|row| row.cluster_id.as_str()).collect();
    require_eq!(rejected_ids, DemoClusters::invalid_cluster_ids());

    let SegmentLookup::Found(news) = loaded.lookup("cl-002") else {
        return Err("cl-002 should load".to_string());
    };
    require_eq!(news.peak_access_hour, Some(9));
    require_eq!(news.last_access_days_ago, 9);
    Ok(())
}

#[tokio::test]
async fn demo_rows_drive_the_engine_end_to_end() -> DemoContractResult {
    let source = seeded_source().await?;
    let now = Utc.with_ymd_and_hms(2025, 8, 30, 12, 0, 0).unwrap();
    let loaded = load_segments(&source, now).await.map_err(|error| format!("load: {error}"))?;

    let news_only = FilterConfig { interests: vec![Interest::News], ..FilterConfig::default() };
    let news = news_only.apply(&loaded.records);
    require!(news.len() == 3, "expected three valid news clusters, got {}", news.len());

    for record in &loaded.records {
        let recommendation =
            recommend(record, "").map_err(|error| format!("{}: {error}", record.cluster_id))?;
        require!(
            recommendation.message_within_bounds(),
            "{} produced an out-of-bounds message: {}",
            record.cluster_id,
            recommendation.message
        );
    }

    let SegmentLookup::Found(reader) = loaded.lookup("cl-002") else {
        return Err("cl-002 should load".to_string());
    };
    let recommendation = recommend(reader, "").map_err(|error| error.to_string())?;
    require_eq!(recommendation.channel, Channel::Email);
    require_eq!(recommendation.send_time.as_str(), "9:45");
    Ok(())
}
