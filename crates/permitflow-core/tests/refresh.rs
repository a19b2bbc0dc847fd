mod common;

use std::sync::Arc;

use chrono::Duration;
use common::{date, event, fixed_clock, MemoryBaselineStore, MemoryRoutingLog};
use permitflow_core::refresh::{RefreshEngine, RefreshMode};
use permitflow_core::types::{MetricType, RoutingEvent};

fn engine(
    log: Arc<MemoryRoutingLog>,
    store: Arc<MemoryBaselineStore>,
) -> RefreshEngine {
    RefreshEngine::new(log, store, Arc::new(fixed_clock(2024, 6, 1)))
}

/// `count` clean initial-review events for `station`, finishing inside the
/// trailing 90-day window of the 2024-06-01 test clock, with durations
/// cycling over `durations`.
fn clean_events(station: &str, count: usize, durations: &[i64]) -> Vec<RoutingEvent> {
    (0..count)
        .map(|i| {
            let arrive = date(2024, 5, 1) + Duration::days(i as i64 % 20);
            let span = durations[i % durations.len()];
            event(
                &format!("{station}-{i}"),
                station,
                0,
                arrive,
                Some(arrive + Duration::days(span)),
            )
        })
        .collect()
}

#[tokio::test]
async fn fifteen_clean_events_yield_one_current_row() {
    let events = clean_events("BLDG", 15, &[3, 4, 5, 6, 7, 8, 9, 10]);
    let log = Arc::new(MemoryRoutingLog::with_events(events));
    let store = Arc::new(MemoryBaselineStore::default());

    engine(log, store.clone()).run(RefreshMode::Live).await.unwrap();

    let current: Vec<_> = store
        .snapshot()
        .into_iter()
        .filter(|row| row.period == "current")
        .collect();
    assert_eq!(current.len(), 1);
    let row = &current[0];
    assert_eq!(row.station, "BLDG");
    assert_eq!(row.metric_type, MetricType::Initial);
    assert_eq!(row.sample_count, 15);

    let p25 = row.p25_days.unwrap();
    let p50 = row.p50_days.unwrap();
    let p75 = row.p75_days.unwrap();
    let p90 = row.p90_days.unwrap();
    assert!(p25 <= p50 && p50 <= p75 && p75 <= p90);
}

#[tokio::test]
async fn five_events_yield_no_rows() {
    let events = clean_events("ZONE", 5, &[4]);
    let log = Arc::new(MemoryRoutingLog::with_events(events));
    let store = Arc::new(MemoryBaselineStore::default());

    let report = engine(log, store.clone()).run(RefreshMode::Live).await.unwrap();

    assert_eq!(report.rows_written, 0);
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn pass_through_events_never_contribute() {
    let mut events = clean_events("BLDG", 12, &[5]);
    for i in 0..5 {
        let mut extra = event(
            &format!("ADMIN-{i}"),
            "BLDG",
            0,
            date(2024, 5, 10),
            Some(date(2024, 5, 15)),
        );
        extra.result_code = Some("administrative".to_string());
        events.push(extra);
    }
    let log = Arc::new(MemoryRoutingLog::with_events(events));
    let store = Arc::new(MemoryBaselineStore::default());

    engine(log, store.clone()).run(RefreshMode::Live).await.unwrap();

    for row in store.snapshot() {
        assert_eq!(row.sample_count, 12, "period {}", row.period);
    }
}

#[tokio::test]
async fn thin_current_stations_get_widened_stats_under_current_label() {
    // FIRE: 12 recent events (5 days each) plus 25 older ones (20 days each)
    // that only the 180-day window sees. BLDG: 35 recent events, healthy.
    let mut events = clean_events("FIRE", 12, &[5]);
    for i in 0..25 {
        let arrive = date(2024, 1, 5) + Duration::days(i as i64);
        events.push(event(
            &format!("FIRE-old-{i}"),
            "FIRE",
            0,
            arrive,
            Some(arrive + Duration::days(20)),
        ));
    }
    events.extend(clean_events("BLDG", 35, &[4]));

    let log = Arc::new(MemoryRoutingLog::with_events(events));
    let store = Arc::new(MemoryBaselineStore::default());

    engine(log, store.clone()).run(RefreshMode::Live).await.unwrap();

    let rows = store.snapshot();
    let fire_current = rows
        .iter()
        .find(|row| row.station == "FIRE" && row.period == "current")
        .unwrap();
    // substituted 180-day stats, persisted under the original label
    assert_eq!(fire_current.sample_count, 37);
    assert_eq!(fire_current.p50_days, Some(20.0));

    let bldg_current = rows
        .iter()
        .find(|row| row.station == "BLDG" && row.period == "current")
        .unwrap();
    assert_eq!(bldg_current.sample_count, 35);
}

#[tokio::test]
async fn widening_can_rescue_a_station_below_the_row_floor() {
    // 6 recent + 6 older events: invisible at 90 days, persisted at 180.
    let mut events = clean_events("HLTH", 6, &[5]);
    for i in 0..6 {
        let arrive = date(2024, 1, 20) + Duration::days(i as i64);
        events.push(event(
            &format!("HLTH-old-{i}"),
            "HLTH",
            0,
            arrive,
            Some(arrive + Duration::days(5)),
        ));
    }
    let log = Arc::new(MemoryRoutingLog::with_events(events));
    let store = Arc::new(MemoryBaselineStore::default());

    engine(log, store.clone()).run(RefreshMode::Live).await.unwrap();

    let rows = store.snapshot();
    let current = rows
        .iter()
        .find(|row| row.station == "HLTH" && row.period == "current")
        .unwrap();
    assert_eq!(current.sample_count, 12);
}

#[tokio::test]
async fn refresh_is_idempotent_under_a_pinned_clock() {
    let events = clean_events("BLDG", 20, &[3, 6, 9]);
    let log = Arc::new(MemoryRoutingLog::with_events(events));
    let store = Arc::new(MemoryBaselineStore::default());

    let engine = RefreshEngine::new(log, store.clone(), Arc::new(fixed_clock(2024, 6, 1)));
    engine.run(RefreshMode::Live).await.unwrap();
    let first = store.snapshot();
    engine.run(RefreshMode::Live).await.unwrap();
    let second = store.snapshot();

    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[tokio::test]
async fn one_failing_window_does_not_abort_the_run() {
    let events = clean_events("BLDG", 40, &[4, 8]);
    let log = Arc::new(MemoryRoutingLog::with_events(events));
    log.fail_next_fetches(1); // current-window fetch fails, baseline proceeds
    let store = Arc::new(MemoryBaselineStore::default());

    let report = engine(log, store.clone()).run(RefreshMode::Live).await.unwrap();

    assert_eq!(report.failures.len(), 2);
    assert!(report
        .failures
        .iter()
        .all(|failure| failure.combination.starts_with("current/")));
    assert!(report.rows_written > 0);
    assert!(store
        .snapshot()
        .iter()
        .all(|row| row.period == "baseline"));
}

#[tokio::test]
async fn legacy_mode_writes_reporting_periods() {
    let mut events = Vec::new();
    for i in 0..12 {
        let arrive = date(2023, 5, 1) + Duration::days(i as i64);
        events.push(event(
            &format!("P-{i}"),
            "BLDG",
            0,
            arrive,
            Some(arrive + Duration::days(6)),
        ));
    }
    let log = Arc::new(MemoryRoutingLog::with_events(events));
    let store = Arc::new(MemoryBaselineStore::default());

    engine(log, store.clone()).run(RefreshMode::Legacy).await.unwrap();

    let rows = store.snapshot();
    let periods: Vec<&str> = rows.iter().map(|row| row.period.as_str()).collect();
    assert!(periods.contains(&"all"));
    assert!(periods.contains(&"2023"));
    // 2023 completions fall outside the trailing-6-month and 2024 windows
    assert!(!periods.contains(&"recent_6mo"));
    assert!(!periods.contains(&"2024"));
    assert!(!periods.contains(&"current"));
}
