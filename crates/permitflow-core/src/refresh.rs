use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregator::{aggregate, StationStats};
use crate::clock::Clock;
use crate::config::{
    BASELINE_WINDOW_DAYS, CURRENT_WINDOW_DAYS, CUTOFF_YEAR, MIN_CURRENT_SAMPLES, MIN_SAMPLES,
    RECENT_WINDOW_DAYS, WIDENED_WINDOW_DAYS,
};
use crate::error::Result;
use crate::normalizer::{normalize_events, CleanSample};
use crate::store::{BaselineStore, RoutingLog};
use crate::types::{MetricType, Period, StationBaseline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Rolling `current` + `baseline` windows for live estimation and trend
    /// detection. This is the cron path.
    Live,
    /// All-time, per-calendar-year, and trailing-6-month windows for
    /// dashboards and historical comparison.
    Legacy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshFailure {
    /// "period/metric" label of the combination that was skipped.
    pub combination: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshReport {
    pub rows_written: usize,
    pub failures: Vec<RefreshFailure>,
}

/// Orchestrates a full baseline rebuild: truncate, recompute every
/// (period x metric type) combination, bulk-insert. A failing combination is
/// logged and recorded, never fatal to the rest of the run. Two runs against
/// unchanged input under the same clock write identical row sets.
pub struct RefreshEngine {
    log: Arc<dyn RoutingLog>,
    store: Arc<dyn BaselineStore>,
    clock: Arc<dyn Clock>,
}

impl RefreshEngine {
    pub fn new(
        log: Arc<dyn RoutingLog>,
        store: Arc<dyn BaselineStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { log, store, clock }
    }

    pub async fn run(&self, mode: RefreshMode) -> Result<RefreshReport> {
        self.store.ensure_schema().await?;
        self.store.truncate().await?;

        let now = self.clock.now();
        let today = now.date_naive();
        let mut report = RefreshReport::default();

        for period in periods_for(mode, today) {
            let (start, end) = window_bounds(period, today);
            let events = match self.log.events_between(start, end).await {
                Ok(events) => events,
                Err(err) => {
                    record_failures(&mut report, period, &err.to_string());
                    continue;
                }
            };
            let samples = normalize_events(&events);

            // The widener needs the 180-day window to catch stations that are
            // thin or entirely absent from the 90-day one.
            let wide_samples = if period == Period::Current {
                self.fetch_widened_samples(today, &mut report).await
            } else {
                None
            };

            for metric_type in [MetricType::Initial, MetricType::Revision] {
                let mut stats = aggregate(&samples, metric_type);
                if let Some(wide) = wide_samples.as_deref() {
                    stats = widen_thin_stations(stats, aggregate(wide, metric_type));
                }

                let rows = to_rows(stats, metric_type, &period, now);
                match self.store.insert(&rows).await {
                    Ok(()) => report.rows_written += rows.len(),
                    Err(err) => {
                        let combination = format!("{}/{}", period.label(), metric_type.as_str());
                        warn!(%combination, error = %err, "skipping failed refresh combination");
                        report.failures.push(RefreshFailure {
                            combination,
                            error: err.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            rows_written = report.rows_written,
            failures = report.failures.len(),
            "baseline refresh complete"
        );
        Ok(report)
    }

    async fn fetch_widened_samples(
        &self,
        today: NaiveDate,
        report: &mut RefreshReport,
    ) -> Option<Vec<CleanSample>> {
        let start = today - Duration::days(WIDENED_WINDOW_DAYS);
        match self.log.events_between(start, today).await {
            Ok(events) => Some(normalize_events(&events)),
            Err(err) => {
                // Thin stations keep their 90-day stats; freshness over width.
                warn!(error = %err, "widened window fetch failed, keeping 90-day stats");
                report.failures.push(RefreshFailure {
                    combination: "current/widened".to_string(),
                    error: err.to_string(),
                });
                None
            }
        }
    }
}

fn record_failures(report: &mut RefreshReport, period: Period, error: &str) {
    for metric_type in [MetricType::Initial, MetricType::Revision] {
        let combination = format!("{}/{}", period.label(), metric_type.as_str());
        warn!(%combination, error, "skipping failed refresh combination");
        report.failures.push(RefreshFailure {
            combination,
            error: error.to_string(),
        });
    }
}

fn periods_for(mode: RefreshMode, today: NaiveDate) -> Vec<Period> {
    match mode {
        RefreshMode::Live => vec![Period::Current, Period::Baseline],
        RefreshMode::Legacy => {
            let mut periods = vec![Period::All];
            periods.extend((CUTOFF_YEAR..=today.year()).map(Period::Year));
            periods.push(Period::Recent6Mo);
            periods
        }
    }
}

fn window_bounds(period: Period, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match period {
        Period::Current => (today - Duration::days(CURRENT_WINDOW_DAYS), today),
        Period::Baseline => (today - Duration::days(BASELINE_WINDOW_DAYS), today),
        Period::Recent6Mo => (today - Duration::days(RECENT_WINDOW_DAYS), today),
        Period::All => (first_day_of(CUTOFF_YEAR), today),
        Period::Year(year) => (first_day_of(year), last_day_of(year)),
    }
}

fn first_day_of(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn last_day_of(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Substitutes 180-day statistics for any station below the thin-sample
/// threshold in the 90-day window, keeping the `current` label. Stations with
/// a healthy 90-day count are untouched; the 90-day window is a subset of the
/// 180-day one, so the widened aggregate covers every station.
fn widen_thin_stations(narrow: Vec<StationStats>, wide: Vec<StationStats>) -> Vec<StationStats> {
    let narrow_by_station: HashMap<String, StationStats> = narrow
        .into_iter()
        .map(|stats| (stats.station.clone(), stats))
        .collect();

    let mut merged: Vec<StationStats> = wide
        .into_iter()
        .map(|wide_stats| match narrow_by_station.get(&wide_stats.station) {
            Some(narrow_stats) if narrow_stats.count >= MIN_CURRENT_SAMPLES => {
                narrow_stats.clone()
            }
            _ => wide_stats,
        })
        .collect();

    merged.sort_by(|a, b| a.station.cmp(&b.station));
    merged
}

fn to_rows(
    stats: Vec<StationStats>,
    metric_type: MetricType,
    period: &Period,
    computed_at: chrono::DateTime<chrono::Utc>,
) -> Vec<StationBaseline> {
    stats
        .into_iter()
        .filter(|entry| entry.count >= MIN_SAMPLES)
        .map(|entry| StationBaseline {
            station: entry.station,
            metric_type,
            period: period.label(),
            p25_days: entry.p25_days,
            p50_days: entry.p50_days,
            p75_days: entry.p75_days,
            p90_days: entry.p90_days,
            sample_count: entry.count as i64,
            computed_at,
        })
        .collect()
}
