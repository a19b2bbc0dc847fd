#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use permitflow_core::clock::Clock;
use permitflow_core::error::{EngineError, Result};
use permitflow_core::store::{BaselineStore, RoutingLog};
use permitflow_core::types::{MetricType, RoutingEvent, StationBaseline};

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn fixed_clock(year: i32, month: u32, day: u32) -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap())
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn event(
    instance_id: &str,
    station: &str,
    cycle_number: i32,
    arrive: NaiveDate,
    finish: Option<NaiveDate>,
) -> RoutingEvent {
    RoutingEvent {
        instance_id: instance_id.to_string(),
        station: Some(station.to_string()),
        cycle_number,
        arrive: Some(arrive),
        finish,
        reviewer_id: None,
        result_code: None,
        department: None,
    }
}

pub fn baseline_row(
    station: &str,
    metric_type: MetricType,
    period: &str,
    p50_days: Option<f64>,
    sample_count: i64,
) -> StationBaseline {
    StationBaseline {
        station: station.to_string(),
        metric_type,
        period: period.to_string(),
        p25_days: p50_days.map(|p50| p50 * 0.5),
        p50_days,
        p75_days: p50_days.map(|p50| p50 * 1.5),
        p90_days: p50_days.map(|p50| p50 * 2.0),
        sample_count,
        computed_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

#[derive(Default)]
pub struct MemoryBaselineStore {
    rows: Mutex<Vec<StationBaseline>>,
}

impl MemoryBaselineStore {
    pub fn with_rows(rows: Vec<StationBaseline>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn snapshot(&self) -> Vec<StationBaseline> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaselineStore for MemoryBaselineStore {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn truncate(&self) -> Result<()> {
        self.rows.lock().unwrap().clear();
        Ok(())
    }

    async fn insert(&self, rows: &[StationBaseline]) -> Result<()> {
        self.rows.lock().unwrap().extend_from_slice(rows);
        Ok(())
    }

    async fn get(
        &self,
        station: &str,
        metric_type: MetricType,
        period: &str,
    ) -> Result<Option<StationBaseline>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| {
                row.station == station && row.metric_type == metric_type && row.period == period
            })
            .cloned())
    }

    async fn list(
        &self,
        period: &str,
        metric_type: Option<MetricType>,
    ) -> Result<Vec<StationBaseline>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| {
                row.period == period && metric_type.map_or(true, |m| row.metric_type == m)
            })
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryRoutingLog {
    pub events: Vec<RoutingEvent>,
    /// Number of upcoming `events_between` calls that should fail.
    fail_next: Mutex<u32>,
}

impl MemoryRoutingLog {
    pub fn with_events(events: Vec<RoutingEvent>) -> Self {
        Self {
            events,
            fail_next: Mutex::new(0),
        }
    }

    pub fn fail_next_fetches(&self, count: u32) {
        *self.fail_next.lock().unwrap() = count;
    }
}

#[async_trait]
impl RoutingLog for MemoryRoutingLog {
    async fn events_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RoutingEvent>> {
        {
            let mut remaining = self.fail_next.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(EngineError::Log("injected fetch failure".into()));
            }
        }
        Ok(self
            .events
            .iter()
            .filter(|event| {
                event
                    .finish
                    .map_or(false, |finish| finish >= start && finish <= end)
            })
            .cloned()
            .collect())
    }

    async fn events_for_instance(&self, instance_id: &str) -> Result<Vec<RoutingEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|event| event.instance_id == instance_id)
            .cloned()
            .collect())
    }
}
