use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CUTOFF_YEAR;
use crate::error::EngineError;

/// One raw routing-log event: a permit instance arriving at (and possibly
/// leaving) a review station. The log is external and append-only; every
/// field except the instance id can be missing or garbage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingEvent {
    pub instance_id: String,
    pub station: Option<String>,
    /// 0 = initial submission, >= 1 = a correction/revision round.
    pub cycle_number: i32,
    pub arrive: Option<NaiveDate>,
    /// None means the review is still pending.
    pub finish: Option<NaiveDate>,
    pub reviewer_id: Option<String>,
    pub result_code: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Initial,
    Revision,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Initial => "initial",
            MetricType::Revision => "revision",
        }
    }

    pub fn parse(value: &str) -> Result<Self, EngineError> {
        match value {
            "initial" => Ok(MetricType::Initial),
            "revision" => Ok(MetricType::Revision),
            other => Err(EngineError::UnknownMetricType(other.to_string())),
        }
    }
}

/// A named aggregation window. Rolling windows (`current`, `baseline`,
/// `recent_6mo`) trail the injected clock; `all` and calendar years are
/// anchored at fixed dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Current,
    Baseline,
    All,
    Recent6Mo,
    Year(i32),
}

impl Period {
    pub fn label(&self) -> String {
        match self {
            Period::Current => "current".to_string(),
            Period::Baseline => "baseline".to_string(),
            Period::All => "all".to_string(),
            Period::Recent6Mo => "recent_6mo".to_string(),
            Period::Year(year) => year.to_string(),
        }
    }

    pub fn parse(value: &str) -> Result<Self, EngineError> {
        match value {
            "current" => Ok(Period::Current),
            "baseline" => Ok(Period::Baseline),
            "all" => Ok(Period::All),
            "recent_6mo" => Ok(Period::Recent6Mo),
            // Only years the engine could have aggregated are valid labels.
            other => match other.parse::<i32>() {
                Ok(year) if (CUTOFF_YEAR..=9999).contains(&year) => Ok(Period::Year(year)),
                _ => Err(EngineError::UnknownPeriod(other.to_string())),
            },
        }
    }
}

/// Persisted percentile turnaround statistics for one (station, metric type,
/// period) combination. Rows are rebuilt wholesale by `refresh()` and never
/// partially updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationBaseline {
    pub station: String,
    pub metric_type: MetricType,
    pub period: String,
    pub p25_days: Option<f64>,
    pub p50_days: Option<f64>,
    pub p75_days: Option<f64>,
    pub p90_days: Option<f64>,
    pub sample_count: i64,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Done,
    Stalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// One collapsed station visit inside a sequence estimate. Percentile fields
/// are copied from the matched `current` baseline; all None when the station
/// had no baseline match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationVisit {
    pub station: String,
    pub arrive: NaiveDate,
    pub finish: Option<NaiveDate>,
    pub p25_days: Option<f64>,
    pub p50_days: Option<f64>,
    pub p75_days: Option<f64>,
    pub p90_days: Option<f64>,
    pub sample_count: Option<i64>,
    pub status: VisitStatus,
    /// Visits sharing a group id arrived the same day and run concurrently.
    pub parallel_group_id: usize,
}

/// Per-instance ETA built by replaying the instance's own station visits
/// against current baselines. Computed on demand, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceEstimate {
    pub instance_id: String,
    pub visits: Vec<StationVisit>,
    pub total_estimate_days: f64,
    pub confidence: Confidence,
    pub skipped_stations: Vec<String>,
}
