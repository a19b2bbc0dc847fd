use std::collections::HashMap;

use crate::normalizer::CleanSample;
use crate::percentile::summarize;
use crate::types::MetricType;

/// Per-station turnaround statistics for one metric type within one window.
/// Every observed station is reported with its raw count; the minimum-sample
/// cut is applied by the refresh layer so the widener can see thin stations.
#[derive(Debug, Clone, PartialEq)]
pub struct StationStats {
    pub station: String,
    pub count: usize,
    pub p25_days: Option<f64>,
    pub p50_days: Option<f64>,
    pub p75_days: Option<f64>,
    pub p90_days: Option<f64>,
}

pub fn aggregate(samples: &[CleanSample], metric_type: MetricType) -> Vec<StationStats> {
    let mut by_station: HashMap<&str, Vec<f64>> = HashMap::new();
    for sample in samples {
        if sample.metric_type != metric_type {
            continue;
        }
        by_station
            .entry(sample.station.as_str())
            .or_default()
            .push(sample.duration_days);
    }

    let mut stats: Vec<StationStats> = by_station
        .into_iter()
        .map(|(station, durations)| {
            let summary = summarize(&durations);
            StationStats {
                station: station.to_string(),
                count: durations.len(),
                p25_days: summary.p25,
                p50_days: summary.p50,
                p75_days: summary.p75,
                p90_days: summary.p90,
            }
        })
        .collect();

    // Stable output order so repeated refreshes write identical row sets.
    stats.sort_by(|a, b| a.station.cmp(&b.station));
    stats
}
