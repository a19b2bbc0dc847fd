use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::Result;
use crate::normalizer::{normalize_instance, InstanceEvent};
use crate::resolver::BaselineResolver;
use crate::store::RoutingLog;
use crate::types::{
    Confidence, MetricType, Period, SequenceEstimate, StationVisit, VisitStatus,
};

/// Replays one workflow instance's own station visits against the current
/// baselines to produce an ETA. Visits sharing an arrival date run in
/// parallel and are gated by the slowest member; groups run sequentially.
pub struct SequenceEstimator {
    log: Arc<dyn RoutingLog>,
    resolver: BaselineResolver,
}

struct CollapsedVisit {
    station: String,
    arrive: NaiveDate,
    finish: Option<NaiveDate>,
}

impl SequenceEstimator {
    pub fn new(log: Arc<dyn RoutingLog>, resolver: BaselineResolver) -> Self {
        Self { log, resolver }
    }

    /// None means the instance has no qualifying routing history at all;
    /// that is an expected outcome, never an error.
    pub async fn estimate_sequence_timeline(
        &self,
        instance_id: &str,
    ) -> Result<Option<SequenceEstimate>> {
        let events = self.log.events_for_instance(instance_id).await?;
        let normalized = normalize_instance(&events);
        if normalized.is_empty() {
            debug!(instance_id, "no qualifying routing history");
            return Ok(None);
        }

        let collapsed = collapse_by_station(&normalized);
        let group_ids = assign_parallel_groups(&collapsed);

        let mut visits = Vec::with_capacity(collapsed.len());
        let mut skipped_stations = Vec::new();
        // contribution of each parallel group = max of its members' medians
        let mut group_max: Vec<Option<f64>> = Vec::new();

        for (visit, group_id) in collapsed.iter().zip(group_ids.iter().copied()) {
            let baseline = self
                .resolver
                .get_baseline(&visit.station, MetricType::Initial, Period::Current)
                .await?;

            // A row without a median carries no duration signal and counts
            // as unmatched.
            let matched = baseline.as_ref().and_then(|row| row.p50_days).is_some();
            if matched {
                let p50 = baseline
                    .as_ref()
                    .and_then(|row| row.p50_days)
                    .unwrap_or_default();
                if group_max.len() <= group_id {
                    group_max.resize(group_id + 1, None);
                }
                let existing = group_max[group_id];
                group_max[group_id] = Some(existing.map_or(p50, |max| max.max(p50)));
            } else {
                skipped_stations.push(visit.station.clone());
                if group_max.len() <= group_id {
                    group_max.resize(group_id + 1, None);
                }
            }

            let status = if visit.finish.is_some() {
                VisitStatus::Done
            } else {
                VisitStatus::Stalled
            };

            visits.push(StationVisit {
                station: visit.station.clone(),
                arrive: visit.arrive,
                finish: visit.finish,
                p25_days: baseline.as_ref().and_then(|row| row.p25_days),
                p50_days: baseline.as_ref().and_then(|row| row.p50_days),
                p75_days: baseline.as_ref().and_then(|row| row.p75_days),
                p90_days: baseline.as_ref().and_then(|row| row.p90_days),
                sample_count: baseline.as_ref().map(|row| row.sample_count),
                status,
                parallel_group_id: group_id,
            });
        }

        let total_estimate_days: f64 = group_max.iter().flatten().sum();

        let matched_count = visits.len() - skipped_stations.len();
        let confidence = if matched_count == visits.len() {
            Confidence::High
        } else if matched_count == 0 {
            Confidence::Low
        } else {
            Confidence::Medium
        };

        Ok(Some(SequenceEstimate {
            instance_id: instance_id.to_string(),
            visits,
            total_estimate_days,
            confidence,
            skipped_stations,
        }))
    }
}

/// Collapses repeat visits to one entry per station: first arrival, last
/// finish. A station with any still-pending event stays pending. Discovery
/// order of stations in the log is preserved for tie-breaking.
fn collapse_by_station(events: &[InstanceEvent]) -> Vec<CollapsedVisit> {
    let mut visits: Vec<CollapsedVisit> = Vec::new();

    for event in events {
        match visits.iter_mut().find(|visit| visit.station == event.station) {
            None => visits.push(CollapsedVisit {
                station: event.station.clone(),
                arrive: event.arrive,
                finish: event.finish,
            }),
            Some(existing) => {
                if event.arrive < existing.arrive {
                    existing.arrive = event.arrive;
                }
                existing.finish = match (existing.finish, event.finish) {
                    (Some(old), Some(new)) => Some(old.max(new)),
                    _ => None,
                };
            }
        }
    }

    // Stable sort keeps discovery order within a shared arrival date.
    visits.sort_by_key(|visit| visit.arrive);
    visits
}

/// Two visits share a parallel group iff they share a first-arrival date.
/// Input must already be sorted by arrival, so equal dates are adjacent.
fn assign_parallel_groups(visits: &[CollapsedVisit]) -> Vec<usize> {
    let mut group_ids = Vec::with_capacity(visits.len());
    let mut current_group = 0usize;
    let mut current_date: Option<NaiveDate> = None;

    for visit in visits {
        match current_date {
            Some(date) if date == visit.arrive => {}
            Some(_) => {
                current_group += 1;
                current_date = Some(visit.arrive);
            }
            None => current_date = Some(visit.arrive),
        }
        group_ids.push(current_group);
    }
    group_ids
}
