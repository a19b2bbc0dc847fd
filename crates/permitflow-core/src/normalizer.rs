use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::config::{CUTOFF_YEAR, MAX_REVIEW_DAYS, PASS_THROUGH_RESULT_CODES};
use crate::types::{MetricType, RoutingEvent};

/// One cleaned duration observation feeding the percentile aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanSample {
    pub station: String,
    pub metric_type: MetricType,
    pub duration_days: f64,
}

/// One surviving visit of a single instance, kept for sequence replay.
/// Unlike `CleanSample`, a pending visit (no finish yet) survives here.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceEvent {
    pub station: String,
    pub cycle_number: i32,
    pub arrive: NaiveDate,
    pub finish: Option<NaiveDate>,
}

fn is_pass_through(result_code: Option<&str>) -> bool {
    let Some(code) = result_code else {
        return false;
    };
    let code = code.trim().to_ascii_lowercase();
    PASS_THROUGH_RESULT_CODES.iter().any(|marker| code == *marker)
}

/// Base filters shared by both normalization paths: cutoff year, required
/// station/arrive fields, pass-through result codes.
fn survives_base_filters(event: &RoutingEvent) -> Option<(&str, NaiveDate)> {
    let station = event.station.as_deref()?;
    if station.trim().is_empty() {
        return None;
    }
    let arrive = event.arrive?;
    if arrive.year() < CUTOFF_YEAR {
        return None;
    }
    if is_pass_through(event.result_code.as_deref()) {
        return None;
    }
    Some((station, arrive))
}

fn classify(cycle_number: i32) -> MetricType {
    if cycle_number == 0 {
        MetricType::Initial
    } else {
        MetricType::Revision
    }
}

/// Cleans a window of raw events into duration observations.
///
/// Filter order: cutoff year, missing fields, pass-through result codes,
/// then the negative/outlier duration cap. Surviving reassignment duplicates
/// for the same (instance, station, cycle) collapse to the one with the
/// latest finish.
pub fn normalize_events(events: &[RoutingEvent]) -> Vec<CleanSample> {
    // key -> (finish, arrive, sample); MAX-by-finish reduction, not a sum or
    // average. Equal finishes break toward the later arrive so the result is
    // insensitive to input row order.
    let mut best: HashMap<(String, String, i32), (NaiveDate, NaiveDate, CleanSample)> =
        HashMap::new();

    for event in events {
        let Some((station, arrive)) = survives_base_filters(event) else {
            continue;
        };
        let Some(finish) = event.finish else {
            continue;
        };
        let span_days = (finish - arrive).num_days();
        if span_days < 0 || span_days > MAX_REVIEW_DAYS {
            continue;
        }

        let sample = CleanSample {
            station: station.to_string(),
            metric_type: classify(event.cycle_number),
            duration_days: span_days as f64,
        };
        let key = (
            event.instance_id.clone(),
            station.to_string(),
            event.cycle_number,
        );
        let replace = match best.get(&key) {
            None => true,
            Some((existing_finish, existing_arrive, _)) => {
                finish > *existing_finish
                    || (finish == *existing_finish && arrive > *existing_arrive)
            }
        };
        if replace {
            best.insert(key, (finish, arrive, sample));
        }
    }

    best.into_values().map(|(_, _, sample)| sample).collect()
}

/// Cleans one instance's own events for sequence replay. Same filters and
/// dedup as `normalize_events`, except pending visits are kept, and within a
/// dedup group a pending event outranks any finished one: an open
/// reassignment is the live routing row.
pub fn normalize_instance(events: &[RoutingEvent]) -> Vec<InstanceEvent> {
    let mut order: Vec<(String, String, i32)> = Vec::new();
    let mut best: HashMap<(String, String, i32), InstanceEvent> = HashMap::new();

    for event in events {
        let Some((station, arrive)) = survives_base_filters(event) else {
            continue;
        };
        if let Some(finish) = event.finish {
            let span_days = (finish - arrive).num_days();
            if span_days < 0 || span_days > MAX_REVIEW_DAYS {
                continue;
            }
        }

        let candidate = InstanceEvent {
            station: station.to_string(),
            cycle_number: event.cycle_number,
            arrive,
            finish: event.finish,
        };
        let key = (
            event.instance_id.clone(),
            station.to_string(),
            event.cycle_number,
        );
        match best.get(&key) {
            None => {
                order.push(key.clone());
                best.insert(key, candidate);
            }
            Some(existing) => {
                if ranks_later(&candidate, existing) {
                    best.insert(key, candidate);
                }
            }
        }
    }

    // Log order is meaningful downstream (parallel-group tie-breaking), so
    // emit in first-seen order rather than hash order.
    order
        .into_iter()
        .filter_map(|key| best.remove(&key))
        .collect()
}

// Same tie-break as the aggregate path: equal finishes (or two open rows)
// resolve on the later arrive, keeping dedup independent of row order.
fn ranks_later(candidate: &InstanceEvent, existing: &InstanceEvent) -> bool {
    match (candidate.finish, existing.finish) {
        (None, Some(_)) => true,
        (Some(_), None) => false,
        (None, None) => candidate.arrive > existing.arrive,
        (Some(new), Some(old)) => {
            new > old || (new == old && candidate.arrive > existing.arrive)
        }
    }
}
