use serde::{Deserialize, Serialize};

use crate::config::TREND_THRESHOLD_PCT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendArrow {
    Slower,
    Faster,
    Normal,
}

/// Percent drift of the current-window median against the baseline-window
/// median. None when either input is missing or zero (no meaningful ratio).
pub fn pct_change(current_p50: Option<f64>, baseline_p50: Option<f64>) -> Option<f64> {
    let current = current_p50?;
    let baseline = baseline_p50?;
    if current == 0.0 || baseline == 0.0 {
        return None;
    }
    Some((current - baseline) / baseline * 100.0)
}

/// Classifies drift between the two windows. Indeterminate inputs classify
/// as Normal rather than raising an error.
pub fn classify_trend(current_p50: Option<f64>, baseline_p50: Option<f64>) -> TrendArrow {
    match pct_change(current_p50, baseline_p50) {
        Some(change) if change > TREND_THRESHOLD_PCT => TrendArrow::Slower,
        Some(change) if change < -TREND_THRESHOLD_PCT => TrendArrow::Faster,
        _ => TrendArrow::Normal,
    }
}
