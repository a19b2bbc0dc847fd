/// Continuous linearly-interpolated percentiles over duration samples.
///
/// All four persisted statistics come through the same routine, which keeps
/// the p25 <= p50 <= p75 <= p90 invariant true by construction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PercentileSummary {
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub p90: Option<f64>,
}

pub fn summarize(values: &[f64]) -> PercentileSummary {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    PercentileSummary {
        p25: interpolated(&sorted, 25.0),
        p50: interpolated(&sorted, 50.0),
        p75: interpolated(&sorted, 75.0),
        p90: interpolated(&sorted, 90.0),
    }
}

/// Interpolated percentile of an ascending-sorted slice, nearest-rank is
/// deliberately not used. Empty input yields None.
pub fn interpolated(sorted: &[f64], pct: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
