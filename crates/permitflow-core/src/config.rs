//! Engine tunables. These mirror the routing-log retention and review-cycle
//! policies of the source system; they are compile-time constants rather than
//! runtime configuration because changing them invalidates every persisted
//! baseline row.

/// Events whose review arrived before this year are too sparse to trust.
pub const CUTOFF_YEAR: i32 = 2018;

/// A baseline row is only persisted when at least this many samples survive
/// normalization.
pub const MIN_SAMPLES: usize = 10;

/// Below this count the `current` window is considered thin and the widener
/// substitutes a longer trailing window for that station.
pub const MIN_CURRENT_SAMPLES: usize = 30;

/// Reviews open longer than a year are routing artifacts, not review work.
pub const MAX_REVIEW_DAYS: i64 = 365;

pub const CURRENT_WINDOW_DAYS: i64 = 90;
pub const WIDENED_WINDOW_DAYS: i64 = 180;
pub const BASELINE_WINDOW_DAYS: i64 = 365;
pub const RECENT_WINDOW_DAYS: i64 = 183;

/// Percent drift beyond which a station is flagged slower/faster than its
/// long-run baseline.
pub const TREND_THRESHOLD_PCT: f64 = 15.0;

/// Result codes marking pass-through/administrative routing steps that carry
/// no duration signal. Matched case-insensitively.
pub const PASS_THROUGH_RESULT_CODES: [&str; 2] = ["administrative", "not applicable"];
