use chrono::{DateTime, Utc};

/// Injected time source. Refresh windows and `computed_at` stamps all flow
/// from this trait so a run is reproducible under a pinned clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
