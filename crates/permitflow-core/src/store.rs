use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::types::{MetricType, RoutingEvent, StationBaseline};

/// Write/read access to the persisted baseline table. One concrete backend is
/// selected at startup; business logic never branches on backend identity.
#[async_trait]
pub trait BaselineStore: Send + Sync {
    /// Create the baseline table if it does not exist yet (first-run case).
    async fn ensure_schema(&self) -> Result<()>;

    /// Drop every existing row. Refresh is truncate-then-rebuild, never a
    /// partial update.
    async fn truncate(&self) -> Result<()>;

    async fn insert(&self, rows: &[StationBaseline]) -> Result<()>;

    /// Exact point lookup. Fallback policy lives in the resolver, not here.
    async fn get(
        &self,
        station: &str,
        metric_type: MetricType,
        period: &str,
    ) -> Result<Option<StationBaseline>>;

    async fn list(
        &self,
        period: &str,
        metric_type: Option<MetricType>,
    ) -> Result<Vec<StationBaseline>>;
}

/// Read-only view of the external routing log.
#[async_trait]
pub trait RoutingLog: Send + Sync {
    /// Events whose `finish` date falls inside `[start, end]` (inclusive).
    /// Pending events never qualify; per-instance replay uses
    /// `events_for_instance` instead.
    async fn events_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RoutingEvent>>;

    /// Every event for one workflow instance, pending ones included.
    async fn events_for_instance(&self, instance_id: &str) -> Result<Vec<RoutingEvent>>;
}
