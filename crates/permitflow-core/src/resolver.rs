use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::Result;
use crate::store::BaselineStore;
use crate::types::{MetricType, Period, StationBaseline};

/// Read path over the baseline store. Lookup fallback policy lives here, not
/// in the store backends, so every backend behaves identically.
#[derive(Clone)]
pub struct BaselineResolver {
    store: Arc<dyn BaselineStore>,
}

impl BaselineResolver {
    pub fn new(store: Arc<dyn BaselineStore>) -> Self {
        Self { store }
    }

    /// Point lookup with a single-level fallback: when the requested period
    /// has no row, the all-time window is tried once. Absence after the
    /// fallback is an ordinary None, not an error.
    pub async fn get_baseline(
        &self,
        station: &str,
        metric_type: MetricType,
        period: Period,
    ) -> Result<Option<StationBaseline>> {
        if let Some(row) = self.store.get(station, metric_type, &period.label()).await? {
            return Ok(Some(row));
        }
        if period == Period::All {
            return Ok(None);
        }
        self.store
            .get(station, metric_type, &Period::All.label())
            .await
    }

    /// Bulk listing for ranking/dashboard use, sorted by median turnaround
    /// descending with null medians last. Sorted here so ordering stays
    /// backend-neutral.
    pub async fn list_baselines(
        &self,
        period: Period,
        metric_type: Option<MetricType>,
    ) -> Result<Vec<StationBaseline>> {
        let mut rows = self.store.list(&period.label(), metric_type).await?;
        rows.sort_by(|a, b| match (a.p50_days, b.p50_days) {
            (Some(left), Some(right)) => right.total_cmp(&left),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.station.cmp(&b.station),
        });
        Ok(rows)
    }
}
