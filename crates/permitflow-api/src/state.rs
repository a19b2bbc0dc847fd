use std::sync::Arc;

use permitflow_core::estimator::SequenceEstimator;
use permitflow_core::resolver::BaselineResolver;
use permitflow_repository::{connect, run_migrations, PostgresBaselineStore, PostgresRoutingLog};

/// Read-only handles shared by every request. Lookups and sequence estimates
/// are side-effect-free, so no locking is needed; a refresh running in the
/// background may transiently empty the table, which callers must treat as
/// "retry", not "no history".
pub struct AppState {
    pub resolver: BaselineResolver,
    pub estimator: SequenceEstimator,
}

impl AppState {
    pub async fn new(database_url: &str) -> anyhow::Result<Arc<Self>> {
        let pool = connect(database_url, 5).await?;
        run_migrations(&pool).await?;

        let store = Arc::new(PostgresBaselineStore::new(pool.clone()));
        let log = Arc::new(PostgresRoutingLog::new(pool));

        let resolver = BaselineResolver::new(store);
        let estimator = SequenceEstimator::new(log, resolver.clone());

        Ok(Arc::new(Self { resolver, estimator }))
    }
}
