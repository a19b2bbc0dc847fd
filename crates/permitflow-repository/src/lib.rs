//! Postgres backend for the baseline store and the external routing log.
//!
//! The routing log table (`routing_events`) is owned by the upstream open-data
//! loader and read-only here; only `station_baselines` is written, and only by
//! `refresh()`.

use async_trait::async_trait;
use chrono::NaiveDate;
use permitflow_core::error::{EngineError, Result as EngineResult};
use permitflow_core::store::{BaselineStore, RoutingLog};
use permitflow_core::types::{MetricType, RoutingEvent, StationBaseline};
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] MigrateError),
}

fn store_err(err: sqlx::Error) -> EngineError {
    EngineError::Store(Box::new(err))
}

fn log_err(err: sqlx::Error) -> EngineError {
    EngineError::Log(Box::new(err))
}

pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, RepositoryError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Clone)]
pub struct PostgresBaselineStore {
    pool: PgPool,
}

impl PostgresBaselineStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

const BASELINE_COLUMNS: &str = "station, metric_type, period, p25_days, p50_days, p75_days, p90_days, sample_count, computed_at";

fn row_to_baseline(row: &sqlx::postgres::PgRow) -> EngineResult<StationBaseline> {
    let metric_str: String = row.try_get("metric_type").map_err(store_err)?;
    Ok(StationBaseline {
        station: row.try_get("station").map_err(store_err)?,
        metric_type: MetricType::parse(&metric_str)?,
        period: row.try_get("period").map_err(store_err)?,
        p25_days: row.try_get("p25_days").map_err(store_err)?,
        p50_days: row.try_get("p50_days").map_err(store_err)?,
        p75_days: row.try_get("p75_days").map_err(store_err)?,
        p90_days: row.try_get("p90_days").map_err(store_err)?,
        sample_count: row.try_get("sample_count").map_err(store_err)?,
        computed_at: row.try_get("computed_at").map_err(store_err)?,
    })
}

#[async_trait]
impl BaselineStore for PostgresBaselineStore {
    async fn ensure_schema(&self) -> EngineResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS station_baselines (
                station TEXT NOT NULL,
                metric_type TEXT NOT NULL,
                period TEXT NOT NULL,
                p25_days DOUBLE PRECISION,
                p50_days DOUBLE PRECISION,
                p75_days DOUBLE PRECISION,
                p90_days DOUBLE PRECISION,
                sample_count BIGINT NOT NULL,
                computed_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (station, metric_type, period)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn truncate(&self) -> EngineResult<()> {
        sqlx::query("TRUNCATE TABLE station_baselines")
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn insert(&self, rows: &[StationBaseline]) -> EngineResult<()> {
        // One transaction per combination: rows land all-or-nothing, a reader
        // never sees a half-written combination.
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO station_baselines (
                    station, metric_type, period,
                    p25_days, p50_days, p75_days, p90_days,
                    sample_count, computed_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(&row.station)
            .bind(row.metric_type.as_str())
            .bind(&row.period)
            .bind(row.p25_days)
            .bind(row.p50_days)
            .bind(row.p75_days)
            .bind(row.p90_days)
            .bind(row.sample_count)
            .bind(row.computed_at)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }
        tx.commit().await.map_err(store_err)?;
        Ok(())
    }

    async fn get(
        &self,
        station: &str,
        metric_type: MetricType,
        period: &str,
    ) -> EngineResult<Option<StationBaseline>> {
        let row = sqlx::query(&format!(
            "SELECT {BASELINE_COLUMNS} FROM station_baselines \
             WHERE station = $1 AND metric_type = $2 AND period = $3"
        ))
        .bind(station)
        .bind(metric_type.as_str())
        .bind(period)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.as_ref().map(row_to_baseline).transpose()
    }

    async fn list(
        &self,
        period: &str,
        metric_type: Option<MetricType>,
    ) -> EngineResult<Vec<StationBaseline>> {
        let rows = match metric_type {
            Some(metric) => {
                sqlx::query(&format!(
                    "SELECT {BASELINE_COLUMNS} FROM station_baselines \
                     WHERE period = $1 AND metric_type = $2"
                ))
                .bind(period)
                .bind(metric.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {BASELINE_COLUMNS} FROM station_baselines WHERE period = $1"
                ))
                .bind(period)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(store_err)?;

        rows.iter().map(row_to_baseline).collect()
    }
}

#[derive(Clone)]
pub struct PostgresRoutingLog {
    pool: PgPool,
}

impl PostgresRoutingLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const EVENT_COLUMNS: &str = "instance_id, station, cycle_number, arrive_date, finish_date, reviewer_id, result_code, department";

fn row_to_event(row: &sqlx::postgres::PgRow) -> EngineResult<RoutingEvent> {
    Ok(RoutingEvent {
        instance_id: row.try_get("instance_id").map_err(log_err)?,
        station: row.try_get("station").map_err(log_err)?,
        cycle_number: row.try_get("cycle_number").map_err(log_err)?,
        arrive: row.try_get("arrive_date").map_err(log_err)?,
        finish: row.try_get("finish_date").map_err(log_err)?,
        reviewer_id: row.try_get("reviewer_id").map_err(log_err)?,
        result_code: row.try_get("result_code").map_err(log_err)?,
        department: row.try_get("department").map_err(log_err)?,
    })
}

#[async_trait]
impl RoutingLog for PostgresRoutingLog {
    async fn events_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<RoutingEvent>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM routing_events \
             WHERE finish_date >= $1 AND finish_date <= $2"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(log_err)?;

        rows.iter().map(row_to_event).collect()
    }

    async fn events_for_instance(&self, instance_id: &str) -> EngineResult<Vec<RoutingEvent>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM routing_events \
             WHERE instance_id = $1 ORDER BY arrive_date, cycle_number"
        ))
        .bind(instance_id)
        .fetch_all(&self.pool)
        .await
        .map_err(log_err)?;

        rows.iter().map(row_to_event).collect()
    }
}
