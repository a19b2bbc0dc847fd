use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use permitflow_core::error::EngineError;
use permitflow_core::types::{MetricType, Period, SequenceEstimate, StationBaseline};

use crate::state::AppState;

type ApiError = (StatusCode, Json<Value>);

fn bad_request(err: EngineError) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": err.to_string() })))
}

fn internal(err: EngineError) -> ApiError {
    tracing::error!(error = %err, "engine failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal error" })),
    )
}

fn default_period() -> String {
    "current".to_string()
}

fn default_metric() -> String {
    "initial".to_string()
}

#[derive(Debug, Deserialize)]
pub struct BaselineQuery {
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default = "default_period")]
    pub period: String,
}

pub async fn get_baseline(
    State(state): State<Arc<AppState>>,
    Path(station): Path<String>,
    Query(query): Query<BaselineQuery>,
) -> Result<Json<StationBaseline>, ApiError> {
    let metric = MetricType::parse(&query.metric).map_err(bad_request)?;
    let period = Period::parse(&query.period).map_err(bad_request)?;

    let baseline = state
        .resolver
        .get_baseline(&station, metric, period)
        .await
        .map_err(internal)?;

    baseline.map(Json).ok_or((
        StatusCode::NOT_FOUND,
        Json(json!({ "status": "no_baseline" })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_period")]
    pub period: String,
    pub metric: Option<String>,
}

pub async fn list_baselines(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<StationBaseline>>, ApiError> {
    let period = Period::parse(&query.period).map_err(bad_request)?;
    let metric = query
        .metric
        .as_deref()
        .map(MetricType::parse)
        .transpose()
        .map_err(bad_request)?;

    state
        .resolver
        .list_baselines(period, metric)
        .await
        .map(Json)
        .map_err(internal)
}

pub async fn sequence_timeline(
    State(state): State<Arc<AppState>>,
    Path(instance_id): Path<String>,
) -> Result<Json<SequenceEstimate>, ApiError> {
    let estimate = state
        .estimator
        .estimate_sequence_timeline(&instance_id)
        .await
        .map_err(internal)?;

    estimate.map(Json).ok_or((
        StatusCode::NOT_FOUND,
        Json(json!({ "status": "no_routing_history" })),
    ))
}
