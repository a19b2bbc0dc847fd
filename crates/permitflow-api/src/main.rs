mod routes;
mod state;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use routes::{get_baseline, list_baselines, sequence_timeline};
use state::AppState;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let port: u16 = std::env::var("PERMITFLOW_PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3000);

    let app_state = AppState::new(&database_url).await?;

    let router = Router::new()
        .route("/baselines", get(list_baselines))
        .route("/baselines/{station}", get(get_baseline))
        .route("/permits/{instance_id}/timeline", get(sequence_timeline))
        .with_state(app_state);

    let listener = TcpListener::bind((std::net::Ipv4Addr::UNSPECIFIED, port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}
