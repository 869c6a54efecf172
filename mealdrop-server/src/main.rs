//! mealdrop-server — food delivery backend
//!
//! Long-running service that:
//! - Serves the public restaurant/meal catalog
//! - Places customer orders through a charge-then-commit payment saga
//! - Coordinates restaurant readiness and driver claims on orders
//! - Tracks driver location and weekly revenue
//! - Reconciles unresolved or uncommitted charges in the background

mod api;
mod auth;
mod config;
mod db;
mod error;
mod payment;
mod services;
mod state;

use std::time::Duration;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mealdrop_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting mealdrop-server (env: {})", config.environment);

    let state = AppState::new(&config).await?;

    services::reconcile::spawn(
        state.clone(),
        Duration::from_secs(config.reconcile_interval_secs),
    );

    let app = api::create_router(state);

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("mealdrop-server HTTP listening on {http_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
