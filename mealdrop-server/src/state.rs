//! Application state

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::Config;
use crate::payment::{PaymentGateway, StripeGateway};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Payment provider adapter
    pub gateway: Arc<dyn PaymentGateway>,
    /// JWT secret for bearer-token authentication
    pub jwt_secret: String,
    /// Charge currency (ISO 4217 lowercase)
    pub currency: String,
    /// Unknown pending charges older than this are handed to the reconciler
    pub charge_timeout: Duration,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let charge_timeout = Duration::from_secs(config.charge_timeout_secs);
        let gateway = Arc::new(StripeGateway::new(
            config.stripe_secret_key.clone(),
            charge_timeout,
        ));

        Ok(Self {
            pool,
            gateway,
            jwt_secret: config.jwt_secret.clone(),
            currency: config.currency.clone(),
            charge_timeout,
        })
    }
}
