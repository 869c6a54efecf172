//! Driver database operations

use shared::models::Driver;
use sqlx::PgPool;

use super::BoxError;

pub async fn find_by_user(pool: &PgPool, user_id: i64) -> Result<Option<Driver>, BoxError> {
    let row: Option<Driver> = sqlx::query_as(
        "SELECT id, user_id, name, lat, lng, created_at FROM drivers WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_driver(pool: &PgPool, id: i64) -> Result<Option<Driver>, BoxError> {
    let row: Option<Driver> = sqlx::query_as(
        "SELECT id, user_id, name, lat, lng, created_at FROM drivers WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Unconditional overwrite of the driver's last reported position
pub async fn update_location(
    pool: &PgPool,
    driver_id: i64,
    lat: f64,
    lng: f64,
) -> Result<(), BoxError> {
    sqlx::query("UPDATE drivers SET lat = $1, lng = $2 WHERE id = $3")
        .bind(lat)
        .bind(lng)
        .bind(driver_id)
        .execute(pool)
        .await?;
    Ok(())
}
