//! Restaurant database operations

use shared::models::Restaurant;
use sqlx::PgPool;

use super::BoxError;

/// Default page size for the restaurant listing
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

/// Newest-first restaurant page, keyset-paginated on id.
pub async fn list_restaurants(
    pool: &PgPool,
    before_id: Option<i64>,
    limit: Option<i64>,
) -> Result<Vec<Restaurant>, BoxError> {
    let limit = limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let rows: Vec<Restaurant> = sqlx::query_as(
        r#"
        SELECT id, user_id, name, phone, address, created_at
        FROM restaurants
        WHERE ($1::bigint IS NULL OR id < $1)
        ORDER BY id DESC
        LIMIT $2
        "#,
    )
    .bind(before_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_restaurant(pool: &PgPool, id: i64) -> Result<Option<Restaurant>, BoxError> {
    let row: Option<Restaurant> = sqlx::query_as(
        "SELECT id, user_id, name, phone, address, created_at FROM restaurants WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_user(pool: &PgPool, user_id: i64) -> Result<Option<Restaurant>, BoxError> {
    let row: Option<Restaurant> = sqlx::query_as(
        "SELECT id, user_id, name, phone, address, created_at FROM restaurants WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
