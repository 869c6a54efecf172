//! Meal database operations

use shared::models::Meal;
use sqlx::PgPool;

use super::BoxError;

/// Newest-first meals for one restaurant
pub async fn list_meals(pool: &PgPool, restaurant_id: i64) -> Result<Vec<Meal>, BoxError> {
    let rows: Vec<Meal> = sqlx::query_as(
        r#"
        SELECT id, restaurant_id, name, description, price, created_at
        FROM meals
        WHERE restaurant_id = $1
        ORDER BY id DESC
        "#,
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch the meals referenced by a cart in one round trip.
///
/// Missing ids are simply absent from the result; the caller decides
/// what that means.
pub async fn find_meals(pool: &PgPool, ids: &[i64]) -> Result<Vec<Meal>, BoxError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let rows: Vec<Meal> = sqlx::query_as(
        r#"
        SELECT id, restaurant_id, name, description, price, created_at
        FROM meals
        WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
