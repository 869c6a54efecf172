//! Customer database operations

use shared::models::Customer;
use sqlx::PgPool;

use super::BoxError;

pub async fn find_by_user(pool: &PgPool, user_id: i64) -> Result<Option<Customer>, BoxError> {
    let row: Option<Customer> = sqlx::query_as(
        "SELECT id, user_id, name, created_at FROM customers WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
