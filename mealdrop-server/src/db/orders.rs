//! Order database operations
//!
//! Status changes that race (driver claim, restaurant ready, delivery
//! completion) are single compare-and-swap UPDATEs; `rows_affected == 0`
//! means someone else won or the precondition no longer holds.

use shared::models::{Order, OrderItem, OrderStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::BoxError;

/// Line ready for insertion, already priced against the catalog
pub struct NewOrderItem {
    pub meal_id: i64,
    pub quantity: i32,
    /// meal price * quantity at order time, minor units
    pub subtotal: i64,
}

/// True if the customer has an order that is not yet DELIVERED
pub async fn has_active_order(pool: &PgPool, customer_id: i64) -> Result<bool, BoxError> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM orders WHERE customer_id = $1 AND status <> $2)",
    )
    .bind(customer_id)
    .bind(OrderStatus::Delivered.as_i16())
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Insert the order and all of its items in one transaction.
///
/// Items go in as a single UNNEST batch so a partially written order can
/// never be observed.
pub async fn create_order_with_items(
    pool: &PgPool,
    customer_id: i64,
    restaurant_id: i64,
    address: &str,
    total: i64,
    items: &[NewOrderItem],
) -> Result<i64, BoxError> {
    let order_id = snowflake_id();
    let now = now_millis();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO orders (id, customer_id, restaurant_id, driver_id, address, total, status, created_at, picked_at)
        VALUES ($1, $2, $3, NULL, $4, $5, $6, $7, NULL)
        "#,
    )
    .bind(order_id)
    .bind(customer_id)
    .bind(restaurant_id)
    .bind(address)
    .bind(total)
    .bind(OrderStatus::Cooking.as_i16())
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let ids: Vec<i64> = items.iter().map(|_| snowflake_id()).collect();
    let meal_ids: Vec<i64> = items.iter().map(|i| i.meal_id).collect();
    let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
    let subtotals: Vec<i64> = items.iter().map(|i| i.subtotal).collect();

    sqlx::query(
        r#"
        INSERT INTO order_items (id, order_id, meal_id, quantity, subtotal)
        SELECT t.id, $1, t.meal_id, t.quantity, t.subtotal
        FROM UNNEST($2::bigint[], $3::bigint[], $4::int[], $5::bigint[])
            AS t(id, meal_id, quantity, subtotal)
        "#,
    )
    .bind(order_id)
    .bind(&ids)
    .bind(&meal_ids)
    .bind(&quantities)
    .bind(&subtotals)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(order_id)
}

pub async fn find_order(pool: &PgPool, id: i64) -> Result<Option<Order>, BoxError> {
    let row: Option<Order> = sqlx::query_as(
        r#"
        SELECT id, customer_id, restaurant_id, driver_id, address, total, status, created_at, picked_at
        FROM orders WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn items_for_order(pool: &PgPool, order_id: i64) -> Result<Vec<OrderItem>, BoxError> {
    let rows: Vec<OrderItem> = sqlx::query_as(
        r#"
        SELECT id, order_id, meal_id, quantity, subtotal
        FROM order_items WHERE order_id = $1 ORDER BY id
        "#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Most recent order for a customer, regardless of status
pub async fn latest_for_customer(
    pool: &PgPool,
    customer_id: i64,
) -> Result<Option<Order>, BoxError> {
    let row: Option<Order> = sqlx::query_as(
        r#"
        SELECT id, customer_id, restaurant_id, driver_id, address, total, status, created_at, picked_at
        FROM orders WHERE customer_id = $1 ORDER BY id DESC LIMIT 1
        "#,
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// The customer's order currently out for delivery, if any
pub async fn on_the_way_for_customer(
    pool: &PgPool,
    customer_id: i64,
) -> Result<Option<Order>, BoxError> {
    let row: Option<Order> = sqlx::query_as(
        r#"
        SELECT id, customer_id, restaurant_id, driver_id, address, total, status, created_at, picked_at
        FROM orders WHERE customer_id = $1 AND status = $2 ORDER BY id DESC LIMIT 1
        "#,
    )
    .bind(customer_id)
    .bind(OrderStatus::OnTheWay.as_i16())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// READY orders with no driver yet, newest first
pub async fn list_ready_unassigned(pool: &PgPool) -> Result<Vec<Order>, BoxError> {
    let rows: Vec<Order> = sqlx::query_as(
        r#"
        SELECT id, customer_id, restaurant_id, driver_id, address, total, status, created_at, picked_at
        FROM orders WHERE status = $1 AND driver_id IS NULL ORDER BY id DESC
        "#,
    )
    .bind(OrderStatus::Ready.as_i16())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// How many orders the restaurant received after `since`
pub async fn count_created_since(
    pool: &PgPool,
    restaurant_id: i64,
    since: i64,
) -> Result<i64, BoxError> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM orders WHERE restaurant_id = $1 AND created_at > $2",
    )
    .bind(restaurant_id)
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// COOKING -> READY, guarded so a restaurant can only flip its own orders.
/// Returns false when the order is missing, foreign, or already past COOKING.
pub async fn mark_ready(pool: &PgPool, order_id: i64, restaurant_id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query(
        "UPDATE orders SET status = $1 WHERE id = $2 AND restaurant_id = $3 AND status = $4",
    )
    .bind(OrderStatus::Ready.as_i16())
    .bind(order_id)
    .bind(restaurant_id)
    .bind(OrderStatus::Cooking.as_i16())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Atomic claim: assigns the driver and moves READY -> ON_THE_WAY in one
/// statement. The NOT EXISTS guard also enforces one active delivery
/// per driver, so two concurrent picks by the same driver cannot both
/// win. Returns false when any precondition fails.
pub async fn claim_order(
    pool: &PgPool,
    order_id: i64,
    driver_id: i64,
    picked_at: i64,
) -> Result<bool, BoxError> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET driver_id = $1, status = $2, picked_at = $3
        WHERE id = $4 AND driver_id IS NULL AND status = $5
          AND NOT EXISTS (
              SELECT 1 FROM orders busy WHERE busy.driver_id = $1 AND busy.status = $2
          )
        "#,
    )
    .bind(driver_id)
    .bind(OrderStatus::OnTheWay.as_i16())
    .bind(picked_at)
    .bind(order_id)
    .bind(OrderStatus::Ready.as_i16())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// True if the driver already has an undelivered pickup
pub async fn driver_has_on_the_way(pool: &PgPool, driver_id: i64) -> Result<bool, BoxError> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM orders WHERE driver_id = $1 AND status = $2)",
    )
    .bind(driver_id)
    .bind(OrderStatus::OnTheWay.as_i16())
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// ON_THE_WAY -> DELIVERED, only by the assigned driver
pub async fn complete_order(pool: &PgPool, order_id: i64, driver_id: i64) -> Result<bool, BoxError> {
    let result = sqlx::query(
        "UPDATE orders SET status = $1 WHERE id = $2 AND driver_id = $3 AND status = $4",
    )
    .bind(OrderStatus::Delivered.as_i16())
    .bind(order_id)
    .bind(driver_id)
    .bind(OrderStatus::OnTheWay.as_i16())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Most recent order this driver has picked up
pub async fn latest_for_driver(pool: &PgPool, driver_id: i64) -> Result<Option<Order>, BoxError> {
    let row: Option<Order> = sqlx::query_as(
        r#"
        SELECT id, customer_id, restaurant_id, driver_id, address, total, status, created_at, picked_at
        FROM orders WHERE driver_id = $1 ORDER BY picked_at DESC NULLS LAST LIMIT 1
        "#,
    )
    .bind(driver_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// (created_at, total) for this driver's DELIVERED orders inside a window
pub async fn delivered_in_window(
    pool: &PgPool,
    driver_id: i64,
    start: i64,
    end: i64,
) -> Result<Vec<(i64, i64)>, BoxError> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT created_at, total FROM orders
        WHERE driver_id = $1 AND status = $2 AND created_at >= $3 AND created_at < $4
        "#,
    )
    .bind(driver_id)
    .bind(OrderStatus::Delivered.as_i16())
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
