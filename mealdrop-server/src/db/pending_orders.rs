//! Payment ledger for the place-order saga
//!
//! Every placement writes a pending row before the card is touched, so a
//! crash at any point leaves a record of what was attempted. State moves
//! forward only; the reconciler sweeps rows stuck in UNKNOWN.

use serde::{Deserialize, Serialize};
use shared::models::CartLine;
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::BoxError;

/// Lifecycle of a payment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum PendingState {
    /// Row written, gateway call in flight
    Charging = 1,
    /// Gateway declined; no money moved
    Failed = 2,
    /// Charge captured and order persisted
    Committed = 3,
    /// Charge captured but the order never landed; refund owed
    NeedsRefund = 4,
    /// Gateway call timed out or errored; outcome unresolved
    Unknown = 5,
    /// Refund issued
    Refunded = 6,
    /// Automation gave up; an operator must look
    ManualReview = 7,
}

impl PendingState {
    pub fn as_i16(self) -> i16 {
        self as i16
    }
}

impl TryFrom<i16> for PendingState {
    type Error = i16;

    fn try_from(v: i16) -> Result<Self, i16> {
        match v {
            1 => Ok(Self::Charging),
            2 => Ok(Self::Failed),
            3 => Ok(Self::Committed),
            4 => Ok(Self::NeedsRefund),
            5 => Ok(Self::Unknown),
            6 => Ok(Self::Refunded),
            7 => Ok(Self::ManualReview),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingOrder {
    pub id: i64,
    pub idempotency_key: String,
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub address: String,
    pub cart: sqlx::types::Json<Vec<CartLine>>,
    pub total: i64,
    pub state: i16,
    pub charge_ref: Option<String>,
    pub order_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PendingOrder {
    pub fn state(&self) -> Option<PendingState> {
        PendingState::try_from(self.state).ok()
    }
}

/// Outcome of trying to open a new pending row
pub enum InsertOutcome {
    /// Fresh row, id of the new record
    Inserted(i64),
    /// A row with this idempotency key already exists
    Duplicate,
}

/// Open a CHARGING row. A unique violation on the idempotency key is not
/// an error; the caller re-fetches and replays the recorded outcome.
pub async fn insert_pending(
    pool: &PgPool,
    idempotency_key: &str,
    customer_id: i64,
    restaurant_id: i64,
    address: &str,
    cart: &[CartLine],
    total: i64,
) -> Result<InsertOutcome, BoxError> {
    let id = snowflake_id();
    let now = now_millis();
    let result = sqlx::query(
        r#"
        INSERT INTO pending_orders
            (id, idempotency_key, customer_id, restaurant_id, address, cart, total, state, charge_ref, order_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULL, NULL, $9, $9)
        "#,
    )
    .bind(id)
    .bind(idempotency_key)
    .bind(customer_id)
    .bind(restaurant_id)
    .bind(address)
    .bind(sqlx::types::Json(cart))
    .bind(total)
    .bind(PendingState::Charging.as_i16())
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(InsertOutcome::Inserted(id)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(InsertOutcome::Duplicate),
        Err(e) => Err(e.into()),
    }
}

pub async fn find_by_key(
    pool: &PgPool,
    idempotency_key: &str,
) -> Result<Option<PendingOrder>, BoxError> {
    let row: Option<PendingOrder> = sqlx::query_as(
        r#"
        SELECT id, idempotency_key, customer_id, restaurant_id, address, cart, total,
               state, charge_ref, order_id, created_at, updated_at
        FROM pending_orders WHERE idempotency_key = $1
        "#,
    )
    .bind(idempotency_key)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn set_state(pool: &PgPool, id: i64, state: PendingState) -> Result<(), BoxError> {
    sqlx::query("UPDATE pending_orders SET state = $1, updated_at = $2 WHERE id = $3")
        .bind(state.as_i16())
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn record_charge(pool: &PgPool, id: i64, charge_ref: &str) -> Result<(), BoxError> {
    sqlx::query("UPDATE pending_orders SET charge_ref = $1, updated_at = $2 WHERE id = $3")
        .bind(charge_ref)
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn mark_committed(pool: &PgPool, id: i64, order_id: i64) -> Result<(), BoxError> {
    sqlx::query(
        "UPDATE pending_orders SET state = $1, order_id = $2, updated_at = $3 WHERE id = $4",
    )
    .bind(PendingState::Committed.as_i16())
    .bind(order_id)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Record the charge reference and park the row for refund in one
/// statement, for paths where the reference is in hand but the normal
/// bookkeeping failed.
pub async fn mark_needs_refund(pool: &PgPool, id: i64, charge_ref: &str) -> Result<(), BoxError> {
    sqlx::query(
        "UPDATE pending_orders SET state = $1, charge_ref = $2, updated_at = $3 WHERE id = $4",
    )
    .bind(PendingState::NeedsRefund.as_i16())
    .bind(charge_ref)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// CHARGING and UNKNOWN rows older than the cutoff become NEEDS_REFUND;
/// their outcome can no longer resolve on its own. A stale CHARGING row
/// means the process died or lost the db mid-saga, so money may have
/// moved. Returns how many rows flipped.
pub async fn age_out_stalled(pool: &PgPool, older_than: i64) -> Result<u64, BoxError> {
    let result = sqlx::query(
        r#"
        UPDATE pending_orders SET state = $1, updated_at = $2
        WHERE state IN ($3, $4) AND updated_at < $5
        "#,
    )
    .bind(PendingState::NeedsRefund.as_i16())
    .bind(now_millis())
    .bind(PendingState::Charging.as_i16())
    .bind(PendingState::Unknown.as_i16())
    .bind(older_than)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_needing_refund(pool: &PgPool, limit: i64) -> Result<Vec<PendingOrder>, BoxError> {
    let rows: Vec<PendingOrder> = sqlx::query_as(
        r#"
        SELECT id, idempotency_key, customer_id, restaurant_id, address, cart, total,
               state, charge_ref, order_id, created_at, updated_at
        FROM pending_orders WHERE state = $1 ORDER BY updated_at LIMIT $2
        "#,
    )
    .bind(PendingState::NeedsRefund.as_i16())
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
