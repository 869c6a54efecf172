//! Database access layer
//!
//! Plain sqlx queries against PostgreSQL, one module per entity.
//! Functions take a `&PgPool` and return `BoxError`; translation to
//! `AppError` happens at the service/API layer.
//!
//! The placement/reconciliation workflows go through the [`OrderStore`]
//! trait rather than the pool directly, so their failure paths can be
//! driven with an in-memory store under test.

use async_trait::async_trait;
use shared::models::{CartLine, Customer, Meal};
use sqlx::PgPool;

pub mod customers;
pub mod drivers;
pub mod meals;
pub mod orders;
pub mod pending_orders;
pub mod restaurants;

use orders::NewOrderItem;
use pending_orders::{InsertOutcome, PendingOrder, PendingState};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Storage seam for the payment saga and its reconciler.
///
/// Production uses the [`PgPool`] implementation; tests use
/// [`memory::MemoryStore`] with injectable write failures.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn customer_by_user(&self, user_id: i64) -> Result<Option<Customer>, BoxError>;
    async fn has_active_order(&self, customer_id: i64) -> Result<bool, BoxError>;
    async fn restaurant_exists(&self, id: i64) -> Result<bool, BoxError>;
    async fn meals_by_ids(&self, ids: &[i64]) -> Result<Vec<Meal>, BoxError>;

    #[allow(clippy::too_many_arguments)]
    async fn insert_pending(
        &self,
        idempotency_key: &str,
        customer_id: i64,
        restaurant_id: i64,
        address: &str,
        cart: &[CartLine],
        total: i64,
    ) -> Result<InsertOutcome, BoxError>;
    async fn pending_by_key(&self, idempotency_key: &str)
        -> Result<Option<PendingOrder>, BoxError>;
    async fn record_charge(&self, id: i64, charge_ref: &str) -> Result<(), BoxError>;
    async fn set_pending_state(&self, id: i64, state: PendingState) -> Result<(), BoxError>;
    async fn mark_needs_refund(&self, id: i64, charge_ref: &str) -> Result<(), BoxError>;
    async fn mark_committed(&self, id: i64, order_id: i64) -> Result<(), BoxError>;
    async fn age_out_stalled(&self, older_than: i64) -> Result<u64, BoxError>;
    async fn pending_needing_refund(&self, limit: i64) -> Result<Vec<PendingOrder>, BoxError>;

    async fn create_order(
        &self,
        customer_id: i64,
        restaurant_id: i64,
        address: &str,
        total: i64,
        items: &[NewOrderItem],
    ) -> Result<i64, BoxError>;
}

#[async_trait]
impl OrderStore for PgPool {
    async fn customer_by_user(&self, user_id: i64) -> Result<Option<Customer>, BoxError> {
        customers::find_by_user(self, user_id).await
    }

    async fn has_active_order(&self, customer_id: i64) -> Result<bool, BoxError> {
        orders::has_active_order(self, customer_id).await
    }

    async fn restaurant_exists(&self, id: i64) -> Result<bool, BoxError> {
        Ok(restaurants::find_restaurant(self, id).await?.is_some())
    }

    async fn meals_by_ids(&self, ids: &[i64]) -> Result<Vec<Meal>, BoxError> {
        meals::find_meals(self, ids).await
    }

    async fn insert_pending(
        &self,
        idempotency_key: &str,
        customer_id: i64,
        restaurant_id: i64,
        address: &str,
        cart: &[CartLine],
        total: i64,
    ) -> Result<InsertOutcome, BoxError> {
        pending_orders::insert_pending(
            self,
            idempotency_key,
            customer_id,
            restaurant_id,
            address,
            cart,
            total,
        )
        .await
    }

    async fn pending_by_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<PendingOrder>, BoxError> {
        pending_orders::find_by_key(self, idempotency_key).await
    }

    async fn record_charge(&self, id: i64, charge_ref: &str) -> Result<(), BoxError> {
        pending_orders::record_charge(self, id, charge_ref).await
    }

    async fn set_pending_state(&self, id: i64, state: PendingState) -> Result<(), BoxError> {
        pending_orders::set_state(self, id, state).await
    }

    async fn mark_needs_refund(&self, id: i64, charge_ref: &str) -> Result<(), BoxError> {
        pending_orders::mark_needs_refund(self, id, charge_ref).await
    }

    async fn mark_committed(&self, id: i64, order_id: i64) -> Result<(), BoxError> {
        pending_orders::mark_committed(self, id, order_id).await
    }

    async fn age_out_stalled(&self, older_than: i64) -> Result<u64, BoxError> {
        pending_orders::age_out_stalled(self, older_than).await
    }

    async fn pending_needing_refund(&self, limit: i64) -> Result<Vec<PendingOrder>, BoxError> {
        pending_orders::list_needing_refund(self, limit).await
    }

    async fn create_order(
        &self,
        customer_id: i64,
        restaurant_id: i64,
        address: &str,
        total: i64,
        items: &[NewOrderItem],
    ) -> Result<i64, BoxError> {
        orders::create_order_with_items(self, customer_id, restaurant_id, address, total, items)
            .await
    }
}
