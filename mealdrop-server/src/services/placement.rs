//! Order placement workflow
//!
//! Placement is a small saga around the payment provider. The invariant
//! is money-safety: a captured charge must always end in either a
//! committed order or a refund, and an unresolved provider call is never
//! reported as a decline. Concretely:
//!
//! 1. validate the cart and price it against the catalog
//! 2. open a CHARGING row keyed by the client's idempotency key
//! 3. charge the card
//! 4. persist order + items in one transaction, then mark COMMITTED
//!
//! Every failure between 3 and 4 lands the pending row in a state the
//! reconciler knows how to finish; if even that bookkeeping write fails,
//! the row stays CHARGING and the reconciler's stall sweep picks it up.

use std::collections::HashMap;

use shared::error::{AppError, ErrorCode};
use shared::models::{CartLine, Meal};

use crate::db::orders::NewOrderItem;
use crate::db::pending_orders::{InsertOutcome, PendingOrder, PendingState};
use crate::db::OrderStore;
use crate::error::{ServiceError, ServiceResult};
use crate::payment::PaymentGateway;

/// Everything the client supplies to place an order
#[derive(Debug, serde::Deserialize)]
pub struct PlaceOrderRequest {
    pub restaurant_id: i64,
    pub address: String,
    pub payment_token: String,
    pub idempotency_key: String,
    pub items: Vec<CartLine>,
}

const MAX_QUANTITY: i32 = 100;

/// Structural cart checks that need no database
pub fn validate_cart(lines: &[CartLine]) -> Result<(), AppError> {
    if lines.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    for line in lines {
        if line.quantity <= 0 || line.quantity > MAX_QUANTITY {
            return Err(AppError::validation(format!(
                "quantity {} for meal {} out of range",
                line.quantity, line.meal_id
            )));
        }
    }
    Ok(())
}

/// A cart line resolved against the catalog
#[derive(Debug, PartialEq, Eq)]
pub struct PricedLine {
    pub meal_id: i64,
    pub quantity: i32,
    /// meal price * quantity, minor units
    pub subtotal: i64,
}

/// Price the cart with the catalog rows the db handed back.
///
/// Every meal must exist and belong to the ordered-from restaurant.
/// Arithmetic is checked; an overflowing total is a validation error,
/// never a wrapped amount.
pub fn price_cart(
    restaurant_id: i64,
    lines: &[CartLine],
    catalog: &[Meal],
) -> Result<(Vec<PricedLine>, i64), AppError> {
    let by_id: HashMap<i64, &Meal> = catalog.iter().map(|m| (m.id, m)).collect();

    let mut priced = Vec::with_capacity(lines.len());
    let mut total: i64 = 0;
    for line in lines {
        let meal = by_id
            .get(&line.meal_id)
            .ok_or_else(|| AppError::new(ErrorCode::MealNotFound))?;
        if meal.restaurant_id != restaurant_id {
            return Err(AppError::new(ErrorCode::MealWrongRestaurant)
                .with_detail("meal_id", line.meal_id.to_string()));
        }
        let subtotal = meal
            .price
            .checked_mul(i64::from(line.quantity))
            .ok_or_else(|| AppError::validation("cart total overflows"))?;
        total = total
            .checked_add(subtotal)
            .ok_or_else(|| AppError::validation("cart total overflows"))?;
        priced.push(PricedLine {
            meal_id: line.meal_id,
            quantity: line.quantity,
            subtotal,
        });
    }
    Ok((priced, total))
}

/// Map an already-recorded pending row onto a response for a replayed
/// request with the same idempotency key.
fn replay_outcome(pending: &PendingOrder) -> ServiceResult<i64> {
    match pending.state() {
        Some(PendingState::Committed) => match pending.order_id {
            Some(order_id) => Ok(order_id),
            None => Err(AppError::new(ErrorCode::OrderCommitFailed).into()),
        },
        Some(PendingState::Failed) => Err(AppError::new(ErrorCode::PaymentFailed).into()),
        Some(PendingState::Charging) | Some(PendingState::Unknown) => {
            Err(AppError::new(ErrorCode::DuplicatePaymentRequest).into())
        }
        _ => Err(AppError::new(ErrorCode::OrderCommitFailed).into()),
    }
}

/// Place an order for the authenticated customer. Returns the order id.
pub async fn place_order(
    store: &dyn OrderStore,
    gateway: &dyn PaymentGateway,
    currency: &str,
    user_id: i64,
    req: PlaceOrderRequest,
) -> ServiceResult<i64> {
    let customer = store
        .customer_by_user(user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CustomerNotFound))?;

    // A retried request replays its recorded outcome before any other
    // gate; a committed order would otherwise trip the active-order
    // check on an honest retry. The key is scoped to the customer.
    if let Some(pending) = store.pending_by_key(&req.idempotency_key).await? {
        if pending.customer_id != customer.id {
            return Err(AppError::new(ErrorCode::DuplicatePaymentRequest).into());
        }
        return replay_outcome(&pending);
    }

    if store.has_active_order(customer.id).await? {
        return Err(AppError::new(ErrorCode::ActiveOrderExists).into());
    }

    if req.address.trim().is_empty() {
        return Err(AppError::validation("delivery address is required").into());
    }

    if !store.restaurant_exists(req.restaurant_id).await? {
        return Err(AppError::new(ErrorCode::RestaurantNotFound).into());
    }

    validate_cart(&req.items)?;
    let meal_ids: Vec<i64> = req.items.iter().map(|l| l.meal_id).collect();
    let catalog = store.meals_by_ids(&meal_ids).await?;
    let (priced, total) = price_cart(req.restaurant_id, &req.items, &catalog)?;

    let pending_id = match store
        .insert_pending(
            &req.idempotency_key,
            customer.id,
            req.restaurant_id,
            &req.address,
            &req.items,
            total,
        )
        .await?
    {
        InsertOutcome::Inserted(id) => id,
        // Lost a race against a concurrent request with the same key.
        InsertOutcome::Duplicate => {
            let pending = store
                .pending_by_key(&req.idempotency_key)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::DuplicatePaymentRequest))?;
            if pending.customer_id != customer.id {
                return Err(AppError::new(ErrorCode::DuplicatePaymentRequest).into());
            }
            return replay_outcome(&pending);
        }
    };

    let outcome = gateway
        .charge(total, currency, &req.payment_token, &req.idempotency_key)
        .await;

    let charge_ref = match outcome {
        Ok(outcome) if outcome.succeeded => {
            match store.record_charge(pending_id, &outcome.reference).await {
                Ok(()) => outcome.reference,
                Err(e) => {
                    // Money captured but the reference write failed. Park
                    // the row for refund while the reference is in hand.
                    tracing::error!(
                        pending_id,
                        customer_id = customer.id,
                        amount = total,
                        charge_ref = %outcome.reference,
                        error = %e,
                        "captured charge could not be recorded, flagging for refund"
                    );
                    if let Err(e) = store.mark_needs_refund(pending_id, &outcome.reference).await
                    {
                        tracing::error!(
                            pending_id,
                            charge_ref = %outcome.reference,
                            error = %e,
                            "failed to flag captured charge for refund"
                        );
                    }
                    return Err(ServiceError::App(AppError::new(
                        ErrorCode::OrderCommitFailed,
                    )));
                }
            }
        }
        Ok(outcome) => {
            store.record_charge(pending_id, &outcome.reference).await?;
            store
                .set_pending_state(pending_id, PendingState::Failed)
                .await?;
            return Err(AppError::new(ErrorCode::PaymentFailed).into());
        }
        Err(e) => {
            // No provider answer. The charge may have landed, so this is
            // UNKNOWN, not a decline; the reconciler takes it from here.
            tracing::warn!(
                pending_id,
                error = %e,
                "charge outcome unresolved, deferring to reconciler"
            );
            store
                .set_pending_state(pending_id, PendingState::Unknown)
                .await?;
            return Err(AppError::new(ErrorCode::PaymentUnresolved).into());
        }
    };

    let items: Vec<NewOrderItem> = priced
        .into_iter()
        .map(|p| NewOrderItem {
            meal_id: p.meal_id,
            quantity: p.quantity,
            subtotal: p.subtotal,
        })
        .collect();

    match store
        .create_order(customer.id, req.restaurant_id, &req.address, total, &items)
        .await
    {
        Ok(order_id) => {
            store.mark_committed(pending_id, order_id).await?;
            Ok(order_id)
        }
        Err(e) => {
            // Money captured but no order row. Flag for refund; the row
            // must never be silently dropped.
            tracing::error!(
                pending_id,
                customer_id = customer.id,
                amount = total,
                charge_ref = %charge_ref,
                error = %e,
                "order commit failed after capture, charge needs refund"
            );
            if let Err(e) = store.mark_needs_refund(pending_id, &charge_ref).await {
                tracing::error!(
                    pending_id,
                    error = %e,
                    "failed to flag pending order for refund"
                );
            }
            Err(ServiceError::App(AppError::new(ErrorCode::OrderCommitFailed)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::payment::mock::MockGateway;
    use std::sync::atomic::Ordering;

    fn meal(id: i64, restaurant_id: i64, price: i64) -> Meal {
        Meal {
            id,
            restaurant_id,
            name: format!("meal-{id}"),
            description: String::new(),
            price,
            created_at: 0,
        }
    }

    fn line(meal_id: i64, quantity: i32) -> CartLine {
        CartLine { meal_id, quantity }
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_customer(1, 100);
        store.add_restaurant(10, 200);
        store.add_meal(5, 10, 450);
        store
    }

    fn request(key: &str) -> PlaceOrderRequest {
        PlaceOrderRequest {
            restaurant_id: 10,
            address: "1 Main St".into(),
            payment_token: "tok_visa".into(),
            idempotency_key: key.into(),
            items: vec![line(5, 2)],
        }
    }

    fn error_code(e: ServiceError) -> ErrorCode {
        AppError::from(e).code
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = validate_cart(&[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
    }

    #[test]
    fn test_zero_and_negative_quantities_rejected() {
        for q in [0, -1] {
            let err = validate_cart(&[line(1, q)]).unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationFailed);
        }
    }

    #[test]
    fn test_price_cart_sums_lines() {
        let catalog = vec![meal(1, 10, 450), meal(2, 10, 1200)];
        let (priced, total) = price_cart(10, &[line(1, 2), line(2, 1)], &catalog).unwrap();
        assert_eq!(total, 2100);
        assert_eq!(
            priced[0],
            PricedLine {
                meal_id: 1,
                quantity: 2,
                subtotal: 900
            }
        );
        assert_eq!(priced[1].subtotal, 1200);
    }

    #[test]
    fn test_price_cart_unknown_meal() {
        let catalog = vec![meal(1, 10, 450)];
        let err = price_cart(10, &[line(99, 1)], &catalog).unwrap_err();
        assert_eq!(err.code, ErrorCode::MealNotFound);
    }

    #[test]
    fn test_price_cart_meal_from_other_restaurant() {
        let catalog = vec![meal(1, 11, 450)];
        let err = price_cart(10, &[line(1, 1)], &catalog).unwrap_err();
        assert_eq!(err.code, ErrorCode::MealWrongRestaurant);
    }

    #[test]
    fn test_price_cart_overflow_is_an_error() {
        let catalog = vec![meal(1, 10, i64::MAX)];
        let err = price_cart(10, &[line(1, 2)], &catalog).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_successful_placement_commits_order() {
        let store = seeded_store();
        let gw = MockGateway::succeeding("ch_1");

        let order_id = place_order(&store, &gw, "eur", 100, request("k1"))
            .await
            .unwrap();

        assert_eq!(store.order_count(), 1);
        let pending = store.pending_by_key("k1").await.unwrap().unwrap();
        assert_eq!(pending.state(), Some(PendingState::Committed));
        assert_eq!(pending.order_id, Some(order_id));
        assert_eq!(pending.charge_ref.as_deref(), Some("ch_1"));

        let charges = gw.charges.lock().unwrap();
        assert_eq!(charges[0].0, 900);
    }

    #[tokio::test]
    async fn test_declined_charge_leaves_no_order() {
        let store = seeded_store();
        let gw = MockGateway::declining("ch_no");

        let err = place_order(&store, &gw, "eur", 100, request("k1"))
            .await
            .unwrap_err();

        assert_eq!(error_code(err), ErrorCode::PaymentFailed);
        assert_eq!(store.order_count(), 0);
        let pending = store.pending_by_key("k1").await.unwrap().unwrap();
        assert_eq!(pending.state(), Some(PendingState::Failed));
    }

    #[tokio::test]
    async fn test_timeout_is_unresolved_not_declined() {
        let store = seeded_store();
        let gw = MockGateway::timing_out();

        let err = place_order(&store, &gw, "eur", 100, request("k1"))
            .await
            .unwrap_err();

        assert_eq!(error_code(err), ErrorCode::PaymentUnresolved);
        assert_eq!(store.order_count(), 0);
        let pending = store.pending_by_key("k1").await.unwrap().unwrap();
        assert_eq!(pending.state(), Some(PendingState::Unknown));
    }

    #[tokio::test]
    async fn test_commit_failure_after_capture_flags_refund() {
        let store = seeded_store();
        store.fail_create_order.store(true, Ordering::SeqCst);
        let gw = MockGateway::succeeding("ch_1");

        let err = place_order(&store, &gw, "eur", 100, request("k1"))
            .await
            .unwrap_err();

        assert_eq!(error_code(err), ErrorCode::OrderCommitFailed);
        assert_eq!(store.order_count(), 0);
        let pending = store.pending_by_key("k1").await.unwrap().unwrap();
        assert_eq!(pending.state(), Some(PendingState::NeedsRefund));
        assert_eq!(pending.charge_ref.as_deref(), Some("ch_1"));
    }

    #[tokio::test]
    async fn test_unrecordable_charge_reference_flags_refund() {
        let store = seeded_store();
        store.fail_record_charge.store(true, Ordering::SeqCst);
        let gw = MockGateway::succeeding("ch_1");

        let err = place_order(&store, &gw, "eur", 100, request("k1"))
            .await
            .unwrap_err();

        // The captured reference must survive into the refund queue even
        // though the normal bookkeeping write failed.
        assert_eq!(error_code(err), ErrorCode::OrderCommitFailed);
        assert_eq!(store.order_count(), 0);
        let pending = store.pending_by_key("k1").await.unwrap().unwrap();
        assert_eq!(pending.state(), Some(PendingState::NeedsRefund));
        assert_eq!(pending.charge_ref.as_deref(), Some("ch_1"));
    }

    #[tokio::test]
    async fn test_retry_of_committed_order_does_not_recharge() {
        let store = seeded_store();
        let gw = MockGateway::succeeding("ch_1");

        let order_id = place_order(&store, &gw, "eur", 100, request("k1"))
            .await
            .unwrap();
        // The committed order is still active; the replay must win over
        // the active-order gate.
        let replayed = place_order(&store, &gw, "eur", 100, request("k1"))
            .await
            .unwrap();

        assert_eq!(replayed, order_id);
        assert_eq!(gw.charge_count(), 1);
        assert_eq!(store.order_count(), 1);
    }

    #[tokio::test]
    async fn test_retry_of_declined_charge_replays_failure() {
        let store = seeded_store();
        let gw = MockGateway::declining("ch_no");

        let _ = place_order(&store, &gw, "eur", 100, request("k1")).await;
        let err = place_order(&store, &gw, "eur", 100, request("k1"))
            .await
            .unwrap_err();

        assert_eq!(error_code(err), ErrorCode::PaymentFailed);
        assert_eq!(gw.charge_count(), 1);
    }

    #[tokio::test]
    async fn test_idempotency_key_scoped_to_customer() {
        let store = seeded_store();
        store.add_customer(2, 101);
        let gw = MockGateway::succeeding("ch_1");

        place_order(&store, &gw, "eur", 100, request("shared-key"))
            .await
            .unwrap();
        let err = place_order(&store, &gw, "eur", 101, request("shared-key"))
            .await
            .unwrap_err();

        assert_eq!(error_code(err), ErrorCode::DuplicatePaymentRequest);
        assert_eq!(gw.charge_count(), 1);
    }

    #[tokio::test]
    async fn test_second_active_order_rejected() {
        let store = seeded_store();
        let gw = MockGateway::new(vec![
            Ok(crate::payment::ChargeOutcome {
                succeeded: true,
                reference: "ch_1".into(),
            }),
            Ok(crate::payment::ChargeOutcome {
                succeeded: true,
                reference: "ch_2".into(),
            }),
        ]);

        place_order(&store, &gw, "eur", 100, request("k1"))
            .await
            .unwrap();
        let err = place_order(&store, &gw, "eur", 100, request("k2"))
            .await
            .unwrap_err();

        assert_eq!(error_code(err), ErrorCode::ActiveOrderExists);
        assert_eq!(gw.charge_count(), 1);
    }

    #[tokio::test]
    async fn test_replay_committed_returns_order_id() {
        let pending = pending_row(PendingState::Committed, Some(42));
        assert_eq!(replay_outcome(&pending).unwrap(), 42);
    }

    #[tokio::test]
    async fn test_replay_in_flight_is_duplicate() {
        for state in [PendingState::Charging, PendingState::Unknown] {
            let pending = pending_row(state, None);
            let err = replay_outcome(&pending).unwrap_err();
            assert_eq!(error_code(err), ErrorCode::DuplicatePaymentRequest);
        }
    }

    #[tokio::test]
    async fn test_replay_refund_states_are_commit_failures() {
        for state in [
            PendingState::NeedsRefund,
            PendingState::Refunded,
            PendingState::ManualReview,
        ] {
            let pending = pending_row(state, None);
            let err = replay_outcome(&pending).unwrap_err();
            assert_eq!(error_code(err), ErrorCode::OrderCommitFailed);
        }
    }

    fn pending_row(state: PendingState, order_id: Option<i64>) -> PendingOrder {
        PendingOrder {
            id: 1,
            idempotency_key: "k".into(),
            customer_id: 1,
            restaurant_id: 10,
            address: "addr".into(),
            cart: sqlx::types::Json(vec![]),
            total: 100,
            state: state.as_i16(),
            charge_ref: None,
            order_id,
            created_at: 0,
            updated_at: 0,
        }
    }
}
