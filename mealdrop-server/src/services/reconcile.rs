//! Background payment reconciler
//!
//! Finishes what the placement saga could not. CHARGING rows whose
//! process died mid-saga and UNKNOWN rows whose provider call never
//! resolved age into NEEDS_REFUND once they are older than the charge
//! timeout; NEEDS_REFUND rows with a charge reference are refunded.
//! Rows that can never be auto-resolved are parked in MANUAL_REVIEW
//! for an operator.

use std::time::Duration;

use shared::util::now_millis;

use crate::db::pending_orders::PendingState;
use crate::db::{BoxError, OrderStore};
use crate::payment::PaymentGateway;
use crate::state::AppState;

/// How long a CHARGING or UNKNOWN row may wait for a late outcome
/// before the refund path takes over
const STALL_GRACE: Duration = Duration::from_secs(300);

const REFUND_BATCH: i64 = 50;

/// Spawn the periodic reconciliation loop
pub fn spawn(state: AppState, interval: Duration) {
    // A row younger than the charge timeout may still be legitimately
    // in flight.
    let grace = STALL_GRACE.max(state.charge_timeout);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = run_once(&state.pool, state.gateway.as_ref(), grace).await {
                tracing::error!(error = %e, "payment reconciliation pass failed");
            }
        }
    });
}

/// One reconciliation pass. Separated from the loop so it can be driven
/// directly.
pub async fn run_once(
    store: &dyn OrderStore,
    gateway: &dyn PaymentGateway,
    grace: Duration,
) -> Result<(), BoxError> {
    let cutoff = now_millis() - grace.as_millis() as i64;
    let aged = store.age_out_stalled(cutoff).await?;
    if aged > 0 {
        tracing::warn!(count = aged, "stalled payment attempts aged into refund queue");
    }

    let due = store.pending_needing_refund(REFUND_BATCH).await?;
    for pending in due {
        match &pending.charge_ref {
            Some(reference) => match gateway.refund(reference).await {
                Ok(()) => {
                    store
                        .set_pending_state(pending.id, PendingState::Refunded)
                        .await?;
                    tracing::info!(
                        pending_id = pending.id,
                        charge_ref = %reference,
                        "refunded uncommitted charge"
                    );
                }
                // Leave the row in NEEDS_REFUND; the next pass retries.
                Err(e) => {
                    tracing::warn!(
                        pending_id = pending.id,
                        charge_ref = %reference,
                        error = %e,
                        "refund attempt failed, will retry"
                    );
                }
            },
            None => {
                // Without a charge reference there is nothing to refund
                // automatically. An operator has to check the provider.
                store
                    .set_pending_state(pending.id, PendingState::ManualReview)
                    .await?;
                tracing::error!(
                    pending_id = pending.id,
                    idempotency_key = %pending.idempotency_key,
                    "charge without reference needs manual review"
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::payment::mock::MockGateway;
    use std::sync::atomic::Ordering;

    const OLD: i64 = 1_000;

    fn grace() -> Duration {
        Duration::from_secs(60)
    }

    #[tokio::test]
    async fn test_stalled_charging_row_with_reference_is_refunded() {
        let store = MemoryStore::new();
        // Process died after the charge was captured and recorded but
        // before the order committed.
        store.add_pending(1, "k1", PendingState::Charging, Some("ch_9"), OLD);
        let gw = MockGateway::new(vec![]);

        run_once(&store, &gw, grace()).await.unwrap();

        let pending = store.pending(1).unwrap();
        assert_eq!(pending.state(), Some(PendingState::Refunded));
        assert_eq!(gw.refunds.lock().unwrap().as_slice(), ["ch_9"]);
    }

    #[tokio::test]
    async fn test_stalled_charging_row_without_reference_goes_to_review() {
        let store = MemoryStore::new();
        store.add_pending(1, "k1", PendingState::Charging, None, OLD);
        let gw = MockGateway::new(vec![]);

        run_once(&store, &gw, grace()).await.unwrap();

        let pending = store.pending(1).unwrap();
        assert_eq!(pending.state(), Some(PendingState::ManualReview));
        assert!(gw.refunds.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stalled_unknown_row_is_swept_too() {
        let store = MemoryStore::new();
        store.add_pending(1, "k1", PendingState::Unknown, Some("ch_5"), OLD);
        let gw = MockGateway::new(vec![]);

        run_once(&store, &gw, grace()).await.unwrap();

        assert_eq!(store.pending(1).unwrap().state(), Some(PendingState::Refunded));
    }

    #[tokio::test]
    async fn test_fresh_in_flight_rows_left_alone() {
        let store = MemoryStore::new();
        store.add_pending(1, "k1", PendingState::Charging, None, now_millis());
        store.add_pending(2, "k2", PendingState::Unknown, None, now_millis());
        let gw = MockGateway::new(vec![]);

        run_once(&store, &gw, grace()).await.unwrap();

        assert_eq!(store.pending(1).unwrap().state(), Some(PendingState::Charging));
        assert_eq!(store.pending(2).unwrap().state(), Some(PendingState::Unknown));
    }

    #[tokio::test]
    async fn test_failed_refund_stays_queued_for_retry() {
        let store = MemoryStore::new();
        store.add_pending(1, "k1", PendingState::NeedsRefund, Some("ch_9"), OLD);
        let gw = MockGateway::new(vec![]);
        gw.refund_fails.store(true, Ordering::SeqCst);

        run_once(&store, &gw, grace()).await.unwrap();
        assert_eq!(
            store.pending(1).unwrap().state(),
            Some(PendingState::NeedsRefund)
        );

        gw.refund_fails.store(false, Ordering::SeqCst);
        run_once(&store, &gw, grace()).await.unwrap();
        assert_eq!(store.pending(1).unwrap().state(), Some(PendingState::Refunded));
    }

    #[tokio::test]
    async fn test_committed_and_failed_rows_untouched() {
        let store = MemoryStore::new();
        store.add_pending(1, "k1", PendingState::Committed, Some("ch_1"), OLD);
        store.add_pending(2, "k2", PendingState::Failed, Some("ch_2"), OLD);
        let gw = MockGateway::new(vec![]);

        run_once(&store, &gw, grace()).await.unwrap();

        assert_eq!(store.pending(1).unwrap().state(), Some(PendingState::Committed));
        assert_eq!(store.pending(2).unwrap().state(), Some(PendingState::Failed));
        assert!(gw.refunds.lock().unwrap().is_empty());
    }
}
