//! Payment provider integration via REST API (no SDK dependency)
//!
//! The workflow talks to the provider through the [`PaymentGateway`]
//! trait. The provider is treated as untrusted, possibly slow, and
//! possibly failing: every charge is bounded by a timeout, and a
//! timed-out or transport-failed charge is an *unknown* outcome, never
//! a decline. The reconciler owns those records afterwards.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Result of a charge attempt that produced a provider answer
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    /// True when the charge was captured
    pub succeeded: bool,
    /// Provider-side charge reference (needed for refunds)
    pub reference: String,
}

/// Failures where no definitive provider answer exists
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request never completed; charge may or may not have landed
    #[error("payment provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Provider did not answer within the configured bound
    #[error("payment provider timed out")]
    Timeout,
    /// Provider answered with something unparseable
    #[error("unexpected payment provider response: {0}")]
    Protocol(String),
}

/// Charge/refund interface of the external payment provider.
///
/// Injected as a collaborator so the placement workflow never holds
/// provider specifics; tests supply an in-memory implementation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge `amount` minor currency units on `token`.
    ///
    /// `idempotency_key` is forwarded so a retried request cannot
    /// produce a second capture on the provider side.
    async fn charge(
        &self,
        amount: i64,
        currency: &str,
        token: &str,
        idempotency_key: &str,
    ) -> Result<ChargeOutcome, GatewayError>;

    /// Refund a previously captured charge
    async fn refund(&self, reference: &str) -> Result<(), GatewayError>;
}

/// Stripe Charges API over plain REST
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    timeout: Duration,
    base_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            timeout,
            base_url: "https://api.stripe.com".to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn charge(
        &self,
        amount: i64,
        currency: &str,
        token: &str,
        idempotency_key: &str,
    ) -> Result<ChargeOutcome, GatewayError> {
        let amount_str = amount.to_string();
        let request = self
            .client
            .post(format!("{}/v1/charges", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .header("Idempotency-Key", idempotency_key)
            .form(&[
                ("amount", amount_str.as_str()),
                ("currency", currency),
                ("source", token),
            ])
            .send();

        let resp = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| GatewayError::Timeout)??;

        let body: serde_json::Value = resp.json().await?;

        // A decline still carries a charge object; anything without
        // id + status is a protocol error.
        let reference = body["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| GatewayError::Protocol(format!("charge response without id: {body}")))?;
        let status = body["status"]
            .as_str()
            .ok_or_else(|| GatewayError::Protocol(format!("charge response without status: {body}")))?;

        Ok(ChargeOutcome {
            succeeded: status == "succeeded",
            reference,
        })
    }

    async fn refund(&self, reference: &str) -> Result<(), GatewayError> {
        let request = self
            .client
            .post(format!("{}/v1/refunds", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[("charge", reference)])
            .send();

        let resp = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| GatewayError::Timeout)??;

        let body: serde_json::Value = resp.json().await?;
        match body["status"].as_str() {
            Some("succeeded") | Some("pending") => Ok(()),
            other => Err(GatewayError::Protocol(format!(
                "refund status {other:?} for charge {reference}"
            ))),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockGateway;
    use super::*;

    #[tokio::test]
    async fn test_mock_records_charge_and_idempotency_key() {
        let gw = MockGateway::succeeding("ch_1");
        let outcome = gw.charge(1300, "eur", "tok_visa", "key-1").await.unwrap();
        assert!(outcome.succeeded);
        assert_eq!(outcome.reference, "ch_1");

        let charges = gw.charges.lock().unwrap();
        assert_eq!(charges.len(), 1);
        assert_eq!(charges[0], (1300, "tok_visa".into(), "key-1".into()));
    }

    #[tokio::test]
    async fn test_mock_decline_carries_reference() {
        let gw = MockGateway::declining("ch_declined");
        let outcome = gw.charge(500, "eur", "tok_bad", "key-2").await.unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.reference, "ch_declined");
    }

    #[tokio::test]
    async fn test_mock_timeout_is_not_a_decline() {
        let gw = MockGateway::timing_out();
        let err = gw.charge(500, "eur", "tok", "key-3").await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout));
    }

    #[tokio::test]
    async fn test_stripe_gateway_times_out_against_unroutable_host() {
        // 192.0.2.0/24 is TEST-NET-1, guaranteed unroutable
        let gw = StripeGateway::new("sk_test".into(), Duration::from_millis(50))
            .with_base_url("http://192.0.2.1:1".into());
        let err = gw.charge(100, "eur", "tok", "k").await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Timeout | GatewayError::Transport(_)
        ));
    }
}
