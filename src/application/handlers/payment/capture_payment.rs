//! CapturePaymentHandler - Command handler for capturing an approved order
//! and granting the entitlement it paid for.
//!
//! # Ordering
//!
//! Once the provider confirms a capture the money is gone, so every step
//! after that point must either complete or leave a durable trail:
//!
//! 1. capture at the provider;
//! 2. write the capture-ledger acknowledgement (outbox);
//! 3. insert the purchase row, idempotent on `payment_id`;
//! 4. mark the ledger entry recorded and resolve the pending order.
//!
//! Steps 2 and 4 are best-effort; step 3 failing after a confirmed capture
//! is the one state that must reach an operator, reported as
//! `CaptureUnrecorded`.

use std::sync::Arc;

use crate::domain::billing::{BillingError, ContentRef, CorrelationId, Purchase};
use crate::domain::foundation::{Timestamp, ValidationError};
use crate::ports::{
    CaptureAck, CaptureLedger, CaptureStatus, PaymentGateway, PendingOrderStore,
    PurchaseRepository,
};

/// Command to capture an approved provider order.
#[derive(Debug, Clone)]
pub struct CapturePaymentCommand {
    pub order_id: String,
}

/// Outcome of a capture attempt.
///
/// A non-completed provider status is a normal outcome, not an error: the
/// caller is told what the provider said and no entitlement is granted.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureResult {
    /// Capture completed and the purchase row exists.
    Completed {
        purchase: Purchase,
        /// True when a previous capture of the same payment already created
        /// the row.
        already_recorded: bool,
    },

    /// Provider reported a status other than `COMPLETED`.
    NotCompleted {
        status: CaptureStatus,
        payment_id: String,
    },
}

/// Handler for capturing payment and recording the purchase.
pub struct CapturePaymentHandler {
    gateway: Arc<dyn PaymentGateway>,
    purchases: Arc<dyn PurchaseRepository>,
    capture_ledger: Arc<dyn CaptureLedger>,
    pending_orders: Arc<dyn PendingOrderStore>,
    /// Days of access granted per purchase. Absent means access never
    /// expires by time.
    access_ttl_days: Option<u32>,
}

impl CapturePaymentHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        purchases: Arc<dyn PurchaseRepository>,
        capture_ledger: Arc<dyn CaptureLedger>,
        pending_orders: Arc<dyn PendingOrderStore>,
        access_ttl_days: Option<u32>,
    ) -> Self {
        Self {
            gateway,
            purchases,
            capture_ledger,
            pending_orders,
            access_ttl_days,
        }
    }

    pub async fn handle(&self, cmd: CapturePaymentCommand) -> Result<CaptureResult, BillingError> {
        if cmd.order_id.trim().is_empty() {
            return Err(ValidationError::empty_field("orderId").into());
        }

        // 1. Capture at the provider
        let outcome = self.gateway.capture_order(&cmd.order_id).await?;

        if !outcome.status.is_completed() {
            tracing::info!(
                order_id = %cmd.order_id,
                payment_id = %outcome.payment_id,
                status = %outcome.status,
                "Capture not completed; no entitlement granted"
            );
            return Ok(CaptureResult::NotCompleted {
                status: outcome.status,
                payment_id: outcome.payment_id,
            });
        }

        // 2. Durable acknowledgement before anything can go wrong locally.
        //    The purchase row in step 4 is the record of truth, so a ledger
        //    write failure is logged rather than returned.
        let ack = CaptureAck::new(
            outcome.payment_id.clone(),
            cmd.order_id.clone(),
            outcome.custom_id.clone(),
            outcome.amount,
        );
        if let Err(e) = self.capture_ledger.acknowledge(&ack).await {
            tracing::error!(
                payment_id = %outcome.payment_id,
                error = %e,
                "Failed to write capture acknowledgement"
            );
        }

        // 3. Decode the correlation the provider echoed back
        let (user_id, content_id) =
            CorrelationId::decode(&outcome.custom_id).ok_or_else(|| {
                tracing::error!(
                    payment_id = %outcome.payment_id,
                    custom_id = %outcome.custom_id,
                    "Captured payment carries an undecodable correlation"
                );
                BillingError::malformed_correlation(&outcome.payment_id, &outcome.custom_id)
            })?;

        // 4. Record the purchase, idempotent on payment_id
        let expires_at = self
            .access_ttl_days
            .map(|days| Timestamp::now().add_days(i64::from(days)));
        let purchase = Purchase::from_capture(
            user_id,
            ContentRef::set(content_id),
            outcome.payment_id.clone(),
            outcome.amount,
            expires_at,
        );

        let inserted = self
            .purchases
            .insert_if_absent(&purchase)
            .await
            .map_err(|e| {
                BillingError::capture_unrecorded(&outcome.payment_id, e.to_string())
            })?;

        // 5. Close the loop; both writes are advisory
        if let Err(e) = self.capture_ledger.mark_recorded(&outcome.payment_id).await {
            tracing::warn!(
                payment_id = %outcome.payment_id,
                error = %e,
                "Failed to mark capture recorded"
            );
        }
        if let Err(e) = self.pending_orders.mark_resolved(&cmd.order_id).await {
            tracing::warn!(
                order_id = %cmd.order_id,
                error = %e,
                "Failed to resolve pending order"
            );
        }

        let already_recorded = inserted.was_duplicate();
        tracing::info!(
            payment_id = %outcome.payment_id,
            purchase_id = %inserted.purchase().id,
            already_recorded,
            "Capture recorded"
        );

        Ok(CaptureResult::Completed {
            purchase: inserted.purchase().clone(),
            already_recorded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryCaptureLedger, InMemoryPendingOrderStore, InMemoryPurchaseRepository,
    };
    use crate::adapters::paypal::MockPaymentGateway;
    use crate::domain::billing::{Currency, Money};
    use crate::domain::foundation::{ContentId, DomainError, PurchaseId, UserId};
    use crate::ports::{GatewayError, InsertOutcome};
    use async_trait::async_trait;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    struct FailingPurchaseRepository;

    #[async_trait]
    impl PurchaseRepository for FailingPurchaseRepository {
        async fn insert_if_absent(
            &self,
            _purchase: &Purchase,
        ) -> Result<InsertOutcome, DomainError> {
            Err(DomainError::database("Simulated insert failure"))
        }

        async fn find_by_payment_id(
            &self,
            _payment_id: &str,
        ) -> Result<Option<Purchase>, DomainError> {
            Ok(None)
        }

        async fn find_active(
            &self,
            _user_id: &UserId,
            _content_id: &ContentId,
        ) -> Result<Option<Purchase>, DomainError> {
            Ok(None)
        }

        async fn deactivate(&self, _id: &PurchaseId) -> Result<bool, DomainError> {
            Ok(false)
        }

        async fn list_active_for_user(
            &self,
            _user_id: &UserId,
        ) -> Result<Vec<Purchase>, DomainError> {
            Ok(vec![])
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        gateway: Arc<MockPaymentGateway>,
        purchases: Arc<InMemoryPurchaseRepository>,
        ledger: Arc<InMemoryCaptureLedger>,
        pending: Arc<InMemoryPendingOrderStore>,
        handler: CapturePaymentHandler,
    }

    fn fixture_with_ttl(access_ttl_days: Option<u32>) -> Fixture {
        let gateway = Arc::new(MockPaymentGateway::new());
        let purchases = Arc::new(InMemoryPurchaseRepository::new());
        let ledger = Arc::new(InMemoryCaptureLedger::new());
        let pending = Arc::new(InMemoryPendingOrderStore::new());
        let handler = CapturePaymentHandler::new(
            gateway.clone(),
            purchases.clone(),
            ledger.clone(),
            pending.clone(),
            access_ttl_days,
        );
        Fixture {
            gateway,
            purchases,
            ledger,
            pending,
            handler,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_ttl(None)
    }

    async fn approved_order(fx: &Fixture) -> String {
        let correlation = CorrelationId::new(
            &UserId::new("U1").unwrap(),
            &ContentId::new("S1").unwrap(),
        );
        let amount = Money::from_major(1000, Currency::Rub).unwrap();
        fx.gateway
            .create_order(&amount, &correlation)
            .await
            .unwrap()
            .id
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Success Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn completed_capture_records_purchase() {
        let fx = fixture();
        let order_id = approved_order(&fx).await;

        let result = fx
            .handler
            .handle(CapturePaymentCommand {
                order_id: order_id.clone(),
            })
            .await
            .unwrap();

        let CaptureResult::Completed {
            purchase,
            already_recorded,
        } = result
        else {
            panic!("expected completed capture");
        };
        assert!(!already_recorded);
        assert_eq!(purchase.user_id.as_str(), "U1");
        assert_eq!(purchase.content_ref.content_id().as_str(), "S1");
        assert_eq!(
            purchase.amount,
            Money::from_major(1000, Currency::Rub).unwrap()
        );
        assert!(purchase.is_active);
        assert!(purchase.expires_at.is_none());
        assert_eq!(fx.purchases.len(), 1);
    }

    #[tokio::test]
    async fn access_ttl_sets_expiry() {
        let fx = fixture_with_ttl(Some(30));
        let order_id = approved_order(&fx).await;

        let result = fx
            .handler
            .handle(CapturePaymentCommand { order_id })
            .await
            .unwrap();

        let CaptureResult::Completed { purchase, .. } = result else {
            panic!("expected completed capture");
        };
        let expires_at = purchase.expires_at.unwrap();
        assert!(expires_at.is_after(&Timestamp::now().add_days(29)));
        assert!(expires_at.is_before(&Timestamp::now().add_days(31)));
    }

    #[tokio::test]
    async fn ledger_entry_is_acknowledged_then_recorded() {
        let fx = fixture();
        let order_id = approved_order(&fx).await;

        fx.handler
            .handle(CapturePaymentCommand { order_id })
            .await
            .unwrap();

        assert!(fx.ledger.list_unrecorded().await.unwrap().is_empty());
        let ack = fx.ledger.get("MOCK-PAY-1").unwrap();
        assert_eq!(ack.correlation, "U1:S1");
        assert!(ack.recorded_at.is_some());
    }

    #[tokio::test]
    async fn pending_order_is_resolved() {
        let fx = fixture();
        let order_id = approved_order(&fx).await;
        let pending = crate::ports::PendingOrder::new(
            order_id.clone(),
            CorrelationId::new(
                &UserId::new("U1").unwrap(),
                &ContentId::new("S1").unwrap(),
            ),
            Money::from_major(1000, Currency::Rub).unwrap(),
        );
        fx.pending.record(&pending).await.unwrap();

        fx.handler
            .handle(CapturePaymentCommand {
                order_id: order_id.clone(),
            })
            .await
            .unwrap();

        assert!(fx.pending.get(&order_id).unwrap().resolved_at.is_some());
    }

    #[tokio::test]
    async fn duplicate_capture_returns_existing_purchase() {
        let fx = fixture();
        let order_id = approved_order(&fx).await;

        let first = fx
            .handler
            .handle(CapturePaymentCommand {
                order_id: order_id.clone(),
            })
            .await
            .unwrap();
        let second = fx
            .handler
            .handle(CapturePaymentCommand { order_id })
            .await
            .unwrap();

        let CaptureResult::Completed {
            purchase: first_purchase,
            already_recorded: false,
        } = first
        else {
            panic!("expected fresh capture");
        };
        let CaptureResult::Completed {
            purchase: second_purchase,
            already_recorded: true,
        } = second
        else {
            panic!("expected duplicate capture");
        };
        assert_eq!(first_purchase.id, second_purchase.id);
        assert_eq!(fx.purchases.len(), 1);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Non-completed and Failure Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn declined_capture_grants_nothing() {
        let fx = fixture();
        fx.gateway.set_capture_status(CaptureStatus::Declined);
        let order_id = approved_order(&fx).await;

        let result = fx
            .handler
            .handle(CapturePaymentCommand { order_id })
            .await
            .unwrap();

        assert!(matches!(
            result,
            CaptureResult::NotCompleted {
                status: CaptureStatus::Declined,
                ..
            }
        ));
        assert!(fx.purchases.is_empty());
        assert!(fx.ledger.list_unrecorded().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pending_capture_grants_nothing() {
        let fx = fixture();
        fx.gateway.set_capture_status(CaptureStatus::Pending);
        let order_id = approved_order(&fx).await;

        let result = fx
            .handler
            .handle(CapturePaymentCommand { order_id })
            .await
            .unwrap();
        assert!(matches!(result, CaptureResult::NotCompleted { .. }));
        assert!(fx.purchases.is_empty());
    }

    #[tokio::test]
    async fn empty_order_id_is_rejected_without_provider_call() {
        let fx = fixture();
        let result = fx
            .handler
            .handle(CapturePaymentCommand {
                order_id: "  ".to_string(),
            })
            .await;

        assert!(matches!(result, Err(BillingError::Validation { .. })));
        assert_eq!(fx.gateway.capture_calls(), 0);
    }

    #[tokio::test]
    async fn provider_rejection_propagates() {
        let fx = fixture();
        fx.gateway.fail_next_capture(GatewayError::Rejected {
            status: 422,
            body: "ORDER_NOT_APPROVED".to_string(),
        });
        let order_id = approved_order(&fx).await;

        let result = fx
            .handler
            .handle(CapturePaymentCommand { order_id })
            .await;
        assert!(matches!(
            result,
            Err(BillingError::ProviderRejected { status: 422, .. })
        ));
        assert!(fx.purchases.is_empty());
    }

    #[tokio::test]
    async fn malformed_correlation_is_reported_but_acknowledged() {
        let fx = fixture();
        fx.gateway.override_capture_custom_id("garbage-no-delimiter");
        let order_id = approved_order(&fx).await;

        let result = fx
            .handler
            .handle(CapturePaymentCommand { order_id })
            .await;

        assert!(matches!(
            result,
            Err(BillingError::MalformedCorrelation { .. })
        ));
        assert!(fx.purchases.is_empty());

        // The verbatim string still lands in the ledger for reconciliation.
        let unrecorded = fx.ledger.list_unrecorded().await.unwrap();
        assert_eq!(unrecorded.len(), 1);
        assert_eq!(unrecorded[0].correlation, "garbage-no-delimiter");
    }

    #[tokio::test]
    async fn insert_failure_after_capture_is_capture_unrecorded() {
        let gateway = Arc::new(MockPaymentGateway::new());
        let ledger = Arc::new(InMemoryCaptureLedger::new());
        let handler = CapturePaymentHandler::new(
            gateway.clone(),
            Arc::new(FailingPurchaseRepository),
            ledger.clone(),
            Arc::new(InMemoryPendingOrderStore::new()),
            None,
        );

        let correlation = CorrelationId::new(
            &UserId::new("U1").unwrap(),
            &ContentId::new("S1").unwrap(),
        );
        let amount = Money::from_major(1000, Currency::Rub).unwrap();
        let order_id = gateway.create_order(&amount, &correlation).await.unwrap().id;

        let result = handler.handle(CapturePaymentCommand { order_id }).await;

        assert!(matches!(
            result,
            Err(BillingError::CaptureUnrecorded { .. })
        ));
        // The acknowledgement survives for reconciliation.
        let unrecorded = ledger.list_unrecorded().await.unwrap();
        assert_eq!(unrecorded.len(), 1);
        assert_eq!(unrecorded[0].correlation, "U1:S1");
    }
}
