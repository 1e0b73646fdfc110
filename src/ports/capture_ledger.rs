//! Capture ledger port.
//!
//! A durable outbox entry written as soon as the provider confirms a capture,
//! before the purchase insert is attempted. If the insert then fails, the
//! money has been taken but the entitlement is missing; the ledger is what
//! makes that window visible. `list_unrecorded` feeds an operator
//! reconciliation sweep that re-checks such entries against the provider's
//! capture record. No automatic replay is performed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::Money;
use crate::domain::foundation::{DomainError, Timestamp};

/// A provider-confirmed capture and whether its purchase row exists yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureAck {
    /// Provider's capture (payment) id. The key.
    pub payment_id: String,

    /// Provider's order id the capture belongs to.
    pub provider_order_id: String,

    /// Raw correlation string echoed by the provider. Kept verbatim so a
    /// malformed correlation can still be reconciled by hand.
    pub correlation: String,

    /// Captured amount and currency.
    pub amount: Money,

    /// When the provider confirmed the capture.
    pub acknowledged_at: Timestamp,

    /// Set once the purchase row is known to exist.
    pub recorded_at: Option<Timestamp>,
}

impl CaptureAck {
    /// Creates an unrecorded acknowledgement for a just-confirmed capture.
    pub fn new(
        payment_id: impl Into<String>,
        provider_order_id: impl Into<String>,
        correlation: impl Into<String>,
        amount: Money,
    ) -> Self {
        Self {
            payment_id: payment_id.into(),
            provider_order_id: provider_order_id.into(),
            correlation: correlation.into(),
            amount,
            acknowledged_at: Timestamp::now(),
            recorded_at: None,
        }
    }
}

/// Port for the capture-acknowledged outbox.
#[async_trait]
pub trait CaptureLedger: Send + Sync {
    /// Persists the acknowledgement. Idempotent per payment id: duplicate
    /// captures of the same order must not fail here.
    async fn acknowledge(&self, ack: &CaptureAck) -> Result<(), DomainError>;

    /// Marks the entry recorded once the purchase row exists. A no-op for
    /// unknown payment ids.
    async fn mark_recorded(&self, payment_id: &str) -> Result<(), DomainError>;

    /// Lists acknowledged captures with no matching purchase row, oldest
    /// first.
    async fn list_unrecorded(&self) -> Result<Vec<CaptureAck>, DomainError>;
}
