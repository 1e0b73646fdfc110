//! Pending-order store port.
//!
//! A minimal durable record of a provider order created at checkout but not
//! yet captured. Without it, a crash between order creation and capture
//! leaves nothing local to reconcile against the provider. Unresolved rows
//! past a TTL are surfaced for an operator job; there is no background
//! scheduler in this subsystem.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::{CorrelationId, Money};
use crate::domain::foundation::{DomainError, Timestamp};

/// A created-but-not-captured provider order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    /// Provider's order id (the key).
    pub provider_order_id: String,

    /// Correlation string embedded in the order.
    pub correlation: CorrelationId,

    /// Requested amount and currency.
    pub amount: Money,

    pub created_at: Timestamp,

    /// Set when a capture for this order completed.
    pub resolved_at: Option<Timestamp>,
}

impl PendingOrder {
    /// Creates an unresolved pending-order record.
    pub fn new(
        provider_order_id: impl Into<String>,
        correlation: CorrelationId,
        amount: Money,
    ) -> Self {
        Self {
            provider_order_id: provider_order_id.into(),
            correlation,
            amount,
            created_at: Timestamp::now(),
            resolved_at: None,
        }
    }
}

/// Port for pending-order reconciliation records.
#[async_trait]
pub trait PendingOrderStore: Send + Sync {
    /// Records a newly created provider order. Idempotent per order id.
    async fn record(&self, order: &PendingOrder) -> Result<(), DomainError>;

    /// Marks an order resolved after a completed capture. Unknown order ids
    /// are a no-op: the provider accepts captures for orders this process
    /// never recorded (e.g. created before a crash).
    async fn mark_resolved(&self, provider_order_id: &str) -> Result<(), DomainError>;

    /// Lists unresolved orders created at or before the cutoff, for
    /// reconciliation against the provider.
    async fn list_unresolved_before(
        &self,
        cutoff: &Timestamp,
    ) -> Result<Vec<PendingOrder>, DomainError>;

    /// Deletes unresolved orders created at or before the cutoff. Returns
    /// the number of rows removed.
    async fn purge_unresolved_before(&self, cutoff: &Timestamp) -> Result<u64, DomainError>;
}
