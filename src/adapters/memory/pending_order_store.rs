//! In-memory pending-order store for tests and local development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{PendingOrder, PendingOrderStore};

/// Pending-order store backed by a mutex-guarded map keyed by the provider
/// order id.
pub struct InMemoryPendingOrderStore {
    orders: Mutex<HashMap<String, PendingOrder>>,
}

impl InMemoryPendingOrderStore {
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a stored order by provider order id.
    pub fn get(&self, provider_order_id: &str) -> Option<PendingOrder> {
        self.orders.lock().unwrap().get(provider_order_id).cloned()
    }
}

impl Default for InMemoryPendingOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PendingOrderStore for InMemoryPendingOrderStore {
    async fn record(&self, order: &PendingOrder) -> Result<(), DomainError> {
        self.orders
            .lock()
            .unwrap()
            .entry(order.provider_order_id.clone())
            .or_insert_with(|| order.clone());
        Ok(())
    }

    async fn mark_resolved(&self, provider_order_id: &str) -> Result<(), DomainError> {
        if let Some(order) = self.orders.lock().unwrap().get_mut(provider_order_id) {
            if order.resolved_at.is_none() {
                order.resolved_at = Some(Timestamp::now());
            }
        }
        Ok(())
    }

    async fn list_unresolved_before(
        &self,
        cutoff: &Timestamp,
    ) -> Result<Vec<PendingOrder>, DomainError> {
        let mut orders: Vec<PendingOrder> = self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.resolved_at.is_none() && &o.created_at <= cutoff)
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(orders)
    }

    async fn purge_unresolved_before(&self, cutoff: &Timestamp) -> Result<u64, DomainError> {
        let mut orders = self.orders.lock().unwrap();
        let before = orders.len();
        orders.retain(|_, o| o.resolved_at.is_some() || &o.created_at > cutoff);
        Ok((before - orders.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{CorrelationId, Currency, Money};
    use crate::domain::foundation::{ContentId, UserId};

    fn pending(order_id: &str) -> PendingOrder {
        PendingOrder::new(
            order_id,
            CorrelationId::new(
                &UserId::new("U1").unwrap(),
                &ContentId::new("S1").unwrap(),
            ),
            Money::from_major(500, Currency::Rub).unwrap(),
        )
    }

    #[tokio::test]
    async fn record_is_idempotent_per_order_id() {
        let store = InMemoryPendingOrderStore::new();
        let first = pending("ORDER-1");
        store.record(&first).await.unwrap();
        store.record(&pending("ORDER-1")).await.unwrap();

        let stored = store.get("ORDER-1").unwrap();
        assert_eq!(stored.created_at, first.created_at);
    }

    #[tokio::test]
    async fn mark_resolved_sets_timestamp_once() {
        let store = InMemoryPendingOrderStore::new();
        store.record(&pending("ORDER-1")).await.unwrap();

        store.mark_resolved("ORDER-1").await.unwrap();
        let first = store.get("ORDER-1").unwrap().resolved_at.unwrap();

        store.mark_resolved("ORDER-1").await.unwrap();
        assert_eq!(store.get("ORDER-1").unwrap().resolved_at.unwrap(), first);
    }

    #[tokio::test]
    async fn mark_resolved_unknown_order_is_noop() {
        let store = InMemoryPendingOrderStore::new();
        store.mark_resolved("NO-SUCH-ORDER").await.unwrap();
    }

    #[tokio::test]
    async fn listing_skips_resolved_and_recent_orders() {
        let store = InMemoryPendingOrderStore::new();
        store.record(&pending("ORDER-1")).await.unwrap();
        store.record(&pending("ORDER-2")).await.unwrap();
        store.mark_resolved("ORDER-2").await.unwrap();

        let cutoff = Timestamp::now().plus_secs(1);
        let unresolved = store.list_unresolved_before(&cutoff).await.unwrap();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].provider_order_id, "ORDER-1");

        let early_cutoff = Timestamp::now().minus_days(1);
        assert!(store
            .list_unresolved_before(&early_cutoff)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn purge_removes_only_stale_unresolved() {
        let store = InMemoryPendingOrderStore::new();
        store.record(&pending("ORDER-1")).await.unwrap();
        store.record(&pending("ORDER-2")).await.unwrap();
        store.mark_resolved("ORDER-2").await.unwrap();

        let cutoff = Timestamp::now().plus_secs(1);
        let purged = store.purge_unresolved_before(&cutoff).await.unwrap();
        assert_eq!(purged, 1);
        assert!(store.get("ORDER-1").is_none());
        assert!(store.get("ORDER-2").is_some());
    }
}
