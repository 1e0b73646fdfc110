//! In-memory purchase store for tests and local development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::Purchase;
use crate::domain::foundation::{ContentId, DomainError, PurchaseId, UserId};
use crate::ports::{InsertOutcome, PurchaseRepository};

/// Purchase store backed by a mutex-guarded map keyed by `payment_id`.
///
/// The map key enforces the same uniqueness the Postgres adapter gets from
/// its unique index, so insert_if_absent stays atomic under concurrency.
pub struct InMemoryPurchaseRepository {
    by_payment_id: Mutex<HashMap<String, Purchase>>,
}

impl InMemoryPurchaseRepository {
    pub fn new() -> Self {
        Self {
            by_payment_id: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored purchases.
    pub fn len(&self) -> usize {
        self.by_payment_id.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryPurchaseRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryPurchaseRepository {
    async fn insert_if_absent(&self, purchase: &Purchase) -> Result<InsertOutcome, DomainError> {
        let mut map = self.by_payment_id.lock().unwrap();
        if let Some(existing) = map.get(&purchase.payment_id) {
            return Ok(InsertOutcome::AlreadyRecorded(existing.clone()));
        }
        map.insert(purchase.payment_id.clone(), purchase.clone());
        Ok(InsertOutcome::Inserted(purchase.clone()))
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Purchase>, DomainError> {
        Ok(self.by_payment_id.lock().unwrap().get(payment_id).cloned())
    }

    async fn find_active(
        &self,
        user_id: &UserId,
        content_id: &ContentId,
    ) -> Result<Option<Purchase>, DomainError> {
        Ok(self
            .by_payment_id
            .lock()
            .unwrap()
            .values()
            .find(|p| {
                p.is_active && &p.user_id == user_id && p.content_ref.content_id() == content_id
            })
            .cloned())
    }

    async fn deactivate(&self, id: &PurchaseId) -> Result<bool, DomainError> {
        let mut map = self.by_payment_id.lock().unwrap();
        match map.values_mut().find(|p| &p.id == id) {
            Some(p) if p.is_active => {
                p.deactivate();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_active_for_user(&self, user_id: &UserId) -> Result<Vec<Purchase>, DomainError> {
        let mut purchases: Vec<Purchase> = self
            .by_payment_id
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.is_active && &p.user_id == user_id)
            .cloned()
            .collect();
        purchases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(purchases)
    }
}
