//! Purchase store port.
//!
//! The purchase store is the only shared mutable resource in this subsystem.
//! Both of its writes must be atomic at the storage layer rather than
//! read-then-write in the application:
//!
//! - `insert_if_absent` relies on the unique `payment_id` constraint so that
//!   concurrent duplicate captures produce exactly one row;
//! - `deactivate` is a conditional update so racing expiry flips stay
//!   idempotent.

use async_trait::async_trait;

use crate::domain::billing::Purchase;
use crate::domain::foundation::{ContentId, DomainError, PurchaseId, UserId};

/// Result of an idempotent purchase insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// A new row was created.
    Inserted(Purchase),

    /// A purchase with this `payment_id` already existed; the stored row is
    /// returned unchanged.
    AlreadyRecorded(Purchase),
}

impl InsertOutcome {
    /// The stored purchase, whichever way it got there.
    pub fn purchase(&self) -> &Purchase {
        match self {
            InsertOutcome::Inserted(p) | InsertOutcome::AlreadyRecorded(p) => p,
        }
    }

    /// True if the row already existed.
    pub fn was_duplicate(&self) -> bool {
        matches!(self, InsertOutcome::AlreadyRecorded(_))
    }
}

/// Port for durable purchase storage.
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Inserts the purchase unless a row with its `payment_id` already
    /// exists, in which case the existing row is returned. Atomic with
    /// respect to concurrent inserts of the same `payment_id`.
    async fn insert_if_absent(&self, purchase: &Purchase) -> Result<InsertOutcome, DomainError>;

    /// Finds a purchase by its external payment id.
    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Purchase>, DomainError>;

    /// Finds an active purchase granting `user_id` access to `content_id`.
    async fn find_active(
        &self,
        user_id: &UserId,
        content_id: &ContentId,
    ) -> Result<Option<Purchase>, DomainError>;

    /// Flips a purchase inactive. Returns true if this call did the flip,
    /// false if it was already inactive. Never reactivates.
    async fn deactivate(&self, id: &PurchaseId) -> Result<bool, DomainError>;

    /// Lists the user's active purchases, newest first.
    async fn list_active_for_user(&self, user_id: &UserId) -> Result<Vec<Purchase>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{ContentRef, Currency, Money};

    fn test_purchase() -> Purchase {
        Purchase::from_capture(
            UserId::new("U1").unwrap(),
            ContentRef::set(ContentId::new("S1").unwrap()),
            "PAY-1",
            Money::from_major(1000, Currency::Rub).unwrap(),
            None,
        )
    }

    #[test]
    fn purchase_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn PurchaseRepository) {}
    }

    #[test]
    fn insert_outcome_exposes_purchase_and_duplicate_flag() {
        let p = test_purchase();

        let inserted = InsertOutcome::Inserted(p.clone());
        assert!(!inserted.was_duplicate());
        assert_eq!(inserted.purchase().payment_id, "PAY-1");

        let duplicate = InsertOutcome::AlreadyRecorded(p);
        assert!(duplicate.was_duplicate());
    }
}
