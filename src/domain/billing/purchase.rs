//! Purchase aggregate: the durable record that a payment was captured and
//! access was granted.
//!
//! # Lifecycle
//!
//! Created only after a provider-confirmed `COMPLETED` capture. The only
//! mutation this subsystem performs is the lazy expiry flip (`is_active` to
//! false); a deactivated purchase is never reactivated.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PurchaseId, Timestamp, UserId};

use super::{ContentRef, Money};

/// Provider name recorded on purchases created by this subsystem.
pub const DEFAULT_PAYMENT_METHOD: &str = "paypal";

/// A captured payment and the entitlement it grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub content_ref: ContentRef,

    /// External provider transaction id. Unique across all purchases; the
    /// idempotency key for duplicate captures.
    pub payment_id: String,

    pub amount: Money,
    pub payment_method: String,
    pub is_active: bool,

    /// Absence means access does not expire by time.
    pub expires_at: Option<Timestamp>,

    pub created_at: Timestamp,
}

impl Purchase {
    /// Creates an active purchase from a completed capture.
    pub fn from_capture(
        user_id: UserId,
        content_ref: ContentRef,
        payment_id: impl Into<String>,
        amount: Money,
        expires_at: Option<Timestamp>,
    ) -> Self {
        Self {
            id: PurchaseId::new(),
            user_id,
            content_ref,
            payment_id: payment_id.into(),
            amount,
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            is_active: true,
            expires_at,
            created_at: Timestamp::now(),
        }
    }

    /// Whether the purchase grants access at the given moment.
    ///
    /// This is the sole definition of "entitled": active, and either
    /// non-expiring or not yet expired.
    pub fn is_entitled(&self, now: &Timestamp) -> bool {
        self.is_active && !self.is_past_expiry(now)
    }

    /// Whether the purchase has an expiry timestamp at or before `now`.
    pub fn is_past_expiry(&self, now: &Timestamp) -> bool {
        match &self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }

    /// Flips the purchase inactive. Idempotent; there is no way back.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::Currency;
    use crate::domain::foundation::ContentId;

    fn test_purchase(expires_at: Option<Timestamp>) -> Purchase {
        Purchase::from_capture(
            UserId::new("U1").unwrap(),
            ContentRef::set(ContentId::new("S1").unwrap()),
            "PAY-123",
            Money::from_major(1000, Currency::Rub).unwrap(),
            expires_at,
        )
    }

    #[test]
    fn from_capture_creates_active_purchase() {
        let p = test_purchase(None);
        assert!(p.is_active);
        assert_eq!(p.payment_method, DEFAULT_PAYMENT_METHOD);
        assert_eq!(p.payment_id, "PAY-123");
        assert_eq!(p.amount, Money::from_major(1000, Currency::Rub).unwrap());
    }

    #[test]
    fn no_expiry_means_entitled_forever() {
        let p = test_purchase(None);
        assert!(p.is_entitled(&Timestamp::now()));
        assert!(p.is_entitled(&Timestamp::now().add_days(10_000)));
    }

    #[test]
    fn future_expiry_still_entitled() {
        let p = test_purchase(Some(Timestamp::now().add_days(30)));
        assert!(p.is_entitled(&Timestamp::now()));
    }

    #[test]
    fn past_expiry_not_entitled() {
        let p = test_purchase(Some(Timestamp::now().minus_days(1)));
        let now = Timestamp::now();
        assert!(p.is_past_expiry(&now));
        assert!(!p.is_entitled(&now));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Timestamp::now();
        let p = test_purchase(Some(now));
        // expires_at <= now means expired
        assert!(!p.is_entitled(&now));
    }

    #[test]
    fn deactivated_purchase_is_never_entitled() {
        let mut p = test_purchase(None);
        p.deactivate();
        assert!(!p.is_active);
        assert!(!p.is_entitled(&Timestamp::now()));

        // Idempotent
        p.deactivate();
        assert!(!p.is_active);
    }

    #[test]
    fn distinct_purchases_get_distinct_ids() {
        assert_ne!(test_purchase(None).id, test_purchase(None).id);
    }
}
