//! ListPurchasesHandler - Query handler for a user's current purchases.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Purchase};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::PurchaseRepository;

/// Handler listing the purchases that currently grant a user access.
///
/// Applies the same lazy expiry as the access check so a listing never
/// advertises an entitlement the access check would deny.
pub struct ListPurchasesHandler {
    purchases: Arc<dyn PurchaseRepository>,
}

impl ListPurchasesHandler {
    pub fn new(purchases: Arc<dyn PurchaseRepository>) -> Self {
        Self { purchases }
    }

    pub async fn handle(&self, user_id: &UserId) -> Result<Vec<Purchase>, BillingError> {
        let active = self.purchases.list_active_for_user(user_id).await?;

        let now = Timestamp::now();
        let mut current = Vec::with_capacity(active.len());
        for purchase in active {
            if purchase.is_entitled(&now) {
                current.push(purchase);
                continue;
            }
            if let Err(e) = self.purchases.deactivate(&purchase.id).await {
                tracing::warn!(
                    purchase_id = %purchase.id,
                    error = %e,
                    "Failed to deactivate expired purchase"
                );
            }
        }

        Ok(current)
    }
}
