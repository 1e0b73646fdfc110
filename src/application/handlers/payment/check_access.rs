//! CheckAccessHandler - Query handler for entitlement checks with lazy
//! expiry.
//!
//! Expiry is evaluated at read time: an expired purchase found here is
//! flipped inactive before the answer goes out. There is no background
//! expiry job.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::{ContentId, Timestamp, UserId};
use crate::ports::PurchaseRepository;

/// Handler answering "does this user currently have access to this content".
pub struct CheckAccessHandler {
    purchases: Arc<dyn PurchaseRepository>,
}

impl CheckAccessHandler {
    pub fn new(purchases: Arc<dyn PurchaseRepository>) -> Self {
        Self { purchases }
    }

    /// Fails closed: a storage error is logged and answered as "no access",
    /// never as an error the caller could mistake for a grant.
    pub async fn handle(
        &self,
        user_id: &UserId,
        content_id: &ContentId,
    ) -> Result<bool, BillingError> {
        let found = match self.purchases.find_active(user_id, content_id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    content_id = %content_id,
                    error = %e,
                    "Entitlement lookup failed; denying access"
                );
                return Ok(false);
            }
        };
        let Some(purchase) = found else {
            return Ok(false);
        };

        let now = Timestamp::now();
        if purchase.is_entitled(&now) {
            return Ok(true);
        }

        // Expired. Deny first; the flip is advisory and a failure here must
        // not turn a denial into an error.
        if purchase.is_past_expiry(&now) {
            match self.purchases.deactivate(&purchase.id).await {
                Ok(flipped) => {
                    if flipped {
                        tracing::info!(
                            purchase_id = %purchase.id,
                            user_id = %user_id,
                            "Purchase expired; deactivated"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        purchase_id = %purchase.id,
                        error = %e,
                        "Failed to deactivate expired purchase"
                    );
                }
            }
        }

        Ok(false)
    }
}
