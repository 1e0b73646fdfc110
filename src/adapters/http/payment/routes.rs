//! Axum router configuration for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    capture_payment, check_access, create_order, list_my_purchases, PaymentAppState,
};

/// Create the payment API router.
///
/// # Routes
///
/// - `POST /create-order` - Create a provider order for checkout
/// - `POST /capture-payment` - Capture an approved order
/// - `GET /access/:content_id` - Check entitlement (requires authentication)
pub fn payment_routes() -> Router<PaymentAppState> {
    Router::new()
        .route("/create-order", post(create_order))
        .route("/capture-payment", post(capture_payment))
        .route("/access/:content_id", get(check_access))
}

/// Create the purchases API router.
///
/// # Routes
///
/// - `GET /my` - List the caller's current purchases (requires authentication)
pub fn purchases_routes() -> Router<PaymentAppState> {
    Router::new().route("/my", get(list_my_purchases))
}

/// Create the complete payment module router, suitable for mounting at the
/// API root.
pub fn payment_router() -> Router<PaymentAppState> {
    Router::new()
        .nest("/payment", payment_routes())
        .nest("/purchases", purchases_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::adapters::memory::{
        InMemoryCaptureLedger, InMemoryPendingOrderStore, InMemoryPurchaseRepository,
    };
    use crate::adapters::paypal::MockPaymentGateway;
    use crate::domain::billing::Currency;

    fn test_state() -> PaymentAppState {
        PaymentAppState {
            gateway: Arc::new(MockPaymentGateway::new()),
            purchase_repository: Arc::new(InMemoryPurchaseRepository::new()),
            pending_orders: Arc::new(InMemoryPendingOrderStore::new()),
            capture_ledger: Arc::new(InMemoryCaptureLedger::new()),
            default_currency: Currency::Rub,
            access_ttl_days: None,
        }
    }

    #[test]
    fn payment_routes_creates_router() {
        let router = payment_routes();
        let _: Router<()> = router.with_state(test_state());
    }

    #[test]
    fn purchases_routes_creates_router() {
        let router = purchases_routes();
        let _: Router<()> = router.with_state(test_state());
    }

    #[test]
    fn payment_router_creates_combined_router() {
        let router = payment_router();
        let _: Router<()> = router.with_state(test_state());
    }
}
