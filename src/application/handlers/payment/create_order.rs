//! CreateOrderHandler - Command handler for initiating a checkout.

use std::sync::Arc;

use crate::domain::billing::{BillingError, CorrelationId, Currency, Money};
use crate::domain::foundation::{ContentId, UserId};
use crate::ports::{PaymentGateway, PendingOrder, PendingOrderStore, ProviderOrder};

/// Command to create a provider-side order for buyer approval.
///
/// Carries raw request input; validation happens in the handler, before any
/// provider call.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub user_id: String,
    pub set_id: String,
    pub amount: f64,
    /// ISO-4217 code. Absent means the configured default currency.
    pub currency: Option<String>,
}

/// Result of successful order creation.
#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub order: ProviderOrder,
}

/// Handler for initiating checkout with the payment provider.
///
/// Nothing durable exists locally until capture; the pending-order record is
/// a best-effort reconciliation breadcrumb, not a precondition for checkout.
pub struct CreateOrderHandler {
    gateway: Arc<dyn PaymentGateway>,
    pending_orders: Arc<dyn PendingOrderStore>,
    default_currency: Currency,
}

impl CreateOrderHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        pending_orders: Arc<dyn PendingOrderStore>,
        default_currency: Currency,
    ) -> Self {
        Self {
            gateway,
            pending_orders,
            default_currency,
        }
    }

    pub async fn handle(&self, cmd: CreateOrderCommand) -> Result<CreateOrderResult, BillingError> {
        // 1. Validate everything before touching the provider
        let user_id = UserId::new(cmd.user_id)?;
        let set_id = ContentId::new(cmd.set_id)?;
        let currency = match cmd.currency.as_deref() {
            Some(code) => Currency::parse(code)?,
            None => self.default_currency,
        };
        let amount = Money::from_request(cmd.amount, currency)?;

        // 2. Create the provider order, correlation embedded
        let correlation = CorrelationId::new(&user_id, &set_id);
        let order = self.gateway.create_order(&amount, &correlation).await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            amount = %amount,
            "Provider order created"
        );

        // 3. Record the pending order. Checkout already succeeded upstream,
        //    so a storage failure here must not fail the request.
        let pending = PendingOrder::new(order.id.clone(), correlation, amount);
        if let Err(e) = self.pending_orders.record(&pending).await {
            tracing::warn!(
                order_id = %order.id,
                error = %e,
                "Failed to record pending order; capture reconciliation will miss it"
            );
        }

        Ok(CreateOrderResult { order })
    }
}
