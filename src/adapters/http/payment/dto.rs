//! HTTP DTOs (Data Transfer Objects) for payment endpoints.
//!
//! These types define the JSON request/response structure for the payment
//! API. Field names are camelCase to match the web client.

use serde::{Deserialize, Serialize};

use crate::domain::billing::Purchase;
use crate::ports::ProviderOrder;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a provider order for checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Amount in major currency units, at most two decimal places.
    pub amount: f64,
    /// ISO-4217 code. Absent means the configured default.
    #[serde(default)]
    pub currency: Option<String>,
    /// Buyer's identifier.
    pub user_id: String,
    /// Exercise set being purchased.
    pub set_id: String,
}

/// Request to capture an approved order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturePaymentRequest {
    pub order_id: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for a created provider order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    /// Provider's order id, used by the client to drive buyer approval.
    pub id: String,
    /// Provider's order status (e.g. `CREATED`).
    pub status: String,
}

impl From<ProviderOrder> for CreateOrderResponse {
    fn from(order: ProviderOrder) -> Self {
        Self {
            id: order.id,
            status: order.status,
        }
    }
}

/// Response for a capture attempt.
///
/// `purchase` is present only when the provider reported `COMPLETED`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturePaymentResponse {
    /// Provider capture status.
    pub status: String,
    /// Provider's transaction id.
    pub payment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase: Option<PurchaseDto>,
}

/// Response for an entitlement check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCheckResponse {
    pub has_access: bool,
}

/// A purchase as rendered to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDto {
    pub id: String,
    pub item_type: String,
    pub content_id: String,
    /// Two-decimal amount string (e.g. `"1000.00"`).
    pub amount: String,
    /// ISO-4217 currency code.
    pub currency: String,
    pub payment_method: String,
    /// ISO 8601; null means access does not expire.
    pub expires_at: Option<String>,
    /// ISO 8601.
    pub created_at: String,
}

impl From<Purchase> for PurchaseDto {
    fn from(purchase: Purchase) -> Self {
        Self {
            id: purchase.id.to_string(),
            item_type: purchase.content_ref.item_type().to_string(),
            content_id: purchase.content_ref.content_id().to_string(),
            amount: purchase.amount.to_decimal_string(),
            currency: purchase.amount.currency().code().to_string(),
            payment_method: purchase.payment_method,
            expires_at: purchase
                .expires_at
                .map(|t| t.as_datetime().to_rfc3339()),
            created_at: purchase.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Response listing a user's current purchases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchasesResponse {
    pub purchases: Vec<PurchaseDto>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Error DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Error envelope returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable code for programmatic handling.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
