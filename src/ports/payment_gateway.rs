//! Payment gateway port for the external payment processor.
//!
//! Defines the contract for provider integrations (e.g. PayPal). An
//! implementation owns all network interaction: credential exchange, order
//! creation, and capture. It keeps no local state beyond a token cache.
//!
//! # Design
//!
//! - **Idempotent**: create carries the correlation id as an idempotency key,
//!   capture is keyed by the provider order id, so callers may safely retry.
//! - **Honest failures**: non-retryable errors are reported, never retried
//!   inside the implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::billing::{CorrelationId, Money};

/// Port for the external payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a provider-side order for buyer approval.
    ///
    /// The correlation id is embedded in the order and echoed back at
    /// capture time.
    async fn create_order(
        &self,
        amount: &Money,
        correlation: &CorrelationId,
    ) -> Result<ProviderOrder, GatewayError>;

    /// Captures an approved provider-side order.
    async fn capture_order(&self, order_id: &str) -> Result<CaptureOutcome, GatewayError>;
}

/// An ephemeral provider-side order handle. Not persisted by the provider
/// client; the id is returned to the caller for buyer approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOrder {
    /// Provider's order id.
    pub id: String,

    /// Provider's order status (e.g. `CREATED`).
    pub status: String,
}

/// Provider status of a capture attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureStatus {
    /// Payment captured; the only status that grants entitlement.
    Completed,

    /// Payment declined by the provider.
    Declined,

    /// Capture pending provider-side review.
    Pending,

    /// Any other provider status, carried verbatim.
    Other(String),
}

impl CaptureStatus {
    /// Parses the provider's status string.
    pub fn parse(s: &str) -> Self {
        match s {
            "COMPLETED" => CaptureStatus::Completed,
            "DECLINED" => CaptureStatus::Declined,
            "PENDING" => CaptureStatus::Pending,
            other => CaptureStatus::Other(other.to_string()),
        }
    }

    /// Returns the provider's status string.
    pub fn as_str(&self) -> &str {
        match self {
            CaptureStatus::Completed => "COMPLETED",
            CaptureStatus::Declined => "DECLINED",
            CaptureStatus::Pending => "PENDING",
            CaptureStatus::Other(s) => s,
        }
    }

    /// Whether this status grants entitlement.
    pub fn is_completed(&self) -> bool {
        matches!(self, CaptureStatus::Completed)
    }
}

impl std::fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a capture call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOutcome {
    /// Provider's transaction (capture) id. Becomes the purchase's unique
    /// `payment_id` when the status is completed.
    pub payment_id: String,

    /// Provider capture status.
    pub status: CaptureStatus,

    /// Raw correlation string echoed back by the provider. Decoded by the
    /// capture handler, not here: a gateway should not fail a completed
    /// capture over a string it merely transports.
    pub custom_id: String,

    /// Captured amount and currency.
    pub amount: Money,
}

/// Errors from payment gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Credential exchange with the provider failed.
    #[error("provider authentication failed: {0}")]
    Auth(String),

    /// Provider returned a non-success status; upstream status and body are
    /// carried for diagnosis.
    #[error("provider rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The bounded request timeout elapsed.
    #[error("provider request timed out after {0}s")]
    Timeout(u64),

    /// Network-level failure before a response was received.
    #[error("network error calling provider: {0}")]
    Network(String),

    /// Provider responded with a body this client cannot interpret.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Whether a retry with the same idempotency key may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Network(_) | GatewayError::Timeout(_))
    }
}
