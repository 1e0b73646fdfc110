//! Billing-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Validation | 400 |
//! | ProviderAuth | 502 |
//! | ProviderRejected | 402 |
//! | ProviderUnavailable | 502 |
//! | MalformedCorrelation | 500 |
//! | CaptureUnrecorded | 500 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};
use crate::ports::GatewayError;

/// Errors raised by the purchase / capture / entitlement handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// Malformed checkout input (amount, currency, identifiers). Caller's
    /// fault; never retried.
    Validation { field: String, message: String },

    /// Provider credential exchange failed.
    ProviderAuth { reason: String },

    /// Provider returned a non-success status for create/capture.
    ProviderRejected { status: u16, body: String },

    /// Provider could not be reached (network failure or timeout).
    ProviderUnavailable { reason: String },

    /// The provider confirmed a capture but its correlation string could not
    /// be decoded. The payment id is carried for manual reconciliation.
    MalformedCorrelation { payment_id: String, raw: String },

    /// The provider confirmed a capture but local persistence failed. The
    /// most dangerous case: money captured, entitlement not recorded. Must
    /// reach an operator, never be swallowed.
    CaptureUnrecorded { payment_id: String, reason: String },

    /// Local storage or other infrastructure failure.
    Infrastructure(String),
}

impl BillingError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn provider_auth(reason: impl Into<String>) -> Self {
        BillingError::ProviderAuth {
            reason: reason.into(),
        }
    }

    pub fn provider_rejected(status: u16, body: impl Into<String>) -> Self {
        BillingError::ProviderRejected {
            status,
            body: body.into(),
        }
    }

    pub fn provider_unavailable(reason: impl Into<String>) -> Self {
        BillingError::ProviderUnavailable {
            reason: reason.into(),
        }
    }

    pub fn malformed_correlation(payment_id: impl Into<String>, raw: impl Into<String>) -> Self {
        BillingError::MalformedCorrelation {
            payment_id: payment_id.into(),
            raw: raw.into(),
        }
    }

    pub fn capture_unrecorded(payment_id: impl Into<String>, reason: impl Into<String>) -> Self {
        BillingError::CaptureUnrecorded {
            payment_id: payment_id.into(),
            reason: reason.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::Validation { .. } => ErrorCode::ValidationFailed,
            BillingError::ProviderAuth { .. } => ErrorCode::ProviderAuthFailed,
            BillingError::ProviderRejected { .. } => ErrorCode::ProviderRejected,
            BillingError::ProviderUnavailable { .. } => ErrorCode::ProviderRejected,
            BillingError::MalformedCorrelation { .. } | BillingError::CaptureUnrecorded { .. } => {
                ErrorCode::CaptureUnrecorded
            }
            BillingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a diagnostic message.
    pub fn message(&self) -> String {
        match self {
            BillingError::Validation { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            BillingError::ProviderAuth { reason } => {
                format!("Payment provider authentication failed: {}", reason)
            }
            BillingError::ProviderRejected { status, body } => {
                format!("Payment provider rejected the request ({}): {}", status, body)
            }
            BillingError::ProviderUnavailable { reason } => {
                format!("Payment provider unavailable: {}", reason)
            }
            BillingError::MalformedCorrelation { payment_id, raw } => format!(
                "Captured payment {} has an undecodable correlation '{}'; manual reconciliation required",
                payment_id, raw
            ),
            BillingError::CaptureUnrecorded { payment_id, reason } => format!(
                "Captured payment {} could not be recorded locally: {}; reconciliation required",
                payment_id, reason
            ),
            BillingError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BillingError::ProviderUnavailable { .. } | BillingError::Infrastructure(_)
        )
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BillingError {}

impl From<ValidationError> for BillingError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::EmptyField { field }
            | ValidationError::NotPositive { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field.clone(),
        };
        BillingError::Validation {
            field,
            message: err.to_string(),
        }
    }
}

impl From<GatewayError> for BillingError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Auth(reason) => BillingError::ProviderAuth { reason },
            GatewayError::Rejected { status, body } => {
                BillingError::ProviderRejected { status, body }
            }
            GatewayError::Timeout(secs) => BillingError::ProviderUnavailable {
                reason: format!("request timed out after {}s", secs),
            },
            GatewayError::Network(reason) => BillingError::ProviderUnavailable { reason },
            GatewayError::InvalidResponse(reason) => BillingError::ProviderUnavailable {
                reason: format!("invalid provider response: {}", reason),
            },
        }
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                BillingError::Validation {
                    field: err
                        .details
                        .get("field")
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string()),
                    message: err.message,
                }
            }
            _ => BillingError::Infrastructure(err.to_string()),
        }
    }
}

impl From<BillingError> for DomainError {
    fn from(err: BillingError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_validation_code() {
        let err = BillingError::validation("amount", "must be positive");
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert!(err.message().contains("amount"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn provider_rejected_keeps_upstream_status_and_body() {
        let err = BillingError::provider_rejected(422, "UNPROCESSABLE_ENTITY");
        assert_eq!(err.code(), ErrorCode::ProviderRejected);
        let msg = err.message();
        assert!(msg.contains("422"));
        assert!(msg.contains("UNPROCESSABLE_ENTITY"));
    }

    #[test]
    fn capture_unrecorded_names_the_payment() {
        let err = BillingError::capture_unrecorded("PAY-9", "insert failed");
        assert_eq!(err.code(), ErrorCode::CaptureUnrecorded);
        assert!(err.message().contains("PAY-9"));
        assert!(err.message().contains("reconciliation"));
    }

    #[test]
    fn malformed_correlation_is_a_reconciliation_case() {
        let err = BillingError::malformed_correlation("PAY-9", "garbage");
        assert_eq!(err.code(), ErrorCode::CaptureUnrecorded);
    }

    #[test]
    fn unavailable_and_infrastructure_are_retryable() {
        assert!(BillingError::provider_unavailable("connection reset").is_retryable());
        assert!(BillingError::infrastructure("pool exhausted").is_retryable());
        assert!(!BillingError::provider_auth("bad credentials").is_retryable());
        assert!(!BillingError::provider_rejected(400, "").is_retryable());
    }

    #[test]
    fn gateway_errors_convert() {
        let err: BillingError = GatewayError::Auth("401".to_string()).into();
        assert_eq!(err.code(), ErrorCode::ProviderAuthFailed);

        let err: BillingError = GatewayError::Rejected {
            status: 500,
            body: "oops".to_string(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::ProviderRejected);

        let err: BillingError = GatewayError::Timeout(30).into();
        assert!(err.is_retryable());
    }

    #[test]
    fn validation_error_conversion_keeps_field() {
        let err: BillingError = ValidationError::not_positive("amount", -5).into();
        assert!(matches!(
            err,
            BillingError::Validation { ref field, .. } if field == "amount"
        ));
    }

    #[test]
    fn converts_to_domain_error() {
        let err = BillingError::provider_auth("expired client secret");
        let domain_err: DomainError = err.clone().into();
        assert_eq!(domain_err.code, err.code());
    }
}
