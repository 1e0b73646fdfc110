//! HTTP handlers for payment and entitlement endpoints.
//!
//! These handlers connect Axum routes to application layer command/query
//! handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::payment::{
    CapturePaymentCommand, CapturePaymentHandler, CaptureResult, CheckAccessHandler,
    CreateOrderCommand, CreateOrderHandler, ListPurchasesHandler,
};
use crate::domain::billing::{BillingError, Currency};
use crate::domain::foundation::{ContentId, UserId};
use crate::ports::{CaptureLedger, PaymentGateway, PendingOrderStore, PurchaseRepository};

use super::dto::{
    AccessCheckResponse, CapturePaymentRequest, CapturePaymentResponse, CreateOrderRequest,
    CreateOrderResponse, ErrorResponse, PurchaseDto, PurchasesResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; everything inside is Arc-wrapped.
#[derive(Clone)]
pub struct PaymentAppState {
    pub gateway: Arc<dyn PaymentGateway>,
    pub purchase_repository: Arc<dyn PurchaseRepository>,
    pub pending_orders: Arc<dyn PendingOrderStore>,
    pub capture_ledger: Arc<dyn CaptureLedger>,
    /// Currency applied when a checkout request names none.
    pub default_currency: Currency,
    /// Days of access per purchase; absent means no time expiry.
    pub access_ttl_days: Option<u32>,
}

impl PaymentAppState {
    /// Create handlers on demand from the shared state.
    pub fn create_order_handler(&self) -> CreateOrderHandler {
        CreateOrderHandler::new(
            self.gateway.clone(),
            self.pending_orders.clone(),
            self.default_currency,
        )
    }

    pub fn capture_payment_handler(&self) -> CapturePaymentHandler {
        CapturePaymentHandler::new(
            self.gateway.clone(),
            self.purchase_repository.clone(),
            self.capture_ledger.clone(),
            self.pending_orders.clone(),
            self.access_ttl_days,
        )
    }

    pub fn check_access_handler(&self) -> CheckAccessHandler {
        CheckAccessHandler::new(self.purchase_repository.clone())
    }

    pub fn list_purchases_handler(&self) -> ListPurchasesHandler {
        ListPurchasesHandler::new(self.purchase_repository.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context (would come from auth middleware in production)
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user context extracted from the request.
///
/// In production this would come from JWT/session middleware. For now a
/// header-based extraction serves development and testing.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user_id = parts
                .headers
                .get("X-User-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| UserId::new(s).ok())
                .ok_or(AuthenticationRequired)?;

            Ok(AuthenticatedUser { user_id })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /payment/create-order - Create a provider order for checkout
pub async fn create_order(
    State(state): State<PaymentAppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.create_order_handler();
    let cmd = CreateOrderCommand {
        user_id: request.user_id,
        set_id: request.set_id,
        amount: request.amount,
        currency: request.currency,
    };

    let result = handler.handle(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse::from(result.order)),
    ))
}

/// POST /payment/capture-payment - Capture an approved order
pub async fn capture_payment(
    State(state): State<PaymentAppState>,
    Json(request): Json<CapturePaymentRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.capture_payment_handler();
    let cmd = CapturePaymentCommand {
        order_id: request.order_id,
    };

    let response = match handler.handle(cmd).await? {
        CaptureResult::Completed { purchase, .. } => CapturePaymentResponse {
            status: "COMPLETED".to_string(),
            payment_id: purchase.payment_id.clone(),
            purchase: Some(PurchaseDto::from(purchase)),
        },
        CaptureResult::NotCompleted { status, payment_id } => CapturePaymentResponse {
            status: status.as_str().to_string(),
            payment_id,
            purchase: None,
        },
    };

    Ok(Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /payment/access/{content_id} - Check entitlement to a piece of content
pub async fn check_access(
    State(state): State<PaymentAppState>,
    user: AuthenticatedUser,
    Path(content_id): Path<String>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let content_id =
        ContentId::new(content_id).map_err(|e| PaymentApiError(BillingError::from(e)))?;

    let handler = state.check_access_handler();
    let has_access = handler.handle(&user.user_id, &content_id).await?;

    Ok(Json(AccessCheckResponse { has_access }))
}

/// GET /purchases/my - List the caller's current purchases
pub async fn list_my_purchases(
    State(state): State<PaymentAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.list_purchases_handler();
    let purchases = handler.handle(&user.user_id).await?;

    Ok(Json(PurchasesResponse {
        purchases: purchases.into_iter().map(PurchaseDto::from).collect(),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
pub struct PaymentApiError(BillingError);

impl From<BillingError> for PaymentApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            BillingError::Validation { .. } => StatusCode::BAD_REQUEST,
            BillingError::ProviderRejected { .. } => StatusCode::PAYMENT_REQUIRED,
            BillingError::ProviderAuth { .. } | BillingError::ProviderUnavailable { .. } => {
                StatusCode::BAD_GATEWAY
            }
            BillingError::MalformedCorrelation { .. }
            | BillingError::CaptureUnrecorded { .. }
            | BillingError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        (status, Json(body)).into_response()
    }
}
