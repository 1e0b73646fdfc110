//! Wire types for the PayPal REST API.
//!
//! Only the fields this client reads or writes are modeled; everything else
//! in the provider's responses is ignored.

use serde::{Deserialize, Serialize};

/// Response of the client-credentials token exchange.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// Amount payload used in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AmountPayload {
    pub currency_code: String,
    pub value: String,
}

/// Body of `POST /v2/checkout/orders`.
#[derive(Debug, Serialize)]
pub(crate) struct OrderRequest {
    pub intent: &'static str,
    pub purchase_units: Vec<PurchaseUnitRequest>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PurchaseUnitRequest {
    pub amount: AmountPayload,
    pub custom_id: String,
}

/// Response of `POST /v2/checkout/orders`.
#[derive(Debug, Deserialize)]
pub(crate) struct OrderResponse {
    pub id: String,
    pub status: String,
}

/// Response of `POST /v2/checkout/orders/{id}/capture`.
#[derive(Debug, Deserialize)]
pub(crate) struct CaptureResponse {
    pub status: Option<String>,
    #[serde(default)]
    pub purchase_units: Vec<PurchaseUnitResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PurchaseUnitResponse {
    pub payments: PaymentsPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentsPayload {
    #[serde(default)]
    pub captures: Vec<CapturePayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CapturePayload {
    pub id: String,
    pub status: String,
    pub custom_id: Option<String>,
    pub amount: AmountPayload,
}
