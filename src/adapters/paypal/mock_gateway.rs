//! In-memory mock of the payment gateway for tests and local development.
//!
//! Orders are held in memory; captures are idempotent per order, mirroring
//! the real provider's behavior of resolving one payment per order. Failure
//! injection covers the scenarios handlers must survive.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::{CorrelationId, Money};
use crate::ports::{CaptureOutcome, CaptureStatus, GatewayError, PaymentGateway, ProviderOrder};

struct MockOrder {
    amount: Money,
    custom_id: String,
    outcome: Option<CaptureOutcome>,
}

/// Scriptable in-memory payment gateway.
pub struct MockPaymentGateway {
    orders: Mutex<HashMap<String, MockOrder>>,
    capture_status: Mutex<CaptureStatus>,
    custom_id_override: Mutex<Option<String>>,
    fail_create_with: Mutex<Option<GatewayError>>,
    fail_capture_with: Mutex<Option<GatewayError>>,
    order_seq: AtomicU64,
    payment_seq: AtomicU64,
    create_calls: AtomicU64,
    capture_calls: AtomicU64,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(HashMap::new()),
            capture_status: Mutex::new(CaptureStatus::Completed),
            custom_id_override: Mutex::new(None),
            fail_create_with: Mutex::new(None),
            fail_capture_with: Mutex::new(None),
            order_seq: AtomicU64::new(1),
            payment_seq: AtomicU64::new(1),
            create_calls: AtomicU64::new(0),
            capture_calls: AtomicU64::new(0),
        }
    }

    /// Sets the status the next (and subsequent) captures will report.
    pub fn set_capture_status(&self, status: CaptureStatus) {
        *self.capture_status.lock().unwrap() = status;
    }

    /// Makes subsequent captures echo the given correlation string instead
    /// of the one the order was created with.
    pub fn override_capture_custom_id(&self, custom_id: impl Into<String>) {
        *self.custom_id_override.lock().unwrap() = Some(custom_id.into());
    }

    /// Fails the next create_order call with the given error.
    pub fn fail_next_create(&self, err: GatewayError) {
        *self.fail_create_with.lock().unwrap() = Some(err);
    }

    /// Fails the next capture_order call with the given error.
    pub fn fail_next_capture(&self, err: GatewayError) {
        *self.fail_capture_with.lock().unwrap() = Some(err);
    }

    /// Number of create_order calls that reached the mock.
    pub fn create_calls(&self) -> u64 {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of capture_order calls that reached the mock.
    pub fn capture_calls(&self) -> u64 {
        self.capture_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_order(
        &self,
        amount: &Money,
        correlation: &CorrelationId,
    ) -> Result<ProviderOrder, GatewayError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.fail_create_with.lock().unwrap().take() {
            return Err(err);
        }

        let order_id = format!("MOCK-ORDER-{}", self.order_seq.fetch_add(1, Ordering::SeqCst));
        self.orders.lock().unwrap().insert(
            order_id.clone(),
            MockOrder {
                amount: *amount,
                custom_id: correlation.as_str().to_string(),
                outcome: None,
            },
        );

        Ok(ProviderOrder {
            id: order_id,
            status: "CREATED".to_string(),
        })
    }

    async fn capture_order(&self, order_id: &str) -> Result<CaptureOutcome, GatewayError> {
        self.capture_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.fail_capture_with.lock().unwrap().take() {
            return Err(err);
        }

        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(order_id).ok_or(GatewayError::Rejected {
            status: 404,
            body: "RESOURCE_NOT_FOUND".to_string(),
        })?;

        // One payment per order: repeated captures return the same outcome.
        if let Some(outcome) = &order.outcome {
            return Ok(outcome.clone());
        }

        let custom_id = self
            .custom_id_override
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| order.custom_id.clone());
        let outcome = CaptureOutcome {
            payment_id: format!("MOCK-PAY-{}", self.payment_seq.fetch_add(1, Ordering::SeqCst)),
            status: self.capture_status.lock().unwrap().clone(),
            custom_id,
            amount: order.amount,
        };
        order.outcome = Some(outcome.clone());
        Ok(outcome)
    }
}
