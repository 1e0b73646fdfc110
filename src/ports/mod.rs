//! Ports: contracts between the application core and the outside world.

mod capture_ledger;
mod payment_gateway;
mod pending_order_store;
mod purchase_repository;

pub use capture_ledger::{CaptureAck, CaptureLedger};
pub use payment_gateway::{
    CaptureOutcome, CaptureStatus, GatewayError, PaymentGateway, ProviderOrder,
};
pub use pending_order_store::{PendingOrder, PendingOrderStore};
pub use purchase_repository::{InsertOutcome, PurchaseRepository};
