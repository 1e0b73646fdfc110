//! Payment and entitlement command/query handlers.

mod capture_payment;
mod check_access;
mod create_order;
mod list_purchases;

pub use capture_payment::{CapturePaymentCommand, CapturePaymentHandler, CaptureResult};
pub use check_access::CheckAccessHandler;
pub use create_order::{CreateOrderCommand, CreateOrderHandler, CreateOrderResult};
pub use list_purchases::ListPurchasesHandler;
