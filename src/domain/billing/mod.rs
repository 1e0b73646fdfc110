//! Billing domain: purchases, money, and the provider correlation format.

mod content_ref;
mod correlation;
mod errors;
mod money;
mod purchase;

pub use content_ref::{ContentRef, ItemType};
pub use correlation::CorrelationId;
pub use errors::BillingError;
pub use money::{Currency, Money};
pub use purchase::{Purchase, DEFAULT_PAYMENT_METHOD};
