//! PayPal REST adapter for the payment gateway port.

mod api_types;
mod gateway;
mod mock_gateway;

pub use gateway::{PayPalConfig, PayPalGateway};
pub use mock_gateway::MockPaymentGateway;
