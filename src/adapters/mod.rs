//! Adapters: concrete implementations of the ports.

pub mod http;
pub mod memory;
pub mod paypal;
pub mod postgres;
