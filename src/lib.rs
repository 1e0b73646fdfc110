//! Praktika payments backend.
//!
//! Purchase, payment-capture and entitlement subsystem for the Praktika
//! learning platform. Built with a hexagonal architecture:
//!
//! - `domain` - pure business types and rules (money, purchases, correlation)
//! - `ports` - trait interfaces the application depends on
//! - `adapters` - concrete implementations (PayPal, PostgreSQL, HTTP, in-memory)
//! - `application` - command and query handlers orchestrating the domain
//! - `config` - environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
