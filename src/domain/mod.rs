//! Domain layer: value objects and aggregates, free of infrastructure.

pub mod billing;
pub mod foundation;
