//! In-memory adapters. Used by tests and local development; production wires
//! the Postgres adapters instead.

mod capture_ledger;
mod pending_order_store;
mod purchase_repository;

pub use capture_ledger::InMemoryCaptureLedger;
pub use pending_order_store::InMemoryPendingOrderStore;
pub use purchase_repository::InMemoryPurchaseRepository;
