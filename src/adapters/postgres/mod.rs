//! PostgreSQL adapters for the storage ports.

mod capture_ledger;
mod pending_order_store;
mod purchase_repository;

pub use capture_ledger::PostgresCaptureLedger;
pub use pending_order_store::PostgresPendingOrderStore;
pub use purchase_repository::PostgresPurchaseRepository;
