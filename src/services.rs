pub mod inventory_service;
pub use inventory_service::InventoryService;
pub mod ledger_service;
pub use ledger_service::{MovementHistory, MovementLedger};
