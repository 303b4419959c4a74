pub mod store;
pub use store::{InventoryStore, ItemWriteTx};
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod memory_repo;
pub use memory_repo::InMemoryInventoryStore;
