pub mod inventory;
pub mod movements;
