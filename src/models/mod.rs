pub mod credentials;
pub mod inventory;

pub use credentials::{Credentials, CredentialsRecord};
pub use inventory::{IngestMethod, InventoryItem, InventoryRecord};
