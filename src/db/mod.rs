pub mod credentials;
pub mod inventory;
pub mod tables;

use redb::{Database, Error as RedbError};
use std::path::Path;
use std::sync::Arc;

pub use credentials::CredentialStore;
pub use inventory::InventoryCache;

/// Database handle type (Arc-wrapped for sharing across handlers and pipelines)
pub type Db = Arc<Database>;

/// Encoding used for every value stored in redb
pub const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
#[allow(clippy::result_large_err)]
pub fn open_database(path: impl AsRef<Path>) -> Result<Db, RedbError> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            tracing::error!("Failed to create database directory: {}", e);
            RedbError::Io(e)
        })?;
    }

    let db = Database::create(path)?;

    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(tables::CREDENTIALS)?;
        let _ = write_txn.open_table(tables::INVENTORY_QUERY_CACHE)?;
        let _ = write_txn.open_table(tables::INVENTORY_SNAPSHOT_CACHE)?;
    }
    write_txn.commit()?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}
