use redb::TableDefinition;

use crate::models::IngestMethod;

/// Inventory cache table: (lowercased bin, sequence) -> InventoryRecord (serialized)
///
/// Keying on the lowercased bin turns a case-insensitive prefix search into a
/// range scan; the sequence keeps duplicate (sku, bin) rows apart.
pub type InventoryTable = TableDefinition<'static, (&'static str, u64), &'static [u8]>;

/// Credentials table: CREDENTIALS_KEY -> CredentialsRecord (serialized)
pub const CREDENTIALS: TableDefinition<u64, &[u8]> = TableDefinition::new("app_settings");

/// The only key ever written to the credentials table
pub const CREDENTIALS_KEY: u64 = 1;

/// Cache filled by the direct query pipeline
pub const INVENTORY_QUERY_CACHE: InventoryTable = TableDefinition::new("inventory_query_cache");

/// Cache filled by the snapshot pipeline
pub const INVENTORY_SNAPSHOT_CACHE: InventoryTable =
    TableDefinition::new("inventory_snapshot_cache");

/// Cache table owned by an ingestion method
pub fn inventory_table(method: IngestMethod) -> InventoryTable {
    match method {
        IngestMethod::Query => INVENTORY_QUERY_CACHE,
        IngestMethod::Snapshot => INVENTORY_SNAPSHOT_CACHE,
    }
}
