use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata, TableHandle};

use super::{BINCODE_CONFIG, Db, tables};
use crate::constants::INSERT_BATCH_SIZE;
use crate::error::StoreError;
use crate::models::{IngestMethod, InventoryItem, InventoryRecord};

/// Flat fact table of (sku, bin, quantity) rows, one table per ingestion method
#[derive(Clone)]
pub struct InventoryCache {
    db: Db,
    batch_size: usize,
}

impl InventoryCache {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            batch_size: INSERT_BATCH_SIZE,
        }
    }

    /// Override the per-transaction insert limit
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Clear the method's table, then insert `items` in bounded batches
    ///
    /// The clear and each batch commit separately. A failing batch aborts the
    /// run and leaves the rows of earlier batches in place.
    pub async fn replace_all(
        &self,
        method: IngestMethod,
        items: Vec<InventoryItem>,
    ) -> Result<usize, StoreError> {
        let db = self.db.clone();
        let batch_size = self.batch_size;
        let table_def = tables::inventory_table(method);

        tokio::task::spawn_blocking(move || -> Result<usize, StoreError> {
            tracing::info!("Clearing table: {}", table_def.name());
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(table_def)?;
                table.retain(|_, _| false)?;
            }
            write_txn.commit()?;

            let total = items.len();
            let inserted_at = Utc::now().timestamp();
            let mut inserted = 0usize;
            tracing::info!("Inserting {} records into {}", total, table_def.name());

            let mut items = items.into_iter();
            let mut batch_number = 0;
            loop {
                let batch: Vec<InventoryItem> = items.by_ref().take(batch_size).collect();
                if batch.is_empty() {
                    break;
                }
                batch_number += 1;

                let write_txn = db.begin_write()?;
                {
                    let mut table = write_txn.open_table(table_def)?;
                    for item in batch {
                        let key = item.bin.to_lowercase();
                        let record = InventoryRecord::from_item(item, inserted_at);
                        let bytes = bincode::serde::encode_to_vec(&record, BINCODE_CONFIG)?;
                        table.insert((key.as_str(), inserted as u64), bytes.as_slice())?;
                        inserted += 1;
                    }
                }
                write_txn.commit().inspect_err(|e| {
                    tracing::error!("Error inserting batch {}: {}", batch_number, e);
                })?;

                tracing::debug!(
                    "Inserted batch {}: {}/{} records",
                    batch_number,
                    inserted,
                    total
                );
            }

            tracing::info!("Successfully inserted {} records into {}", inserted, table_def.name());
            Ok(inserted)
        })
        .await?
    }

    /// Rows whose bin starts with `prefix`, ignoring case, ascending by bin
    pub async fn find_by_prefix(
        &self,
        method: IngestMethod,
        prefix: &str,
    ) -> Result<Vec<InventoryRecord>, StoreError> {
        let db = self.db.clone();
        let needle = prefix.to_lowercase();
        let table_def = tables::inventory_table(method);

        let records = tokio::task::spawn_blocking(move || -> Result<_, StoreError> {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(table_def)?;

            let mut records = Vec::new();
            for entry in table.range((needle.as_str(), 0u64)..)? {
                let (key, value) = entry?;
                let (bin, _) = key.value();
                if !bin.starts_with(needle.as_str()) {
                    break;
                }
                let (record, _): (InventoryRecord, _) =
                    bincode::serde::decode_from_slice(value.value(), BINCODE_CONFIG)?;
                records.push(record);
            }

            Ok(records)
        })
        .await??;

        tracing::info!(
            "Found {} records in {} matching prefix: {}",
            records.len(),
            method,
            prefix
        );

        Ok(records)
    }

    /// Number of rows currently cached for a method
    pub async fn count(&self, method: IngestMethod) -> Result<u64, StoreError> {
        let db = self.db.clone();
        let table_def = tables::inventory_table(method);

        tokio::task::spawn_blocking(move || -> Result<u64, StoreError> {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(table_def)?;
            Ok(table.len()?)
        })
        .await?
    }
}
