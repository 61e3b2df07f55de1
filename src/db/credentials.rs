use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};

use super::{BINCODE_CONFIG, Db, tables};
use crate::error::{Result, StoreError};
use crate::models::{Credentials, CredentialsRecord};

/// Single-record store for the upstream refresh token and warehouse id
#[derive(Clone)]
pub struct CredentialStore {
    db: Db,
}

impl CredentialStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Current credentials, or `None` when nothing has been configured
    pub async fn get(&self) -> std::result::Result<Option<Credentials>, StoreError> {
        let db = self.db.clone();

        let record = tokio::task::spawn_blocking(
            move || -> std::result::Result<Option<CredentialsRecord>, StoreError> {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(tables::CREDENTIALS)?;

                let record = table
                    .get(tables::CREDENTIALS_KEY)?
                    .map(|bytes| {
                        bincode::serde::decode_from_slice::<CredentialsRecord, _>(
                            bytes.value(),
                            BINCODE_CONFIG,
                        )
                    })
                    .transpose()?
                    .map(|(record, _)| record);

                Ok(record)
            },
        )
        .await
        .map_err(StoreError::from)??;

        if record.is_none() {
            tracing::debug!("No credentials found in database");
        }

        Ok(record
            .filter(|r| !r.refresh_token.is_empty() && !r.warehouse_id.is_empty())
            .map(Credentials::from))
    }

    /// Replace any stored credentials with a new set
    ///
    /// Input is validated before the database is touched. The clear and the
    /// insert share one write transaction, so readers never see two records.
    pub async fn save(&self, refresh_token: &str, warehouse_id: &str) -> Result<Credentials> {
        let (refresh_token, warehouse_id) = Credentials::validate(refresh_token, warehouse_id)?;

        tracing::info!("Saving credentials for warehouse {}", warehouse_id);

        let record = CredentialsRecord {
            refresh_token,
            warehouse_id,
            updated_at: Utc::now().timestamp(),
        };
        let db = self.db.clone();
        let to_store = record.clone();

        tokio::task::spawn_blocking(move || -> std::result::Result<(), StoreError> {
            let bytes = bincode::serde::encode_to_vec(&to_store, BINCODE_CONFIG)?;

            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(tables::CREDENTIALS)?;
                table.retain(|_, _| false)?;
                table.insert(tables::CREDENTIALS_KEY, bytes.as_slice())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
        .map_err(StoreError::from)??;

        tracing::info!("Credentials saved successfully");

        Ok(record.into())
    }

    /// Delete all stored credentials
    pub async fn clear(&self) -> std::result::Result<(), StoreError> {
        let db = self.db.clone();

        tokio::task::spawn_blocking(move || -> std::result::Result<(), StoreError> {
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(tables::CREDENTIALS)?;
                table.retain(|_, _| false)?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await??;

        tracing::info!("Credentials cleared successfully");

        Ok(())
    }
}
