//! Key-value record store
//!
//! A flat `identifier -> externalRef` mapping with no metadata and no access
//! counters. Used when only the redirect target matters.

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable};
use std::sync::Arc;

use super::{run_blocking, RecordStore};
use crate::database::TABLE_LINKS;
use crate::error::StoreError;
use crate::model::{Channel, Record};

#[derive(Clone)]
pub struct KeyValueStore {
    db: Arc<Database>,
}

impl KeyValueStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Out-of-band creation of a mapping
    ///
    /// # Arguments
    ///
    /// * `id` - Public identifier
    /// * `external_ref` - Value appended to the redirect base
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Mapping committed
    /// * `Err(StoreError::AlreadyExists)` - The identifier is already mapped
    pub fn insert_link(&self, id: &str, external_ref: &str) -> Result<(), StoreError> {
        // Begin a write transaction
        let write_txn = self.db.begin_write()?;
        {
            // Check if the identifier is already taken
            let mut links = write_txn.open_table(TABLE_LINKS)?;
            if links.get(id)?.is_some() {
                return Err(StoreError::AlreadyExists(id.to_string()));
            }
            links.insert(id, external_ref)?;
        }

        // Commit the transaction to persist the mapping
        write_txn.commit()?;

        tracing::info!(song_id = %id, spotify_id = %external_ref, "Inserted link");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for KeyValueStore {
    async fn lookup(&self, id: &str) -> Result<Record, StoreError> {
        let id = id.to_owned();
        run_blocking(&self.db, move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(TABLE_LINKS)?;

            let external_ref = table.get(id.as_str())?.map(|guard| guard.value().to_string());
            match external_ref {
                Some(external_ref) => Ok(Record::new(id, external_ref)),
                None => Err(StoreError::NotFound(id)),
            }
        })
        .await
    }

    async fn increment_counter(&self, _id: &str, _channel: Channel) -> Result<(), StoreError> {
        Err(StoreError::Unsupported)
    }

    fn tracks_clicks(&self) -> bool {
        false
    }
}
