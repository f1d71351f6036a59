//! Document-backed record store
//!
//! Each record is one JSON document in [`TABLE_SONGS`], keyed by `songId`.
//! Counter increments run inside a single redb write transaction. redb admits
//! one writer at a time, so concurrent increments serialize and none is lost.

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};
use std::sync::Arc;

use super::{run_blocking, RecordStore};
use crate::database::{TABLE_SONGS, TABLE_SPOTIFY_INDEX};
use crate::error::StoreError;
use crate::model::{Channel, Record};

#[derive(Clone)]
pub struct DocumentStore {
    db: Arc<Database>,
}

impl DocumentStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Out-of-band creation of a record, counters included as given
    ///
    /// This function:
    /// 1. Serializes the record to its persisted JSON layout
    /// 2. Rejects the insert if the `songId` is already taken
    /// 3. Writes the document and its `spotifyId` index entry
    /// 4. Commits both in one transaction
    ///
    /// Not reachable over HTTP; used by seeding and tests.
    ///
    /// # Arguments
    ///
    /// * `record` - Record to create; its `id` becomes the document key
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Record and index entry committed
    /// * `Err(StoreError::AlreadyExists)` - A record with this `songId` exists, nothing written
    /// * `Err(StoreError::Backend)` - redb failure
    pub fn insert_record(&self, record: &Record) -> Result<(), StoreError> {
        // Serialize before opening the transaction
        let json = encode(record)?;

        // Begin a write transaction
        let write_txn = self.db.begin_write()?;
        {
            // Check if the songId is already taken
            let mut songs = write_txn.open_table(TABLE_SONGS)?;
            if songs.get(record.id.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists(record.id.clone()));
            }

            // Insert the document into the main table
            songs.insert(record.id.as_str(), json.as_str())?;

            // Last writer wins when two songs share an external reference
            let mut index = write_txn.open_table(TABLE_SPOTIFY_INDEX)?;
            index.insert(record.external_ref.as_str(), record.id.as_str())?;
        }

        // Commit the transaction to persist the data
        write_txn.commit()?;

        tracing::info!(song_id = %record.id, spotify_id = %record.external_ref, "Inserted song");
        Ok(())
    }

    fn lookup_blocking(db: &Database, id: &str) -> Result<Record, StoreError> {
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(TABLE_SONGS)?;

        let found = table.get(id)?;
        let record = match found {
            Some(value) => decode(id, value.value()),
            None => Err(StoreError::NotFound(id.to_string())),
        };
        record
    }

    /// Read, bump and write back inside one write transaction
    ///
    /// redb admits a single writer at a time, so no other increment can
    /// interleave between the read and the write.
    fn increment_blocking(db: &Database, id: &str, channel: Channel) -> Result<(), StoreError> {
        // Begin a write transaction; this also serializes concurrent increments
        let write_txn = db.begin_write()?;
        {
            // Resolve the channel field to the document key
            let song_id = resolve_song_id(&write_txn, id, channel)?;

            // Load, bump and store the document
            let mut songs = write_txn.open_table(TABLE_SONGS)?;
            let stored = songs.get(song_id.as_str())?.map(|guard| guard.value().to_string());
            let json = stored.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

            let mut record = decode(&song_id, &json)?;
            record.bump(channel);

            let updated = encode(&record)?;
            songs.insert(song_id.as_str(), updated.as_str())?;
        }

        // Commit the transaction to persist the new count
        write_txn.commit()?;

        Ok(())
    }
}

#[async_trait]
impl RecordStore for DocumentStore {
    async fn lookup(&self, id: &str) -> Result<Record, StoreError> {
        let id = id.to_owned();
        run_blocking(&self.db, move |db| Self::lookup_blocking(db, &id)).await
    }

    async fn increment_counter(&self, id: &str, channel: Channel) -> Result<(), StoreError> {
        let id = id.to_owned();
        run_blocking(&self.db, move |db| Self::increment_blocking(db, &id, channel)).await
    }
}

/// Maps the channel's addressing field back to the document key
fn resolve_song_id(write_txn: &WriteTransaction, id: &str, channel: Channel) -> Result<String, StoreError> {
    match channel {
        Channel::SongId => Ok(id.to_string()),
        Channel::SpotifyId => {
            let index = write_txn.open_table(TABLE_SPOTIFY_INDEX)?;
            let song_id = index.get(id)?.map(|guard| guard.value().to_string());
            song_id.ok_or_else(|| StoreError::NotFound(id.to_string()))
        }
    }
}

fn encode(record: &Record) -> Result<String, StoreError> {
    serde_json::to_string(record).map_err(|source| StoreError::Corrupt {
        id: record.id.clone(),
        source,
    })
}

fn decode(id: &str, json: &str) -> Result<Record, StoreError> {
    serde_json::from_str(json).map_err(|source| StoreError::Corrupt {
        id: id.to_string(),
        source,
    })
}
