//! Record store abstraction
//!
//! The resolution service only sees [`RecordStore`]; which backend sits behind
//! it is a startup decision driven by [`BackendKind`].

pub mod document;
pub mod key_value;

pub use document::DocumentStore;
pub use key_value::KeyValueStore;

use async_trait::async_trait;
use redb::Database;
use std::sync::Arc;

use crate::config::BackendKind;
use crate::error::StoreError;
use crate::model::{Channel, Record};

#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Exact-match read by identifier.
    /// Returns `Err(NotFound)` on a miss, never a partially populated record.
    async fn lookup(&self, id: &str) -> Result<Record, StoreError>;

    /// Atomically advances the channel's counter on the record whose channel
    /// field equals `id`. Reports `Err(NotFound)` when nothing matches and
    /// never creates a record.
    async fn increment_counter(&self, id: &str, channel: Channel) -> Result<(), StoreError>;

    /// Whether [`increment_counter`](Self::increment_counter) can ever succeed
    fn tracks_clicks(&self) -> bool {
        true
    }
}

/// Builds the configured backend on top of an opened database
pub fn open(kind: BackendKind, db: Arc<Database>) -> Arc<dyn RecordStore> {
    match kind {
        BackendKind::Document => Arc::new(DocumentStore::new(db)),
        BackendKind::KeyValue => Arc::new(KeyValueStore::new(db)),
    }
}

/// Inserts seed records into the configured backend
///
/// The backend is opened once and the whole batch runs on the blocking pool,
/// one write transaction per record. Ids that already exist are skipped, so
/// seeding the same file on every restart is harmless.
///
/// # Arguments
///
/// * `kind` - backend the records are written into
/// * `db` - opened database shared with the serving store
/// * `records` - records in the persisted layout
///
/// # Returns
///
/// * `Ok(usize)` - number of records actually inserted
/// * `Err(StoreError)` - the first backend failure; earlier inserts stay committed
pub async fn seed(kind: BackendKind, db: &Arc<Database>, records: Vec<Record>) -> Result<usize, StoreError> {
    let db = Arc::clone(db);

    tokio::task::spawn_blocking(move || {
        // Open the backend once for the whole batch
        let insert: Box<dyn Fn(&Record) -> Result<(), StoreError>> = match kind {
            BackendKind::Document => {
                let store = DocumentStore::new(db);
                Box::new(move |record: &Record| store.insert_record(record))
            }
            BackendKind::KeyValue => {
                let store = KeyValueStore::new(db);
                Box::new(move |record: &Record| store.insert_link(&record.id, &record.external_ref))
            }
        };

        let mut inserted = 0;
        for record in &records {
            match insert(record) {
                Ok(()) => inserted += 1,
                Err(StoreError::AlreadyExists(id)) => {
                    tracing::debug!(song_id = %id, "Seed record already present, skipping");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(inserted)
    })
    .await?
}

/// Runs a synchronous redb operation on the blocking pool
pub(crate) async fn run_blocking<T, F>(db: &Arc<Database>, op: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
{
    let db = Arc::clone(db);
    tokio::task::spawn_blocking(move || op(&db)).await?
}
