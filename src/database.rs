//! Database initialization and table definitions
//!
//! This module handles the setup of the embedded redb database shared by both
//! record store backends, plus loading of the out-of-band seed file.

use redb::{Database, TableDefinition};
use std::path::Path;

use crate::error::{StartupError, StoreError};
use crate::model::Record;

/// Document table used by the document backend
///
/// Key: `songId`
/// Value: JSON-serialized [`Record`] in the persisted layout
///
/// Example:
/// - Key: "hometown"
/// - Value: '{"songId":"hometown","name":"Hometown",...,"numClicks-songId":3}'
pub const TABLE_SONGS: TableDefinition<&str, &str> = TableDefinition::new("songs_v1");

/// Secondary index resolving a `spotifyId` back to the owning `songId`
///
/// The redirect channel addresses records by their external reference, so
/// its counter increment goes through this index.
pub const TABLE_SPOTIFY_INDEX: TableDefinition<&str, &str> = TableDefinition::new("spotify_index_v1");

/// Flat mapping used by the key-value backend
///
/// Key: identifier
/// Value: external reference
pub const TABLE_LINKS: TableDefinition<&str, &str> = TableDefinition::new("links_v1");

/// Initializes the embedded database and creates required tables
///
/// This function:
/// 1. Creates or opens the database file at the specified path
/// 2. Opens the songs table, the `spotifyId` index and the links table
/// 3. Commits the transaction to ensure tables are persisted
///
/// A failure here means the store is unavailable and startup must abort.
///
/// # Arguments
///
/// * `db_path` - File path where the database should be stored (e.g., "data.db")
///
/// # Returns
///
/// * `Ok(Database)` - Successfully initialized database instance
/// * `Err(StoreError::Backend)` - The file could not be opened or the tables created
///
/// # Example
///
/// ```no_run
/// # use songlink::database::init_db;
/// let db = init_db("data.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, StoreError> {
    // Create or open the database file
    let db = Database::create(db_path)?;

    // Begin a write transaction to create tables
    let write_txn = db.begin_write()?;
    {
        // Document backend: records plus the spotifyId -> songId index
        write_txn.open_table(TABLE_SONGS)?;
        write_txn.open_table(TABLE_SPOTIFY_INDEX)?;

        // Key-value backend
        write_txn.open_table(TABLE_LINKS)?;
    }

    // Commit the transaction to persist the table structures
    write_txn.commit()?;

    Ok(db)
}

/// Reads a JSON array of records in the persisted layout
///
/// # Arguments
///
/// * `path` - Location of the seed file
///
/// # Returns
///
/// * `Ok(Vec<Record>)` - Every record, missing metadata and counters defaulted
/// * `Err(StartupError::Seed)` - Malformed JSON or a record with an empty `songId`
///
/// ```json
/// [
///   { "songId": "hometown", "name": "Hometown", "spotifyId": "47x1Gh7yk5mblUWxWRdtjH" }
/// ]
/// ```
pub fn load_seed_file(path: &Path) -> Result<Vec<Record>, StartupError> {
    let raw = std::fs::read_to_string(path)?;
    let records: Vec<Record> = serde_json::from_str(&raw)
        .map_err(|err| StartupError::Seed(format!("{}: {}", path.display(), err)))?;

    if let Some(blank) = records.iter().find(|r| r.id.is_empty()) {
        return Err(StartupError::Seed(format!(
            "record with spotifyId `{}` has an empty songId",
            blank.external_ref
        )));
    }

    Ok(records)
}
