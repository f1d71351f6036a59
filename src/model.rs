//! Data models for the song link resolver
//!
//! This module defines the persisted record layout, the access channels that
//! accrue click counters, and the request-scoped payload handed to views.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One resolvable song/link entry as stored by the document backend
///
/// The serialized field names are the persisted layout:
///
/// ```json
/// {
///   "songId": "hometown",
///   "name": "Hometown",
///   "artist": "",
///   "cover": "",
///   "spotifyId": "47x1Gh7yk5mblUWxWRdtjH",
///   "numClicks-songId": 0,
///   "numClicks-spotifyId": 0
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Public identifier used in `/s/{id}` URLs
    #[serde(rename = "songId")]
    pub id: String,

    #[serde(rename = "name", default)]
    pub display_name: String,

    #[serde(default)]
    pub artist: String,

    #[serde(rename = "cover", default)]
    pub cover_url: String,

    /// Identifier appended to the redirect base to build the outbound URL
    #[serde(rename = "spotifyId")]
    pub external_ref: String,

    #[serde(rename = "numClicks-songId", default)]
    pub song_clicks: u64,

    #[serde(rename = "numClicks-spotifyId", default)]
    pub spotify_clicks: u64,
}

impl Record {
    /// Builds a record with zeroed counters and blank presentation metadata
    pub fn new(id: impl Into<String>, external_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external_ref: external_ref.into(),
            ..Self::default()
        }
    }

    pub fn with_metadata(
        mut self,
        display_name: impl Into<String>,
        artist: impl Into<String>,
        cover_url: impl Into<String>,
    ) -> Self {
        self.display_name = display_name.into();
        self.artist = artist.into();
        self.cover_url = cover_url.into();
        self
    }

    /// Current counter value for a channel
    pub fn clicks(&self, channel: Channel) -> u64 {
        match channel {
            Channel::SongId => self.song_clicks,
            Channel::SpotifyId => self.spotify_clicks,
        }
    }

    /// Advances one counter by exactly one, saturating instead of wrapping
    pub fn bump(&mut self, channel: Channel) {
        let counter = match channel {
            Channel::SongId => &mut self.song_clicks,
            Channel::SpotifyId => &mut self.spotify_clicks,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Access path through which a record was reached
///
/// Each channel names the record field it addresses records by, and owns a
/// `numClicks-<channel>` counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Song landing page, `GET /s/{songId}`
    SongId,
    /// Raw redirect link, `GET /spotify?id=...`
    SpotifyId,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::SongId => "songId",
            Channel::SpotifyId => "spotifyId",
        }
    }

    /// Name of the persisted counter field
    pub fn counter_field(self) -> &'static str {
        match self {
            Channel::SongId => "numClicks-songId",
            Channel::SpotifyId => "numClicks-spotifyId",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-scoped values a view is rendered against
///
/// Templates see the fields as `Name`, `Artist`, `Cover` and `Spotify`.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ViewPayload {
    pub name: String,
    pub artist: String,
    pub cover: String,
    pub spotify: String,
}

impl From<&Record> for ViewPayload {
    fn from(record: &Record) -> Self {
        Self {
            name: record.display_name.clone(),
            artist: record.artist.clone(),
            cover: record.cover_url.clone(),
            spotify: record.external_ref.clone(),
        }
    }
}

/// Query parameters carrying an identifier
///
/// Extracted from the raw query pairs so a repeated key does not reject the
/// request: the first `id` wins.
///
/// # Example
/// Query string: `?id=4PkWff16v14sACvFBrKtI0`
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IdParams {
    pub id: Option<String>,
}

impl IdParams {
    /// Picks the first `id` out of decoded query pairs
    ///
    /// # Arguments
    ///
    /// * `pairs` - decoded `key=value` pairs in query string order
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let id = pairs.into_iter().find(|(key, _)| key == "id").map(|(_, value)| value);
        Self { id }
    }
}
