//! Core data model for the music library.
//!
//! [`TrackRecord`] is the unit of identity shared by the cover resolver and
//! the random selection buffer. A record starts out holding only an id and
//! is filled from the media index by [`TrackRecord::query`]. An id equal to
//! [`UNPOPULATED_ID`] means the record carries no valid metadata and must be
//! treated as absent.
//!
//! [`TrackRow`] is the raw row shape returned by a [`MediaIndex`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::{debug, warn};

use crate::cover::{CoverResolver, SharedCover};
use crate::error::Result;
use crate::library::MediaIndex;

/// Sentinel id for a record that is not (or no longer) backed by the index.
pub const UNPOPULATED_ID: i64 = -1;

bitflags! {
    /// Per-record flags. Not part of the wire form.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TrackFlags: u32 {
        /// The track was picked by random selection
        const RANDOM = 0x1;
    }
}

/// A track row as stored in the media index.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TrackRow {
    pub id: i64,
    pub album_id: i64,
    pub path: String,
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
}

/// A track backed by the media index.
///
/// Field order matters: [`encode`](Self::encode) writes the six metadata
/// fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Id of this track in the index, or [`UNPOPULATED_ID`]
    pub id: i64,
    /// Id of the owning album
    pub album_id: i64,
    /// Location of the audio file
    pub path: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    #[serde(skip)]
    pub flags: TrackFlags,
}

impl TrackRecord {
    /// Create an unpopulated record for `id`. Call [`query`](Self::query)
    /// to fill the remaining fields.
    pub fn new(id: i64) -> Self {
        Self::with_flags(id, TrackFlags::empty())
    }

    /// Create an unpopulated record for `id` carrying `flags`.
    pub fn with_flags(id: i64, flags: TrackFlags) -> Self {
        Self {
            id,
            album_id: 0,
            path: None,
            title: None,
            album: None,
            artist: None,
            flags,
        }
    }

    /// Id of `track`, or 0 when there is no track.
    pub fn id_of(track: Option<&TrackRecord>) -> i64 {
        track.map_or(0, |t| t.id)
    }

    /// Whether the id refers to an index entry.
    pub fn is_valid(&self) -> bool {
        self.id != UNPOPULATED_ID
    }

    /// Whether metadata has been filled in from the index.
    pub fn is_populated(&self) -> bool {
        self.is_valid() && self.path.is_some()
    }

    /// Overwrite every field from an index row. Flags are kept.
    pub fn populate(&mut self, row: TrackRow) {
        self.id = row.id;
        self.album_id = row.album_id;
        self.path = Some(row.path);
        self.title = row.title;
        self.album = row.album;
        self.artist = row.artist;
    }

    /// Copy all fields, flags included, from `other`.
    ///
    /// Copying from `None` only demotes this record to [`UNPOPULATED_ID`].
    pub fn copy_from(&mut self, other: Option<&TrackRecord>) {
        match other {
            Some(other) => self.clone_from(other),
            None => self.id = UNPOPULATED_ID,
        }
    }

    /// Fill this record from the index if needed.
    ///
    /// Returns `true` when the record holds valid metadata afterwards. When
    /// the id no longer exists (or the lookup fails) the id is demoted to
    /// [`UNPOPULATED_ID`] and `false` is returned.
    pub async fn query(&mut self, index: &dyn MediaIndex, force: bool) -> bool {
        if self.is_populated() && !force {
            return true;
        }
        if !self.is_valid() {
            return false;
        }

        let id = self.id;
        self.id = UNPOPULATED_ID;

        match index.track_by_id(id).await {
            Ok(Some(row)) => self.populate(row),
            Ok(None) => debug!(id, "Track no longer present in index"),
            Err(e) => warn!(id, error = %e, "Track lookup failed"),
        }

        self.is_valid()
    }

    /// Cover art for this track, via `resolver`.
    pub async fn cover(&self, resolver: &CoverResolver) -> Option<SharedCover> {
        resolver.resolve_track(self).await
    }

    /// Encode the six metadata fields (id, album id, path, title, album,
    /// artist) in that order. Flags are not written.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a record written by [`encode`](Self::encode). Flags come back
    /// empty.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl From<TrackRow> for TrackRecord {
    fn from(row: TrackRow) -> Self {
        let mut record = TrackRecord::new(row.id);
        record.populate(row);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::mocks::MockIndex;
    use crate::test_utils::mock_track_row;

    #[test]
    fn test_new_record_is_unpopulated() {
        let track = TrackRecord::new(7);
        assert_eq!(track.id, 7);
        assert!(track.is_valid());
        assert!(!track.is_populated());
        assert!(track.flags.is_empty());
    }

    #[test]
    fn test_id_of() {
        assert_eq!(TrackRecord::id_of(None), 0);
        assert_eq!(TrackRecord::id_of(Some(&TrackRecord::new(12))), 12);
    }

    #[test]
    fn test_copy_from_some_overwrites_everything() {
        let source = TrackRecord {
            flags: TrackFlags::RANDOM,
            ..TrackRecord::from(mock_track_row(3))
        };
        let mut target = TrackRecord::new(99);
        target.copy_from(Some(&source));
        assert_eq!(target, source);
    }

    #[test]
    fn test_copy_from_none_demotes() {
        let mut target = TrackRecord::from(mock_track_row(3));
        target.copy_from(None);
        assert_eq!(target.id, UNPOPULATED_ID);
        assert!(!target.is_populated());
    }

    #[tokio::test]
    async fn test_query_populates_from_index() {
        let index = MockIndex::with_tracks(5);
        let mut track = TrackRecord::with_flags(3, TrackFlags::RANDOM);

        assert!(track.query(&index, false).await);
        assert_eq!(track.path.as_deref(), Some("/music/track-3.mp3"));
        assert_eq!(track.title.as_deref(), Some("Track 3"));
        assert_eq!(track.flags, TrackFlags::RANDOM);
    }

    #[tokio::test]
    async fn test_query_demotes_missing_track() {
        let index = MockIndex::with_tracks(5);
        let mut track = TrackRecord::new(500);

        assert!(!track.query(&index, false).await);
        assert_eq!(track.id, UNPOPULATED_ID);
        assert!(track.path.is_none());
    }

    #[tokio::test]
    async fn test_query_skips_index_when_populated() {
        let index = MockIndex::with_tracks(5);
        let mut track = TrackRecord::from(mock_track_row(2));

        assert!(track.query(&index, false).await);
        assert_eq!(index.by_id_calls(), 0);

        assert!(track.query(&index, true).await);
        assert_eq!(index.by_id_calls(), 1);
    }

    #[tokio::test]
    async fn test_query_on_sentinel_fails_without_lookup() {
        let index = MockIndex::with_tracks(5);
        let mut track = TrackRecord::new(UNPOPULATED_ID);

        assert!(!track.query(&index, true).await);
        assert_eq!(index.by_id_calls(), 0);
    }

    #[test]
    fn test_wire_form_drops_flags() {
        let track = TrackRecord {
            flags: TrackFlags::RANDOM,
            ..TrackRecord::from(mock_track_row(4))
        };

        let decoded = TrackRecord::decode(&track.encode().unwrap()).unwrap();
        assert_eq!(decoded.id, 4);
        assert_eq!(decoded.album_id, track.album_id);
        assert_eq!(decoded.path, track.path);
        assert_eq!(decoded.title, track.title);
        assert_eq!(decoded.album, track.album);
        assert_eq!(decoded.artist, track.artist);
        assert!(decoded.flags.is_empty());
    }

    #[test]
    fn test_wire_form_field_order() {
        let mut track = TrackRecord::new(1);
        track.album_id = 2;
        let bytes = track.encode().unwrap();

        // Two little-endian i64s followed by four `None` tags.
        assert_eq!(bytes.len(), 8 + 8 + 4);
        assert_eq!(&bytes[0..8], &1i64.to_le_bytes());
        assert_eq!(&bytes[8..16], &2i64.to_le_bytes());
        assert!(bytes[16..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        assert!(TrackRecord::decode(&[1, 2, 3]).is_err());
    }
}
