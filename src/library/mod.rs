//! Access to the external media index.
//!
//! [`MediaIndex`] is the boundary to the catalog of tracks and albums. The
//! production implementation is [`crate::db::SqliteMediaIndex`]; tests use
//! [`mocks::MockIndex`].
//!
//! This module also holds the [`RandomSelectionBuffer`] and the directory
//! import that fills an index from audio files on disk.

mod import;
mod random;

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::model::TrackRow;

pub use import::{ImportEvent, import_library, is_audio_file, register_track, scan};
pub use random::{DEFAULT_POOL_SIZE, RandomSelectionBuffer};

/// Queries the cover resolver, track records and random buffer need from the
/// media index.
///
/// Methods return `Ok(None)` when the row simply does not exist; `Err` is for
/// faults such as a broken database connection.
#[async_trait]
pub trait MediaIndex: Send + Sync {
    /// Number of tracks eligible for playback (music, not ringtones etc).
    async fn count_eligible(&self) -> Result<u64>;

    /// The eligible track at `position` in a stable ordering, `0..count`.
    async fn eligible_at(&self, position: u64) -> Result<Option<TrackRow>>;

    /// Look up a single track by id.
    async fn track_by_id(&self, id: i64) -> Result<Option<TrackRow>>;

    /// Raw bytes of the art stored for a single track.
    async fn open_track_art(&self, id: i64) -> Result<Option<Vec<u8>>>;

    /// Path of the cached art file registered for an album.
    async fn album_art_path(&self, album_id: i64) -> Result<Option<PathBuf>>;
}

/// Whether the index holds any playable track.
pub async fn is_track_available(index: &dyn MediaIndex) -> bool {
    match index.count_eligible().await {
        Ok(count) => count > 0,
        Err(e) => {
            warn!(error = %e, "Failed to count eligible tracks");
            false
        }
    }
}


#[cfg(test)]
mod tests {
    use super::mocks::MockIndex;
    use super::*;

    #[tokio::test]
    async fn test_track_available() {
        assert!(is_track_available(&MockIndex::with_tracks(1)).await);
        assert!(!is_track_available(&MockIndex::with_tracks(0)).await);
    }

    #[tokio::test]
    async fn test_track_unavailable_on_error() {
        assert!(!is_track_available(&MockIndex::broken()).await);
    }
}
