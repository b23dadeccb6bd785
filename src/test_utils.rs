//! Test utilities and fixtures.
//!
//! # Example
//!
//! ```ignore
//! use songstore::test_utils::{temp_index, mock_track_row};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (index, _dir) = temp_index().await;
//!     let row = mock_track_row(1);
//!     // ... test logic
//! }
//! ```

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

use crate::db::SqliteMediaIndex;
use crate::model::TrackRow;

/// Creates a media index backed by a temporary database.
///
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_index() -> (SqliteMediaIndex, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_url = crate::db::db_url(Some(&dir.path().join("test.db")));

    let index = SqliteMediaIndex::open(&db_url)
        .await
        .expect("Failed to initialize test database");

    (index, dir)
}

/// A track row for `id`: album `id * 10`, path `/music/track-{id}.mp3`.
pub fn mock_track_row(id: i64) -> TrackRow {
    TrackRow {
        id,
        album_id: id * 10,
        path: format!("/music/track-{}.mp3", id),
        title: Some(format!("Track {}", id)),
        album: Some("Test Album".to_string()),
        artist: Some("Test Artist".to_string()),
    }
}

/// PNG-encoded solid image of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 40, 90]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode PNG");
    bytes
}

/// Write a PNG of the given size to `path`.
pub fn write_png(path: &Path, width: u32, height: u32) {
    std::fs::write(path, png_bytes(width, height)).expect("Failed to write PNG");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::MediaIndex;

    #[tokio::test]
    async fn test_temp_index_is_empty() {
        let (index, _dir) = temp_index().await;
        assert_eq!(index.count_eligible().await.unwrap(), 0);
    }

    #[test]
    fn test_mock_track_row_defaults() {
        let row = mock_track_row(42);
        assert_eq!(row.album_id, 420);
        assert_eq!(row.path, "/music/track-42.mp3");
        assert_eq!(row.title.as_deref(), Some("Track 42"));
    }

    #[test]
    fn test_png_bytes_decode() {
        let image = image::load_from_memory(&png_bytes(3, 2)).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
    }
}
