//! Directory import into the SQLite media index.

use std::path::{Path, PathBuf};

use futures::{Stream, StreamExt};
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tracing::debug;
use walkdir::WalkDir;

use crate::cover::find_sidecar_cover;
use crate::db::{self, NewTrack, SqliteMediaIndex};
use crate::error::{Result, ResultExt};
use crate::metadata::{self, TrackTags};

#[derive(Debug, Clone)]
pub enum ImportEvent {
    /// File registered under the given track id
    Imported(PathBuf, i64),
    Error(PathBuf, String),
}

/// Whether a path has an audio file extension (case-insensitive).
pub fn is_audio_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    matches!(ext.as_deref(), Some("mp3" | "flac" | "ogg" | "m4a" | "wav"))
}

/// Scans the given root directory recursively for audio files.
///
/// Returns a Stream of PathBufs.
pub fn scan(root: PathBuf) -> impl Stream<Item = PathBuf> {
    let (tx, rx) = mpsc::channel(100);

    // Spawn a blocking task to perform the synchronous file system traversal
    tokio::task::spawn_blocking(move || {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && is_audio_file(entry.path()) {
                // Receiver dropped: stop scanning
                if tx.blocking_send(entry.path().to_path_buf()).is_err() {
                    break;
                }
            }
        }
    });

    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|path| (path, rx))
    })
}

/// Scans `root` and registers every audio file found in the index.
///
/// Albums get the first sidecar image found next to one of their tracks as
/// their art file.
pub fn import_library(index: SqliteMediaIndex, root: PathBuf) -> impl Stream<Item = ImportEvent> {
    scan(root)
        .map(move |path| {
            let pool = index.pool().clone();
            async move {
                match import_file(&pool, &path).await {
                    Ok(id) => ImportEvent::Imported(path, id),
                    Err(e) => ImportEvent::Error(path, e.to_string()),
                }
            }
        })
        .buffer_unordered(10) // Process 10 files in parallel
}

async fn import_file(pool: &SqlitePool, path: &Path) -> Result<i64> {
    let tags = metadata::read(path)?;
    register_track(pool, path, &tags).await
}

/// Register an audio file with already-read tags.
///
/// Creates (or reuses) the album row, points it at a sidecar cover when one
/// sits next to the file, upserts the track and stores its embedded picture
/// as per-track art.
pub async fn register_track(pool: &SqlitePool, path: &Path, tags: &TrackTags) -> Result<i64> {
    let album_id = match tags.album.as_deref() {
        Some(album) => db::get_or_create_album(pool, album, tags.artist.as_deref())
            .await
            .with_context(format!("registering album {album:?}"))?,
        None => 0,
    };

    if album_id != 0
        && let Some(cover) = find_sidecar_cover(path)
    {
        debug!(album_id, cover = %cover.display(), "Registering album art");
        db::set_album_art(pool, album_id, &cover)
            .await
            .with_context("registering album art")?;
    }

    let path_str = path.to_string_lossy();
    let id = db::insert_track(
        pool,
        &NewTrack {
            path: &path_str,
            album_id,
            title: tags.title.as_deref(),
            album: tags.album.as_deref(),
            artist: tags.artist.as_deref(),
            is_music: true,
        },
    )
    .await
    .with_context(format!("registering track {}", path.display()))?;

    if let Some(picture) = &tags.picture {
        debug!(track_id = id, bytes = picture.len(), "Storing track art");
        db::set_track_art(pool, id, picture)
            .await
            .with_context("storing track art")?;
    }

    Ok(id)
}
