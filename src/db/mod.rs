//! SQLite-backed media index.
//!
//! Uses SQLx with SQLite for lightweight, embedded storage of the track
//! catalog. [`SqliteMediaIndex`] implements [`MediaIndex`] on top of it and
//! the free functions here register albums, tracks and art during import.
//!
//! # Example
//!
//! ```ignore
//! use songstore::db::{init_db, SqliteMediaIndex};
//!
//! let pool = init_db("sqlite:songstore.db").await?;
//! let index = SqliteMediaIndex::new(pool);
//! let count = index.count_eligible().await?;
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::Result;
use crate::library::MediaIndex;
use crate::model::TrackRow;

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "songstore.db";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool with up to 5 connections, and runs all pending migrations.
pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// A track to be registered in the index.
#[derive(Debug, Clone, Default)]
pub struct NewTrack<'a> {
    pub path: &'a str,
    pub album_id: i64,
    pub title: Option<&'a str>,
    pub album: Option<&'a str>,
    pub artist: Option<&'a str>,
    /// Whether the file is music (as opposed to a ringtone, podcast, ...)
    pub is_music: bool,
}

/// Get or create an album by title and artist.
///
/// Idempotent: the same title/artist pair always returns the same ID, also
/// when several imports race to create it. An unknown artist is keyed as ''.
pub async fn get_or_create_album(
    pool: &SqlitePool,
    title: &str,
    artist: Option<&str>,
) -> sqlx::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO albums (title, artist) VALUES (?, ?)
        ON CONFLICT(title, artist) DO UPDATE SET title = excluded.title
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(artist.unwrap_or(""))
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Register the cached art file for an album.
pub async fn set_album_art(pool: &SqlitePool, album_id: i64, art_path: &Path) -> sqlx::Result<()> {
    sqlx::query("UPDATE albums SET art_path = ? WHERE id = ?")
        .bind(art_path.to_string_lossy().as_ref())
        .bind(album_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert or update a track, keyed by path. Returns the track id.
pub async fn insert_track(pool: &SqlitePool, track: &NewTrack<'_>) -> sqlx::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO tracks (album_id, path, title, album, artist, is_music)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(path) DO UPDATE SET
            album_id = excluded.album_id,
            title = excluded.title,
            album = excluded.album,
            artist = excluded.artist,
            is_music = excluded.is_music
        RETURNING id
        "#,
    )
    .bind(track.album_id)
    .bind(track.path)
    .bind(track.title)
    .bind(track.album)
    .bind(track.artist)
    .bind(track.is_music)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Store art bytes for a single track.
pub async fn set_track_art(pool: &SqlitePool, track_id: i64, data: &[u8]) -> sqlx::Result<()> {
    sqlx::query("INSERT OR REPLACE INTO track_art (track_id, data) VALUES (?, ?)")
        .bind(track_id)
        .bind(data)
        .execute(pool)
        .await?;
    Ok(())
}

const TRACK_COLUMNS: &str = "id, album_id, path, title, album, artist";

/// [`MediaIndex`] over a SQLite pool.
///
/// Eligible tracks are those flagged as music, ordered by id so that a
/// position stays stable while the catalog is unchanged.
#[derive(Debug, Clone)]
pub struct SqliteMediaIndex {
    pool: SqlitePool,
}

impl SqliteMediaIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `db_url`.
    pub async fn open(db_url: &str) -> Result<Self> {
        Ok(Self::new(init_db(db_url).await?))
    }

    /// The underlying pool, for writes during import.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl MediaIndex for SqliteMediaIndex {
    async fn count_eligible(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracks WHERE is_music != 0")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn eligible_at(&self, position: u64) -> Result<Option<TrackRow>> {
        let sql = format!(
            "SELECT {TRACK_COLUMNS} FROM tracks WHERE is_music != 0 ORDER BY id LIMIT 1 OFFSET ?"
        );
        let row = sqlx::query_as::<_, TrackRow>(&sql)
            .bind(position as i64)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn track_by_id(&self, id: i64) -> Result<Option<TrackRow>> {
        let sql = format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE id = ?");
        let row = sqlx::query_as::<_, TrackRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn open_track_art(&self, id: i64) -> Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT data FROM track_art WHERE track_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(data,)| data))
    }

    async fn album_art_path(&self, album_id: i64) -> Result<Option<PathBuf>> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT art_path FROM albums WHERE id = ?")
                .bind(album_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|(path,)| path).map(PathBuf::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::temp_index;

    fn track(path: &str, album_id: i64, is_music: bool) -> NewTrack<'_> {
        NewTrack {
            path,
            album_id,
            title: Some("Title"),
            album: Some("Album"),
            artist: Some("Artist"),
            is_music,
        }
    }

    #[tokio::test]
    async fn test_init_db_creates_database() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let index = SqliteMediaIndex::open(&db_url(Some(&db_path)))
            .await
            .expect("Failed to init db");
        assert!(db_path.exists());
        assert_eq!(index.count_eligible().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_album_creation_is_idempotent() {
        let (index, _dir) = temp_index().await;

        let id1 = get_or_create_album(index.pool(), "Abbey Road", Some("The Beatles"))
            .await
            .unwrap();
        let id2 = get_or_create_album(index.pool(), "Abbey Road", Some("The Beatles"))
            .await
            .unwrap();
        let id3 = get_or_create_album(index.pool(), "Abbey Road", None)
            .await
            .unwrap();

        assert!(id1 > 0);
        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[tokio::test]
    async fn test_insert_and_lookup_track() {
        let (index, _dir) = temp_index().await;

        let id = insert_track(index.pool(), &track("/music/a.mp3", 4, true))
            .await
            .unwrap();
        let row = index.track_by_id(id).await.unwrap().expect("row");
        assert_eq!(row.path, "/music/a.mp3");
        assert_eq!(row.album_id, 4);
        assert_eq!(row.title.as_deref(), Some("Title"));

        // Upsert keeps the id
        let again = insert_track(index.pool(), &track("/music/a.mp3", 5, true))
            .await
            .unwrap();
        assert_eq!(id, again);
        assert_eq!(index.track_by_id(id).await.unwrap().unwrap().album_id, 5);

        assert!(index.track_by_id(id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_eligibility_excludes_non_music() {
        let (index, _dir) = temp_index().await;

        let a = insert_track(index.pool(), &track("/music/a.mp3", 0, true)).await.unwrap();
        insert_track(index.pool(), &track("/ringtones/b.ogg", 0, false)).await.unwrap();
        let c = insert_track(index.pool(), &track("/music/c.flac", 0, true)).await.unwrap();

        assert_eq!(index.count_eligible().await.unwrap(), 2);
        assert_eq!(index.eligible_at(0).await.unwrap().unwrap().id, a);
        assert_eq!(index.eligible_at(1).await.unwrap().unwrap().id, c);
        assert!(index.eligible_at(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_track_art_channel() {
        let (index, _dir) = temp_index().await;
        let id = insert_track(index.pool(), &track("/music/a.mp3", 0, true)).await.unwrap();

        assert!(index.open_track_art(id).await.unwrap().is_none());
        set_track_art(index.pool(), id, &[1, 2, 3]).await.unwrap();
        assert_eq!(index.open_track_art(id).await.unwrap(), Some(vec![1, 2, 3]));

        // Re-import replaces the bytes
        set_track_art(index.pool(), id, &[4, 5]).await.unwrap();
        assert_eq!(index.open_track_art(id).await.unwrap(), Some(vec![4, 5]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_album_creation_yields_one_row() {
        let (index, _dir) = temp_index().await;

        for artist in [Some("Artist"), None] {
            let tasks: Vec<_> = (0..10)
                .map(|_| {
                    let pool = index.pool().clone();
                    tokio::spawn(async move {
                        get_or_create_album(&pool, "Shared Album", artist).await
                    })
                })
                .collect();

            let mut ids = Vec::new();
            for task in tasks {
                ids.push(task.await.unwrap().expect("album creation failed"));
            }
            ids.dedup();
            assert_eq!(ids.len(), 1, "all racers must see the same album");
        }

        let (albums,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM albums")
            .fetch_one(index.pool())
            .await
            .unwrap();
        assert_eq!(albums, 2);
    }

    #[tokio::test]
    async fn test_album_art_path() {
        let (index, _dir) = temp_index().await;
        let album = get_or_create_album(index.pool(), "Album", None).await.unwrap();

        assert!(index.album_art_path(album).await.unwrap().is_none());
        assert!(index.album_art_path(album + 1).await.unwrap().is_none());

        set_album_art(index.pool(), album, Path::new("/art/album.jpg"))
            .await
            .unwrap();
        assert_eq!(
            index.album_art_path(album).await.unwrap(),
            Some(PathBuf::from("/art/album.jpg"))
        );
    }
}
