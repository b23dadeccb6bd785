//! Cover acquisition strategies.
//!
//! Each strategy is one independent way of getting a cover. Strategies
//! never fail: any fault inside one is logged and reported as `None`, so the
//! resolver can always move on to the next.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{ArtExtractor, Cover, CoverSource};
use crate::error::{Error, Result};
use crate::library::MediaIndex;

/// What the resolver knows about the track whose cover is wanted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverRequest {
    pub id: i64,
    pub album_id: i64,
    pub path: Option<PathBuf>,
}

#[async_trait]
pub trait CoverStrategy: Send + Sync {
    /// Source tag for covers this strategy produces.
    fn source(&self) -> CoverSource;

    async fn acquire(&self, request: &CoverRequest) -> Option<Cover>;
}

fn absent_on_error(result: Result<Option<Cover>>, source: CoverSource, id: i64) -> Option<Cover> {
    result.unwrap_or_else(|e| {
        debug!(id, ?source, error = %e, "Cover strategy failed");
        None
    })
}

fn join_error(e: tokio::task::JoinError) -> Error {
    Error::Io(std::io::Error::other(e))
}

/// Art the index stores for the exact track.
pub struct TrackArtStrategy {
    index: Arc<dyn MediaIndex>,
}

impl TrackArtStrategy {
    pub fn new(index: Arc<dyn MediaIndex>) -> Self {
        Self { index }
    }

    async fn try_acquire(&self, id: i64) -> Result<Option<Cover>> {
        let Some(bytes) = self.index.open_track_art(id).await? else {
            return Ok(None);
        };
        Cover::decode(&bytes, CoverSource::TrackArt).map(Some)
    }
}

#[async_trait]
impl CoverStrategy for TrackArtStrategy {
    fn source(&self) -> CoverSource {
        CoverSource::TrackArt
    }

    async fn acquire(&self, request: &CoverRequest) -> Option<Cover> {
        absent_on_error(self.try_acquire(request.id).await, self.source(), request.id)
    }
}

/// Art pulled out of the audio file by an [`ArtExtractor`].
pub struct ExtractedArtStrategy {
    extractor: Arc<dyn ArtExtractor>,
}

impl ExtractedArtStrategy {
    pub fn new(extractor: Arc<dyn ArtExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl CoverStrategy for ExtractedArtStrategy {
    fn source(&self) -> CoverSource {
        CoverSource::Extracted
    }

    async fn acquire(&self, request: &CoverRequest) -> Option<Cover> {
        let path = request.path.clone()?;
        let extractor = self.extractor.clone();
        let result = tokio::task::spawn_blocking(move || extractor.attempt_extract(&path))
            .await
            .map_err(join_error);
        absent_on_error(result, self.source(), request.id)
    }
}

/// The art file registered for the track's album.
pub struct AlbumArtStrategy {
    index: Arc<dyn MediaIndex>,
}

impl AlbumArtStrategy {
    pub fn new(index: Arc<dyn MediaIndex>) -> Self {
        Self { index }
    }

    async fn try_acquire(&self, album_id: i64) -> Result<Option<Cover>> {
        let Some(path) = self.index.album_art_path(album_id).await? else {
            return Ok(None);
        };
        let cover = tokio::task::spawn_blocking(move || Cover::open(&path, CoverSource::AlbumArt))
            .await
            .map_err(join_error)??;
        Ok(Some(cover))
    }
}

#[async_trait]
impl CoverStrategy for AlbumArtStrategy {
    fn source(&self) -> CoverSource {
        CoverSource::AlbumArt
    }

    async fn acquire(&self, request: &CoverRequest) -> Option<Cover> {
        absent_on_error(
            self.try_acquire(request.album_id).await,
            self.source(),
            request.id,
        )
    }
}
