//! Player session context.
//!
//! A [`LibrarySession`] owns the media index handle, the cover resolver and
//! the random selection buffer. Both caches live exactly as long as the
//! session; nothing is process-global.

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::cover::{ArtExtractor, CoverResolver, EmbeddedArtExtractor, SharedCover};
use crate::error::Result;
use crate::library::{self, MediaIndex, RandomSelectionBuffer};
use crate::model::TrackRecord;

pub struct LibrarySession {
    index: Arc<dyn MediaIndex>,
    covers: CoverResolver,
    random: RandomSelectionBuffer,
}

impl LibrarySession {
    /// Session over `index` using the embedded-tag extractor.
    pub fn new(index: Arc<dyn MediaIndex>, config: &Config) -> Result<Self> {
        Self::with_extractor(index, Arc::new(EmbeddedArtExtractor), config)
    }

    /// Fails if `config` has a zero cache or pool size.
    pub fn with_extractor(
        index: Arc<dyn MediaIndex>,
        extractor: Arc<dyn ArtExtractor>,
        config: &Config,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            cover_capacity = config.cache.cover_capacity,
            pool_size = config.random.pool_size,
            "Starting library session"
        );
        Ok(Self {
            covers: CoverResolver::new(index.clone(), extractor, config.cache.cover_capacity),
            random: RandomSelectionBuffer::new(index.clone(), config.random.pool_size),
            index,
        })
    }

    pub fn index(&self) -> &dyn MediaIndex {
        self.index.as_ref()
    }

    pub fn covers(&self) -> &CoverResolver {
        &self.covers
    }

    /// Whether there is anything to play.
    pub async fn has_tracks(&self) -> bool {
        library::is_track_available(self.index()).await
    }

    /// A populated track by id, or `None` if it is not in the index.
    pub async fn track(&self, id: i64) -> Option<TrackRecord> {
        let mut track = TrackRecord::new(id);
        let found = track.query(self.index(), false).await;
        found.then_some(track)
    }

    /// A randomly selected track.
    pub async fn random_track(&self) -> Option<TrackRecord> {
        self.random.next().await
    }

    pub async fn cover(&self, track: &TrackRecord) -> Option<SharedCover> {
        self.covers.resolve_track(track).await
    }

    /// Drop cached covers and random picks, e.g. after a rescan.
    pub async fn invalidate(&self) {
        self.covers.clear_cache();
        self.random.clear().await;
    }
}
