//! Cover art resolver - cached, ordered fallback over cover strategies.
//!
//! # Design
//!
//! The cache lock is only taken for the lookup and the final insertion;
//! strategies run without it. Two callers missing on the same track at the
//! same time may therefore both run the strategies. The first insertion
//! wins, and the other caller releases its own freshly decoded cover and
//! returns the cached one.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, trace};

use super::cache::BoundedCache;
use super::strategy::{
    AlbumArtStrategy, CoverRequest, CoverStrategy, ExtractedArtStrategy, TrackArtStrategy,
};
use super::{ArtExtractor, Cover, SharedCover, release};
use crate::library::MediaIndex;
use crate::model::{TrackRecord, UNPOPULATED_ID};

/// Number of decoded covers kept in memory by default.
pub const DEFAULT_COVER_CAPACITY: usize = 10;

/// Resolves and caches covers by track id.
pub struct CoverResolver {
    cache: BoundedCache<i64, SharedCover>,
    strategies: Vec<Box<dyn CoverStrategy>>,
}

impl CoverResolver {
    /// Resolver with the standard strategy order: track art, extracted art,
    /// album art.
    pub fn new(
        index: Arc<dyn MediaIndex>,
        extractor: Arc<dyn ArtExtractor>,
        capacity: usize,
    ) -> Self {
        Self::with_strategies(
            vec![
                Box::new(TrackArtStrategy::new(index.clone())),
                Box::new(ExtractedArtStrategy::new(extractor)),
                Box::new(AlbumArtStrategy::new(index)),
            ],
            capacity,
        )
    }

    /// Resolver trying `strategies` in the given order.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_strategies(strategies: Vec<Box<dyn CoverStrategy>>, capacity: usize) -> Self {
        Self {
            cache: BoundedCache::new(capacity),
            strategies,
        }
    }

    /// Cover for track `id`.
    ///
    /// Returns the cached cover when there is one. Otherwise the strategies
    /// run in order and the first cover found is cached. Nothing is cached
    /// when every strategy comes up empty, so a later call tries again.
    pub async fn resolve(&self, id: i64, album_id: i64, path: Option<&Path>) -> Option<SharedCover> {
        if id == UNPOPULATED_ID {
            return None;
        }

        if let Some(cover) = self.cache.get(&id) {
            trace!(id, "Cover cache hit");
            return Some(cover);
        }

        let request = CoverRequest {
            id,
            album_id,
            path: path.map(Path::to_path_buf),
        };
        let cover = self.acquire(&request).await?;

        let insertion = self.cache.put_if_absent(id, Arc::new(cover));
        if let Some(displaced) = insertion.displaced {
            release(displaced);
        }
        Some(insertion.current)
    }

    /// Cover for a track record.
    pub async fn resolve_track(&self, track: &TrackRecord) -> Option<SharedCover> {
        self.resolve(
            track.id,
            track.album_id,
            track.path.as_deref().map(Path::new),
        )
        .await
    }

    /// Cached cover for `id`, without running any strategy.
    pub fn cached(&self, id: i64) -> Option<SharedCover> {
        self.cache.get(&id)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Release every cached cover.
    pub fn clear_cache(&self) {
        for cover in self.cache.drain() {
            release(cover);
        }
    }

    async fn acquire(&self, request: &CoverRequest) -> Option<Cover> {
        for strategy in &self.strategies {
            if let Some(cover) = strategy.acquire(request).await {
                debug!(id = request.id, source = ?strategy.source(), "Resolved cover");
                return Some(cover);
            }
        }
        debug!(id = request.id, "No cover found");
        None
    }
}
