//! Cover art resolution and caching.
//!
//! Covers are resolved per track from three sources, in order:
//!
//! 1. **Track art** - art the media index stores for the exact track
//! 2. **Extracted art** - pictures embedded in the audio file's tags
//! 3. **Album art** - the image file registered for the track's album
//!
//! Decoded covers are held in a small [`BoundedCache`]. Decoded images are
//! large, so whatever the cache displaces is handed back and released
//! straight away through [`release`] instead of lingering.

mod cache;
mod embedded;
mod resolver;
mod sidecar;
mod strategy;

use std::path::Path;
use std::sync::Arc;

use image::RgbImage;
use tracing::trace;

use crate::error::Result;

pub use cache::{BoundedCache, Insertion};
pub use embedded::{ArtExtractor, EmbeddedArtExtractor};
pub use resolver::{CoverResolver, DEFAULT_COVER_CAPACITY};
pub use sidecar::find_sidecar_cover;
pub use strategy::{
    AlbumArtStrategy, CoverRequest, CoverStrategy, ExtractedArtStrategy, TrackArtStrategy,
};

/// Where a cover came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverSource {
    /// Per-track art stored in the media index
    TrackArt,
    /// Extracted from the audio file itself
    Extracted,
    /// The album's registered art file
    AlbumArt,
}

/// A decoded cover image.
///
/// Pixels are stored as opaque 8-bit RGB; alpha is dropped at decode time.
#[derive(Debug)]
pub struct Cover {
    image: RgbImage,
    source: CoverSource,
}

/// Read-only view of a cached cover.
pub type SharedCover = Arc<Cover>;

impl Cover {
    pub fn new(image: RgbImage, source: CoverSource) -> Self {
        Self { image, source }
    }

    /// Decode an encoded image (JPEG, PNG, ...) from memory.
    pub fn decode(data: &[u8], source: CoverSource) -> Result<Self> {
        let image = image::load_from_memory(data)?;
        Ok(Self::new(image.into_rgb8(), source))
    }

    /// Decode an image file.
    pub fn open(path: &Path, source: CoverSource) -> Result<Self> {
        let image = image::open(path)?;
        Ok(Self::new(image.into_rgb8(), source))
    }

    pub fn source(&self) -> CoverSource {
        self.source
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.image
    }

    /// Size of the decoded pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.image.as_raw().len()
    }

    /// Write the cover to `path`, format chosen by extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.image.save(path)?;
        Ok(())
    }
}

/// Release a cover displaced from the cache.
///
/// Frees the pixel buffer now if this was the last reference. If a caller
/// still holds the cover, freeing is deferred: the buffer stays valid for
/// that caller and goes away when its last handle drops, never earlier.
pub fn release(cover: SharedCover) {
    match Arc::try_unwrap(cover) {
        Ok(cover) => {
            trace!(bytes = cover.byte_size(), source = ?cover.source, "Released cover");
            drop(cover);
        }
        Err(shared) => {
            trace!(
                holders = Arc::strong_count(&shared) - 1,
                "Cover still in use, freed on last drop"
            );
        }
    }
}
