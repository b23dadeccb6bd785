//! Cover extraction straight from an audio file.
//!
//! [`ArtExtractor`] is the seam for the extracted-art strategy. The default
//! [`EmbeddedArtExtractor`] uses lofty to read picture data from:
//! - ID3v2 tags (MP3)
//! - Vorbis comments (FLAC, OGG)
//! - MP4 atoms (M4A/AAC)

use std::path::Path;

use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use tracing::debug;

use super::{Cover, CoverSource};
use crate::error::{Error, Result};
use crate::metadata::front_picture;

/// Best-effort extraction of a cover from the audio file at a path.
///
/// Implementations run on a blocking thread and must map every failure
/// (unsupported format, unreadable file, undecodable picture) to `None`.
pub trait ArtExtractor: Send + Sync {
    fn attempt_extract(&self, path: &Path) -> Option<Cover>;
}

/// Reads the front cover (or the first picture) from the file's tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedArtExtractor;

impl EmbeddedArtExtractor {
    fn extract(&self, path: &Path) -> Result<Option<Cover>> {
        let tagged_file = Probe::open(path)
            .map_err(|e| Error::metadata(path, e.to_string()))?
            .read()
            .map_err(|e| Error::metadata(path, e.to_string()))?;

        let Some(tag) = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
        else {
            return Ok(None);
        };

        let Some(picture) = front_picture(tag) else {
            return Ok(None);
        };

        Cover::decode(picture.data(), CoverSource::Extracted).map(Some)
    }
}

impl ArtExtractor for EmbeddedArtExtractor {
    fn attempt_extract(&self, path: &Path) -> Option<Cover> {
        self.extract(path).unwrap_or_else(|e| {
            debug!(path = %path.display(), error = %e, "Embedded art extraction failed");
            None
        })
    }
}
