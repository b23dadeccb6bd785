//! Audio file tag reading.
//!
//! Uses the lofty crate for format-independent metadata access across MP3,
//! FLAC, OGG, M4A and WAV files. Only the fields the media index stores are
//! read.

use lofty::file::TaggedFileExt;
use lofty::picture::{Picture, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag};
use std::path::Path;

use crate::error::{Error, Result};

/// Tag fields stored in the media index. Missing tags stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Encoded bytes of the embedded cover picture
    pub picture: Option<Vec<u8>>,
}

/// Read title, artist, album and cover picture from an audio file.
///
/// Falls back to the file stem for the title when the file has no title tag.
pub fn read(path: &Path) -> Result<TrackTags> {
    let tagged_file = Probe::open(path)
        .map_err(|e| Error::metadata(path, format!("failed to open file for probing: {e}")))?
        .read()
        .map_err(|e| Error::metadata(path, format!("failed to read file metadata: {e}")))?;

    // Get the primary tag, or fall back to the first available tag
    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    let title = tag
        .and_then(|t| t.title().map(|s| s.to_string()))
        .or_else(|| fallback_title(path));
    let artist = tag.and_then(|t| t.artist().map(|s| s.to_string()));
    let album = tag.and_then(|t| t.album().map(|s| s.to_string()));
    let picture = tag
        .and_then(front_picture)
        .map(|p| p.data().to_vec());

    Ok(TrackTags {
        title,
        artist,
        album,
        picture,
    })
}

/// The front cover, or the first picture if none is marked as front.
pub fn front_picture(tag: &Tag) -> Option<&Picture> {
    let pictures = tag.pictures();
    pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())
}

fn fallback_title(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
