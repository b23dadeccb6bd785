//! songstore - track metadata, cover art and random selection over a media
//! index.
//!
//! - [`model::TrackRecord`]: a track backed by the index
//! - [`cover::CoverResolver`]: cached cover lookup with ordered fallback
//! - [`library::RandomSelectionBuffer`]: batched random track selection
//! - [`session::LibrarySession`]: owns all of the above for one player session

pub mod cli;
pub mod config;
pub mod cover;
pub mod db;
pub mod error;
pub mod library;
pub mod metadata;
pub mod model;
pub mod session;
#[cfg(test)]
pub mod test_utils;
