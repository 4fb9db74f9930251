//! # Naming Module
//!
//! Derives comparable identity from raw folder and file names.
//!
//! Two parsers live here:
//! - [`normalize`] turns a release-style name into a lower-cased title plus
//!   an optional year, the key the duplicate detector groups by.
//! - [`identify`] extracts show/season/episode numbers from series file
//!   names, including multi-episode files.
//!
//! Both are total functions: unparseable input yields an empty or default
//! result, never an error.

mod episode;
mod title;

pub use episode::{identify, EpisodeInfo};
pub use title::{normalize, NormalizedTitle};

/// File extensions treated as primary video content.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "wmv", "flv", "m4v", "webm"];

/// Whether a file name carries one of the recognized video extensions.
pub fn is_video_file(file_name: &str) -> bool {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => VIDEO_EXTENSIONS
            .iter()
            .any(|v| ext.eq_ignore_ascii_case(v)),
        None => false,
    }
}

/// Strip one trailing video extension, if present.
///
/// Only known video extensions are removed. A dotted release name without
/// an extension ("Movie.2020") keeps its final segment, which a blind
/// `file_stem` would eat along with the year.
pub fn strip_video_extension(name: &str) -> &str {
    if let Some((stem, ext)) = name.rsplit_once('.') {
        if VIDEO_EXTENSIONS.iter().any(|v| ext.eq_ignore_ascii_case(v)) {
            return stem;
        }
    }
    name
}
