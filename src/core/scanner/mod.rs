//! # Scanner Module
//!
//! Discovers duplicate-scan candidates in a library root.
//!
//! Two layouts are supported:
//! - **Movies**: every immediate subdirectory of the root is one candidate
//!   (the movie folder), represented by its largest video file. The reserved
//!   trailer folder and hidden directories are not candidates.
//! - **Episodes**: every video file directly under the root is one candidate.
//!
//! Candidates without a qualifying video file are not silently dropped; they
//! come back as [`SkippedEntry`] records so callers can report them.
//!
//! ## Example
//! ```rust,ignore
//! use media_dedupe::core::scanner::{LibraryScanner, ScanConfig};
//!
//! let scanner = LibraryScanner::new(ScanConfig::default());
//! let result = scanner.scan(Path::new("/media/movies"))?;
//! ```

mod walker;

pub use walker::{LibraryScanner, ScanConfig};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Folder trailers are collected under; never a scan candidate.
pub const TRAILERS_DIR: &str = "_Trailers";

/// Library layout to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanMode {
    /// One candidate per immediate subdirectory (movie folders).
    Movies,
    /// One candidate per immediate video file (episode files).
    Episodes,
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanMode::Movies => write!(f, "movies"),
            ScanMode::Episodes => write!(f, "episodes"),
        }
    }
}

/// One discovered candidate: a movie folder or an episode file, together
/// with its representative video file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaCandidate {
    /// The folder (movies) or file (episodes) that names this item
    pub path: PathBuf,
    /// Folder or file name exactly as found on disk
    pub raw_name: String,
    /// Largest video file inside the candidate; the file itself in
    /// episode mode
    pub primary_video_file: PathBuf,
    /// Size of `primary_video_file` in bytes
    pub file_size_bytes: u64,
}

/// Why a directory entry produced no candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The folder contains no file with a known video extension
    NoPrimaryFile,
    /// The entry could not be listed or read
    Unreadable { message: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoPrimaryFile => write!(f, "no video file found"),
            SkipReason::Unreadable { message } => write!(f, "unreadable: {message}"),
        }
    }
}

/// A directory entry that was seen but not turned into a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Everything one scan of a root discovered.
#[derive(Debug)]
pub struct ScanResult {
    /// Candidates ready for analysis
    pub candidates: Vec<MediaCandidate>,
    /// Entries left out, with reasons
    pub skipped: Vec<SkippedEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_mode_display_is_lowercase() {
        assert_eq!(ScanMode::Movies.to_string(), "movies");
        assert_eq!(ScanMode::Episodes.to_string(), "episodes");
    }

    #[test]
    fn skip_reason_display_names_the_cause() {
        assert_eq!(SkipReason::NoPrimaryFile.to_string(), "no video file found");

        let unreadable = SkipReason::Unreadable {
            message: "permission denied".to_string(),
        };
        assert!(unreadable.to_string().contains("permission denied"));
    }
}
