//! Directory walking over movie folders and episode files.

use super::{MediaCandidate, ScanMode, ScanResult, SkipReason, SkippedEntry, TRAILERS_DIR};
use crate::core::naming::is_video_file;
use crate::error::ScanError;
use crate::events::{null_sender, Event, EventSender, ScanEvent};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for library discovery
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Library layout to scan for
    pub mode: ScanMode,
    /// Whether to include entries whose names start with a dot
    pub include_hidden: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: ScanMode::Movies,
            include_hidden: false,
        }
    }
}

/// Walks a library root and produces scan candidates.
pub struct LibraryScanner {
    config: ScanConfig,
}

impl LibraryScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Scan a library root without progress reporting.
    pub fn scan(&self, root: &Path) -> Result<ScanResult, ScanError> {
        self.scan_with_events(root, &null_sender())
    }

    /// Scan a library root, reporting progress via events.
    ///
    /// Only an unusable root is fatal. Unreadable or video-less entries
    /// become skip records instead of errors.
    pub fn scan_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        if !root.exists() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let mut candidates = Vec::new();
        let mut skipped = Vec::new();

        for entry_result in list_children(root) {
            let entry = match entry_result {
                Ok(entry) => entry,
                // At depth one the only errors are root-listing failures,
                // and an unreadable root halts the whole scan.
                Err(e) => return Err(root_error(root, e)),
            };

            match self.config.mode {
                ScanMode::Movies => {
                    self.consider_folder(entry, &mut candidates, &mut skipped, events)
                }
                ScanMode::Episodes => {
                    self.consider_file(entry, &mut candidates, &mut skipped, events)
                }
            }
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_candidates: candidates.len(),
            skipped: skipped.len(),
        }));

        Ok(ScanResult {
            candidates,
            skipped,
        })
    }

    /// Movie mode: a subdirectory becomes a candidate if it holds at least
    /// one video file; its largest video file is the representative.
    fn consider_folder(
        &self,
        entry: walkdir::DirEntry,
        candidates: &mut Vec<MediaCandidate>,
        skipped: &mut Vec<SkippedEntry>,
        events: &EventSender,
    ) {
        if !entry.file_type().is_dir() {
            return;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name == TRAILERS_DIR {
            return;
        }
        if !self.config.include_hidden && name.starts_with('.') {
            return;
        }

        let path = entry.into_path();
        match largest_video_file(&path) {
            Ok(Some((video, size))) => {
                events.send(Event::Scan(ScanEvent::CandidateFound { path: path.clone() }));
                candidates.push(MediaCandidate {
                    path,
                    raw_name: name,
                    primary_video_file: video,
                    file_size_bytes: size,
                });
            }
            Ok(None) => {
                debug!(folder = %path.display(), "no video file, skipping");
                record_skip(path, SkipReason::NoPrimaryFile, skipped, events);
            }
            Err(message) => {
                warn!(folder = %path.display(), %message, "folder unreadable, skipping");
                record_skip(path, SkipReason::Unreadable { message }, skipped, events);
            }
        }
    }

    /// Episode mode: an immediate video file is its own candidate.
    fn consider_file(
        &self,
        entry: walkdir::DirEntry,
        candidates: &mut Vec<MediaCandidate>,
        skipped: &mut Vec<SkippedEntry>,
        events: &EventSender,
    ) {
        if !entry.file_type().is_file() {
            return;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if !self.config.include_hidden && name.starts_with('.') {
            return;
        }
        if !is_video_file(&name) {
            return;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                let path = entry.into_path();
                warn!(file = %path.display(), error = %e, "file unreadable, skipping");
                record_skip(
                    path,
                    SkipReason::Unreadable {
                        message: e.to_string(),
                    },
                    skipped,
                    events,
                );
                return;
            }
        };

        let path = entry.into_path();
        events.send(Event::Scan(ScanEvent::CandidateFound { path: path.clone() }));
        candidates.push(MediaCandidate {
            primary_video_file: path.clone(),
            path,
            raw_name: name,
            file_size_bytes: metadata.len(),
        });
    }
}

/// Immediate children of a directory, sorted by name so repeated runs see
/// candidates in the same order.
fn list_children(dir: &Path) -> walkdir::IntoIter {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
}

/// Find the largest video file directly inside a folder.
///
/// Size ties keep the name that sorts first. Files whose metadata cannot be
/// read are passed over; a listing failure marks the whole folder unreadable.
fn largest_video_file(folder: &Path) -> Result<Option<(PathBuf, u64)>, String> {
    let mut best: Option<(PathBuf, u64)> = None;

    for entry_result in list_children(folder) {
        let entry = entry_result.map_err(|e| e.to_string())?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !is_video_file(&entry.file_name().to_string_lossy()) {
            continue;
        }

        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                debug!(file = %entry.path().display(), error = %e, "could not stat file");
                continue;
            }
        };

        if best.as_ref().map_or(true, |(_, best_size)| size > *best_size) {
            best = Some((entry.into_path(), size));
        }
    }

    Ok(best)
}

fn record_skip(
    path: PathBuf,
    reason: SkipReason,
    skipped: &mut Vec<SkippedEntry>,
    events: &EventSender,
) {
    events.send(Event::Scan(ScanEvent::Skipped {
        path: path.clone(),
        reason: reason.to_string(),
    }));
    skipped.push(SkippedEntry { path, reason });
}

fn root_error(root: &Path, e: walkdir::Error) -> ScanError {
    let path = e
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());

    if e.io_error().map(|io| io.kind()) == Some(std::io::ErrorKind::PermissionDenied) {
        ScanError::PermissionDenied { path }
    } else {
        ScanError::ReadDirectory {
            path,
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        }
    }
}
