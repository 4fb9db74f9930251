//! # Error Module
//!
//! User-friendly error types for the media deduplicator.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, tool names, what went wrong
//! - **Per-entry failures degrade, never abort** - a scan only fails when its
//!   root is unusable or the caller cancels
//! - **Recovery hints** - suggest how to fix when possible

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum MediaDedupeError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Probing error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while discovering library entries
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan was cancelled")]
    Cancelled,
}

/// Errors that occur while probing a file with the external media tool.
///
/// Every variant is recoverable: the scorer falls back to filename parsing
/// for the affected file.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Probe tool not found: {tool}. Install it or run with --no-probe.")]
    ToolNotFound { tool: String },

    #[error("Failed to run probe for {path}: {source}")]
    LaunchFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Probe timed out after {seconds}s for {path}")]
    Timeout { path: PathBuf, seconds: u64 },

    #[error("Probe exited with {status} for {path}")]
    ExitedWithError { path: PathBuf, status: String },

    #[error("Failed to parse probe output for {path}: {reason}")]
    MalformedOutput { path: PathBuf, reason: String },
}

/// Errors that occur while fingerprinting file content
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read {path} for fingerprinting: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, MediaDedupeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_includes_path() {
        let error = ScanError::DirectoryNotFound {
            path: PathBuf::from("/media/movies"),
        };
        let message = error.to_string();
        assert!(message.contains("/media/movies"));
    }

    #[test]
    fn probe_error_suggests_recovery() {
        let error = ProbeError::ToolNotFound {
            tool: "ffprobe".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("ffprobe"));
        assert!(message.contains("--no-probe"));
    }

    #[test]
    fn probe_timeout_includes_path_and_budget() {
        let error = ProbeError::Timeout {
            path: PathBuf::from("/media/movies/Alien (1979)/alien.mkv"),
            seconds: 15,
        };
        let message = error.to_string();
        assert!(message.contains("alien.mkv"));
        assert!(message.contains("15s"));
    }

    #[test]
    fn hash_error_includes_path() {
        let error = HashError::Io {
            path: PathBuf::from("/media/movies/missing.mkv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let message = error.to_string();
        assert!(message.contains("missing.mkv"));
    }
}
