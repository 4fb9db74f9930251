//! # Core Module
//!
//! The interface-agnostic media deduplication engine.
//!
//! ## Modules
//! - `scanner` - Discovers media candidates in library folders
//! - `naming` - Normalizes titles and parses episode markers
//! - `probe` - Reads technical attributes from media containers
//! - `quality` - Ranks releases by resolution, codec, and source
//! - `hasher` - Computes sampled content fingerprints
//! - `detector` - Finds duplicates by fingerprint and title
//! - `pipeline` - Orchestrates the full workflow

pub mod detector;
pub mod hasher;
pub mod naming;
pub mod pipeline;
pub mod probe;
pub mod quality;
pub mod scanner;

// Re-export commonly used types
pub use detector::{DuplicateGroup, MatchType, MediaEntry};
pub use hasher::ContentHash;
pub use naming::{EpisodeInfo, NormalizedTitle};
pub use pipeline::{Pipeline, PipelineBuilder, ScanOutcome, ScanStats};
pub use probe::{MediaProber, TechnicalAttributes};
pub use quality::QualityScore;
pub use scanner::{MediaCandidate, ScanMode};
