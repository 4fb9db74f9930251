//! # Pipeline Module
//!
//! Orchestrates the full deduplication workflow.
//!
//! ## Pipeline Phases
//! 1. **Scanning** - Discover candidates in the library root
//! 2. **Analysis** - Per-candidate naming analysis, probing, scoring and
//!    fingerprinting
//! 3. **Detection** - Two-pass duplicate grouping
//!
//! ## Parallelism
//! Analysis fans out across a rayon worker pool; results keep candidate
//! order regardless of scheduling.

mod executor;

pub use executor::{
    CancelToken, Pipeline, PipelineBuilder, PipelineConfig, ScanOutcome, ScanStats,
};
