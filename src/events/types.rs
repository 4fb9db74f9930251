//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the deduplication pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Library scanning phase events
    Scan(ScanEvent),
    /// Per-entry analysis phase events (probe, score, fingerprint)
    Analyze(AnalyzeEvent),
    /// Duplicate detection phase events
    Detect(DetectEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { root: PathBuf },
    /// A candidate entry was discovered
    CandidateFound { path: PathBuf },
    /// A candidate was skipped and will not be analyzed
    Skipped { path: PathBuf, reason: String },
    /// Scanning completed
    Completed {
        total_candidates: usize,
        skipped: usize,
    },
}

/// Events during the analysis phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnalyzeEvent {
    /// Analysis has started
    Started { total_entries: usize },
    /// Progress update during analysis
    Progress(AnalyzeProgress),
    /// The probe tool was unavailable for a file; quality was derived
    /// from the filename instead
    ProbeFallback { path: PathBuf, reason: String },
    /// Fingerprinting failed; the entry degrades to title-only matching
    HashFailed { path: PathBuf, message: String },
    /// Analysis completed
    Completed {
        analyzed: usize,
        probe_fallbacks: usize,
        hash_failures: usize,
    },
}

/// Progress information during analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeProgress {
    /// Number of entries analyzed so far
    pub completed: usize,
    /// Total number of entries to analyze
    pub total: usize,
    /// Entry currently being analyzed
    pub current_path: PathBuf,
}

/// Events during the detection phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DetectEvent {
    /// Detection has started
    Started { total_entries: usize },
    /// A duplicate group was found
    GroupFound {
        group_id: String,
        member_count: usize,
    },
    /// Detection completed
    Completed {
        total_groups: usize,
        total_duplicates: usize,
    },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline was cancelled
    Cancelled,
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Analyzing,
    Detecting,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Total entries analyzed
    pub total_entries: usize,
    /// Number of duplicate groups found
    pub duplicate_groups: usize,
    /// Total number of duplicate entries (excluding the recommended keeps)
    pub duplicate_count: usize,
    /// Potential space savings in bytes
    pub reclaimable_bytes: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Analyzing => write!(f, "Analyzing"),
            PipelinePhase::Detecting => write!(f, "Detecting"),
        }
    }
}
