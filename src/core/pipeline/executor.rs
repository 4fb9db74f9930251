//! Pipeline execution implementation.

use crate::core::detector::{detect_duplicates_with_events, DuplicateGroup, MediaEntry};
use crate::core::hasher;
use crate::core::naming::{identify, normalize};
use crate::core::probe::{FfprobeProber, MediaProber, ProbeConfig};
use crate::core::quality::{score, AttributeSource};
use crate::core::scanner::{LibraryScanner, MediaCandidate, ScanConfig, ScanMode, SkippedEntry};
use crate::error::{MediaDedupeError, Result, ScanError};
use crate::events::{
    null_sender, AnalyzeEvent, AnalyzeProgress, Event, EventSender, PipelineEvent, PipelinePhase,
    PipelineSummary,
};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Cooperative cancellation flag shared between a scan and its controller.
///
/// Cancelling stops new per-entry work from being scheduled; in-flight
/// entries finish on their own. A cancelled run returns
/// [`ScanError::Cancelled`] instead of partial results.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the scan holding this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Counters accumulated over one run, owned by the caller afterwards
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// Candidates the scanner discovered
    pub candidates: usize,
    /// Entries that completed analysis
    pub analyzed: usize,
    /// Entries skipped before analysis
    pub skipped: usize,
    /// Files the probe tool described
    pub probe_successes: usize,
    /// Files that fell back to filename scoring
    pub probe_fallbacks: usize,
    /// Files whose fingerprint could not be computed
    pub hash_failures: usize,
}

/// Everything one pipeline run produced
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Ranked duplicate groups
    pub groups: Vec<DuplicateGroup>,
    /// Every analyzed entry, match types filled in
    pub entries: Vec<MediaEntry>,
    /// Entries that never reached analysis
    pub skipped: Vec<SkippedEntry>,
    /// Scan counters
    pub stats: ScanStats,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// When the run finished
    pub completed_at: DateTime<Utc>,
}

impl ScanOutcome {
    /// Total deletion candidates across all groups.
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(|g| g.duplicate_count()).sum()
    }

    /// Bytes freed by keeping only each group's recommended member.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.groups.iter().map(|g| g.reclaimable_bytes).sum()
    }
}

/// Configuration for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Library root to scan
    pub root: PathBuf,
    /// Scanner settings
    pub scan: ScanConfig,
    /// Probe settings
    pub probe: ProbeConfig,
    /// Whether to fingerprint primary files (enhanced mode)
    pub hashing: bool,
    /// Worker threads for analysis; `None` uses rayon's default
    pub threads: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            scan: ScanConfig::default(),
            probe: ProbeConfig::default(),
            hashing: true,
            threads: None,
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    prober: Option<Box<dyn MediaProber>>,
    cancel: Option<CancelToken>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            prober: None,
            cancel: None,
        }
    }

    /// Set the library root to scan
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    /// Set the library layout
    pub fn mode(mut self, mode: ScanMode) -> Self {
        self.config.scan.mode = mode;
        self
    }

    /// Include hidden entries
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan.include_hidden = include;
        self
    }

    /// Enable or disable content fingerprinting
    pub fn hashing(mut self, enabled: bool) -> Self {
        self.config.hashing = enabled;
        self
    }

    /// Enable or disable the probe tool
    pub fn probing(mut self, enabled: bool) -> Self {
        self.config.probe.enabled = enabled;
        self
    }

    /// Set the per-file probe budget
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe.timeout = timeout;
        self
    }

    /// Bound the analysis worker pool
    pub fn threads(mut self, threads: usize) -> Self {
        self.config.threads = Some(threads);
        self
    }

    /// Use a custom prober instead of the ffprobe default
    pub fn prober(mut self, prober: Box<dyn MediaProber>) -> Self {
        self.prober = Some(prober);
        self
    }

    /// Attach a cancellation token
    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        let timeout = self.config.probe.timeout;
        Pipeline {
            config: self.config,
            prober: self
                .prober
                .unwrap_or_else(|| Box::new(FfprobeProber::new().with_timeout(timeout))),
            cancel: self.cancel.unwrap_or_default(),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The deduplication pipeline
pub struct Pipeline {
    config: PipelineConfig,
    prober: Box<dyn MediaProber>,
    cancel: CancelToken,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// The token that cancels this pipeline's runs.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<ScanOutcome> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> Result<ScanOutcome> {
        let started = Instant::now();
        events.send(Event::Pipeline(PipelineEvent::Started));

        match self.execute(events, started) {
            Ok(outcome) => {
                events.send(Event::Pipeline(PipelineEvent::Completed {
                    summary: PipelineSummary {
                        total_entries: outcome.entries.len(),
                        duplicate_groups: outcome.groups.len(),
                        duplicate_count: outcome.duplicate_count(),
                        reclaimable_bytes: outcome.reclaimable_bytes(),
                        duration_ms: outcome.duration.as_millis() as u64,
                    },
                }));
                Ok(outcome)
            }
            Err(MediaDedupeError::Scan(ScanError::Cancelled)) => {
                events.send(Event::Pipeline(PipelineEvent::Cancelled));
                Err(MediaDedupeError::Scan(ScanError::Cancelled))
            }
            Err(e) => {
                events.send(Event::Pipeline(PipelineEvent::Error {
                    message: e.to_string(),
                }));
                Err(e)
            }
        }
    }

    fn execute(&self, events: &EventSender, started: Instant) -> Result<ScanOutcome> {
        // Phase 1: Scanning
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));

        let scanner = LibraryScanner::new(self.config.scan.clone());
        let scan = scanner.scan_with_events(&self.config.root, events)?;
        self.check_cancelled()?;

        let mut stats = ScanStats {
            candidates: scan.candidates.len(),
            skipped: scan.skipped.len(),
            ..Default::default()
        };

        if scan.candidates.is_empty() {
            info!(root = %self.config.root.display(), "no candidates found");
            return Ok(ScanOutcome {
                groups: Vec::new(),
                entries: Vec::new(),
                skipped: scan.skipped,
                stats,
                duration: started.elapsed(),
                completed_at: Utc::now(),
            });
        }

        // Phase 2: Analysis
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Analyzing,
        }));

        let mut entries = self.analyze(&scan.candidates, &mut stats, events)?;

        // Phase 3: Detection
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Detecting,
        }));

        let groups = detect_duplicates_with_events(&mut entries, events);
        debug!(
            groups = groups.len(),
            entries = entries.len(),
            "detection finished"
        );

        Ok(ScanOutcome {
            groups,
            entries,
            skipped: scan.skipped,
            stats,
            duration: started.elapsed(),
            completed_at: Utc::now(),
        })
    }

    /// Build a `MediaEntry` for every candidate in parallel, preserving
    /// candidate order in the result.
    fn analyze(
        &self,
        candidates: &[MediaCandidate],
        stats: &mut ScanStats,
        events: &EventSender,
    ) -> Result<Vec<MediaEntry>> {
        events.send(Event::Analyze(AnalyzeEvent::Started {
            total_entries: candidates.len(),
        }));

        let probing = self.config.probe.enabled && self.prober.available();
        if self.config.probe.enabled && !probing {
            warn!(
                tool = self.prober.tool_name(),
                "probe tool not found, scoring from filenames"
            );
        }

        let completed = AtomicUsize::new(0);
        let probe_successes = AtomicUsize::new(0);
        let probe_fallbacks = AtomicUsize::new(0);
        let hash_failures = AtomicUsize::new(0);
        let total = candidates.len();

        let analyze_one = |candidate: &MediaCandidate| -> Option<MediaEntry> {
            if self.cancel.is_cancelled() {
                return None;
            }

            let entry = self.build_entry(
                candidate,
                probing,
                &probe_successes,
                &probe_fallbacks,
                &hash_failures,
                events,
            );

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            events.send(Event::Analyze(AnalyzeEvent::Progress(AnalyzeProgress {
                completed: done,
                total,
                current_path: candidate.path.clone(),
            })));

            Some(entry)
        };

        let results: Vec<Option<MediaEntry>> = match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| MediaDedupeError::Config(e.to_string()))?;
                pool.install(|| candidates.par_iter().map(analyze_one).collect())
            }
            None => candidates.par_iter().map(analyze_one).collect(),
        };

        if self.cancel.is_cancelled() {
            return Err(ScanError::Cancelled.into());
        }

        let entries: Vec<MediaEntry> = results.into_iter().flatten().collect();

        stats.analyzed = entries.len();
        stats.probe_successes = probe_successes.load(Ordering::SeqCst);
        stats.probe_fallbacks = probe_fallbacks.load(Ordering::SeqCst);
        stats.hash_failures = hash_failures.load(Ordering::SeqCst);

        events.send(Event::Analyze(AnalyzeEvent::Completed {
            analyzed: entries.len(),
            probe_fallbacks: stats.probe_fallbacks,
            hash_failures: stats.hash_failures,
        }));

        Ok(entries)
    }

    fn build_entry(
        &self,
        candidate: &MediaCandidate,
        probing: bool,
        probe_successes: &AtomicUsize,
        probe_fallbacks: &AtomicUsize,
        hash_failures: &AtomicUsize,
        events: &EventSender,
    ) -> MediaEntry {
        let normalized = normalize(&candidate.raw_name);

        let episode = match self.config.scan.mode {
            ScanMode::Episodes => {
                let info = identify(&candidate.raw_name);
                info.is_episode().then_some(info)
            }
            ScanMode::Movies => None,
        };

        let attributes = if !self.config.probe.enabled {
            AttributeSource::FilenameDerived
        } else if !probing {
            // Tool missing entirely; the single warning above covers it.
            probe_fallbacks.fetch_add(1, Ordering::SeqCst);
            AttributeSource::FilenameDerived
        } else {
            match self.prober.probe(&candidate.primary_video_file) {
                Ok(attributes) => {
                    probe_successes.fetch_add(1, Ordering::SeqCst);
                    AttributeSource::Probed(attributes)
                }
                Err(e) => {
                    probe_fallbacks.fetch_add(1, Ordering::SeqCst);
                    debug!(
                        file = %candidate.primary_video_file.display(),
                        error = %e,
                        "probe failed, scoring from filename"
                    );
                    events.send(Event::Analyze(AnalyzeEvent::ProbeFallback {
                        path: candidate.primary_video_file.clone(),
                        reason: e.to_string(),
                    }));
                    AttributeSource::FilenameDerived
                }
            }
        };

        let quality = score(&candidate.raw_name, attributes);

        let content_hash = if self.config.hashing {
            match hasher::fingerprint(&candidate.primary_video_file) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    hash_failures.fetch_add(1, Ordering::SeqCst);
                    warn!(
                        file = %candidate.primary_video_file.display(),
                        error = %e,
                        "fingerprint failed, title-only matching"
                    );
                    events.send(Event::Analyze(AnalyzeEvent::HashFailed {
                        path: candidate.primary_video_file.clone(),
                        message: e.to_string(),
                    }));
                    None
                }
            }
        } else {
            None
        };

        MediaEntry {
            path: candidate.path.clone(),
            raw_name: candidate.raw_name.clone(),
            normalized_title: normalized.title,
            year: normalized.year,
            primary_video_file: candidate.primary_video_file.clone(),
            file_size_bytes: candidate.file_size_bytes,
            content_hash,
            quality,
            episode,
            match_types: Vec::new(),
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(ScanError::Cancelled.into())
        } else {
            Ok(())
        }
    }
}
