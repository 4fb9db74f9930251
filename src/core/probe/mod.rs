//! # Probe Module
//!
//! Port for the external technical prober.
//!
//! A prober inspects a media file and returns precise technical attributes
//! (dimensions, codecs, bitrate, HDR). Probing is always optional: when no
//! prober is configured, or a probe fails for one file, quality scoring
//! falls back to filename parsing. The shipped implementation shells out to
//! `ffprobe`.

mod ffprobe;

pub use ffprobe::FfprobeProber;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ProbeError;

/// Default budget for one probe subprocess.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 15;

/// Configuration for the probing stage.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Whether to invoke the probe tool at all
    pub enabled: bool,
    /// Budget for one probe subprocess
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
        }
    }
}

/// Detailed HDR format reported by a prober or parsed from a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HdrFormat {
    DolbyVision,
    Hdr10Plus,
    Hdr10,
    Hlg,
    /// HDR signalled only by wide-gamut colour metadata.
    Generic,
}

impl HdrFormat {
    pub fn label(&self) -> &'static str {
        match self {
            HdrFormat::DolbyVision => "Dolby Vision",
            HdrFormat::Hdr10Plus => "HDR10+",
            HdrFormat::Hdr10 => "HDR10",
            HdrFormat::Hlg => "HLG",
            HdrFormat::Generic => "HDR",
        }
    }
}

impl std::fmt::Display for HdrFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Precise technical attributes of one media file.
///
/// Field absence means the prober could not observe the value, not that
/// the file lacks it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAttributes {
    pub width: u32,
    pub height: u32,
    pub video_codec: Option<String>,
    /// Audio codec combined with its profile, e.g. "truehd Dolby TrueHD +
    /// Dolby Atmos", so profile-level formats stay matchable.
    pub audio_codec: Option<String>,
    pub audio_channels: u32,
    /// Overall bitrate in bits per second.
    pub bitrate: u64,
    pub duration_ms: u64,
    pub container: Option<String>,
    pub hdr_present: bool,
    pub hdr_format: Option<HdrFormat>,
}

/// Extracts technical attributes from media files.
///
/// Implementations must be shareable across the analysis worker pool.
pub trait MediaProber: Send + Sync {
    /// Probe one file. Every error is recoverable by filename fallback.
    fn probe(&self, path: &Path) -> Result<TechnicalAttributes, ProbeError>;

    /// Whether the underlying tool can run at all. Callers use this to
    /// announce degraded mode once instead of per file.
    fn available(&self) -> bool;

    /// Name of the backing tool, for logs and events.
    fn tool_name(&self) -> &str;
}
