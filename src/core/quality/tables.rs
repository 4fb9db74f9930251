//! Ordered scoring tables.
//!
//! Each table is a sequence of (pattern, label, points) rules evaluated
//! top to bottom; the first match wins. Order carries meaning: broad
//! patterns ("dts", "ac3", "hdr") sit below the specific formats whose
//! names contain them.

use regex::Regex;
use std::sync::LazyLock;

use crate::core::probe::HdrFormat;

/// One pattern rule in a scoring table.
pub(crate) struct PatternRule {
    pub regex: Regex,
    pub label: &'static str,
    /// Rationale text when it differs from the label.
    display: Option<&'static str>,
    pub points: u32,
}

impl PatternRule {
    pub fn matches(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }

    pub fn display(&self) -> &'static str {
        self.display.unwrap_or(self.label)
    }
}

/// HDR rules carry the format variant instead of a free-form label.
pub(crate) struct HdrRule {
    pub regex: Regex,
    pub format: HdrFormat,
    pub points: u32,
}

fn rule(pattern: &str, label: &'static str, points: u32) -> PatternRule {
    PatternRule {
        regex: case_insensitive(pattern),
        label,
        display: None,
        points,
    }
}

fn rule_display(
    pattern: &str,
    label: &'static str,
    display: &'static str,
    points: u32,
) -> PatternRule {
    PatternRule {
        regex: case_insensitive(pattern),
        label,
        display: Some(display),
        points,
    }
}

fn hdr_rule(pattern: &str, format: HdrFormat, points: u32) -> HdrRule {
    HdrRule {
        regex: case_insensitive(pattern),
        format,
        points,
    }
}

fn case_insensitive(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).unwrap()
}

/// Video codec rules for prober-reported codec strings.
pub(crate) static PROBER_VIDEO_RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        rule(r"hevc|h\.?265", "HEVC/x265", 20),
        rule(r"avc|h\.?264", "x264", 15),
        rule(r"av1", "AV1", 25),
        rule(r"vp9", "VP9", 18),
        rule(r"mpeg-?4|divx|xvid", "XviD", 5),
        rule(r"vc-?1|wmv", "VC-1", 8),
    ]
});

/// Points for a prober-reported codec no rule recognizes.
pub(crate) const UNRECOGNIZED_CODEC_POINTS: u32 = 10;

/// Audio rules for prober-reported codec/profile strings. Atmos and the
/// DTS variants must precede the bare "dts" rule.
pub(crate) static PROBER_AUDIO_RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        rule(r"atmos", "Atmos", 15),
        rule(r"truehd", "TrueHD", 12),
        rule(r"dts.*x", "DTS:X", 14),
        rule(r"dts.*hd", "DTS-HD", 10),
        rule(r"dts", "DTS", 8),
        rule(r"e-?ac-?3", "EAC3", 7),
        rule(r"ac-?3", "AC3", 5),
        rule(r"aac", "AAC", 3),
        rule(r"flac", "FLAC", 6),
        rule(r"opus", "Opus", 4),
    ]
});

/// Resolution keywords for filename scoring.
pub(crate) static FILENAME_RESOLUTION_RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        rule_display(r"2160p|4k|uhd", "2160p", "4K/2160p", 100),
        rule(r"1080p", "1080p", 80),
        rule(r"720p", "720p", 60),
        rule(r"480p|dvd", "480p", 40),
    ]
});

/// Video codec keywords for filename scoring.
pub(crate) static FILENAME_VIDEO_RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        rule(r"av1", "AV1", 25),
        rule(r"x265|h\.?265|hevc", "HEVC/x265", 20),
        rule(r"vp9", "VP9", 18),
        rule(r"x264|h\.?264|avc", "x264", 15),
        rule(r"xvid|divx", "XviD", 5),
    ]
});

/// Audio keywords for filename scoring. Priority differs from the prober
/// table and has no Opus row: release names never tag Opus audio.
pub(crate) static FILENAME_AUDIO_RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        rule(r"atmos", "Atmos", 15),
        rule(r"dts[\s.-]?x", "DTS:X", 14),
        rule(r"truehd", "TrueHD", 12),
        rule(r"dts[\s.-]?hd", "DTS-HD", 10),
        rule(r"dts", "DTS", 8),
        rule_display(r"eac3|ddp|dd\+", "EAC3", "EAC3/DD+", 7),
        rule(r"ac3|dd5\.1", "AC3", 5),
        rule(r"flac", "FLAC", 6),
        rule(r"aac", "AAC", 3),
    ]
});

/// HDR keywords for filename scoring.
pub(crate) static FILENAME_HDR_RULES: LazyLock<Vec<HdrRule>> = LazyLock::new(|| {
    vec![
        hdr_rule(
            r"dolby[\s.-]?vision|dovi|dv[\s.-]hdr|\.dv\.",
            HdrFormat::DolbyVision,
            18,
        ),
        hdr_rule(r"hdr10\+|hdr10plus", HdrFormat::Hdr10Plus, 16),
        hdr_rule(r"hdr10", HdrFormat::Hdr10, 12),
        hdr_rule(r"hlg", HdrFormat::Hlg, 10),
        hdr_rule(r"hdr", HdrFormat::Generic, 10),
    ]
});

/// Release origin keywords. Always matched against the name, never the
/// probe: origin is a release-group convention invisible in the bitstream.
pub(crate) static SOURCE_RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        rule(r"remux", "Remux", 35),
        rule(r"blu-?ray|bdrip|brrip", "BluRay", 30),
        rule(r"web-?dl", "WEB-DL", 25),
        rule(r"webrip", "WEBRip", 20),
        rule(r"hdtv", "HDTV", 15),
        rule(r"dvdrip", "DVDRip", 10),
    ]
});

/// Points for a prober-reported HDR format.
pub(crate) fn hdr_points(format: HdrFormat) -> u32 {
    match format {
        HdrFormat::DolbyVision => 18,
        HdrFormat::Hdr10Plus => 16,
        HdrFormat::Hdr10 => 12,
        HdrFormat::Hlg => 10,
        HdrFormat::Generic => 10,
    }
}

/// Points for HDR presence when the prober reports no detailed format.
pub(crate) const UNDETAILED_HDR_POINTS: u32 = 10;

/// Bitrate bonus tier: (tier name, Mbps, points). None below 5 Mbps.
pub(crate) fn bitrate_bonus(bitrate: u64) -> Option<(&'static str, f64, u32)> {
    let mbps = bitrate as f64 / 1_000_000.0;
    if mbps >= 40.0 {
        Some(("High Bitrate", mbps, 20))
    } else if mbps >= 20.0 {
        Some(("Good Bitrate", mbps, 15))
    } else if mbps >= 10.0 {
        Some(("Moderate Bitrate", mbps, 10))
    } else if mbps >= 5.0 {
        Some(("Low Bitrate", mbps, 5))
    } else {
        None
    }
}
