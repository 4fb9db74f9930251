//! # Quality Module
//!
//! Scores one media item from its technical attributes and/or its release
//! name. The score is a deterministic sum of independent category points:
//! resolution, video codec, audio codec, HDR, bitrate, and release origin.
//!
//! Attributes come from exactly one of two places, and the rules differ
//! between them:
//! - **Probed**: a prober observed the bitstream. Resolution comes from
//!   pixel height, codecs from reported codec strings, HDR from colour
//!   metadata, and a bitrate bonus applies.
//! - **FilenameDerived**: keyword tables over the lower-cased name. No
//!   bitrate bonus; release names do not carry one.
//!
//! Release origin (Remux, BluRay, WEB-DL...) is always taken from the
//! name, whichever path ran: origin tags are not observable in the
//! bitstream.

mod tables;

use serde::{Deserialize, Serialize};

use crate::core::probe::{HdrFormat, TechnicalAttributes};
use tables::{
    bitrate_bonus, hdr_points, FILENAME_AUDIO_RULES, FILENAME_HDR_RULES, FILENAME_RESOLUTION_RULES,
    FILENAME_VIDEO_RULES, PROBER_AUDIO_RULES, PROBER_VIDEO_RULES, SOURCE_RULES,
    UNDETAILED_HDR_POINTS, UNRECOGNIZED_CODEC_POINTS,
};

/// Where the technical attributes for scoring came from.
#[derive(Debug, Clone)]
pub enum AttributeSource {
    /// A prober supplied precise attributes.
    Probed(TechnicalAttributes),
    /// No probe result; attributes are parsed from the name.
    FilenameDerived,
}

/// Which path produced a score, recorded because point contributions
/// differ between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Prober,
    Filename,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Prober => write!(f, "Prober"),
            DataSource::Filename => write!(f, "Filename"),
        }
    }
}

/// Quality assessment of one media item.
///
/// Immutable once computed; identical inputs produce identical scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// Sum of all category points.
    pub score: u32,
    /// "2160p", "1080p", ... or "Unknown".
    pub resolution: String,
    pub video_codec: String,
    pub audio_codec: String,
    /// Release origin label, always filename-derived.
    pub source: String,
    pub hdr: bool,
    pub hdr_format: Option<HdrFormat>,
    /// Overall bitrate in bits per second; zero when unprobed.
    pub bitrate: u64,
    pub width: u32,
    pub height: u32,
    pub audio_channels: u32,
    pub data_source: DataSource,
    /// Human-readable point contributions, in scoring order.
    pub rationale: Vec<String>,
}

impl QualityScore {
    fn unknown() -> Self {
        Self {
            score: 0,
            resolution: "Unknown".to_string(),
            video_codec: "Unknown".to_string(),
            audio_codec: "Unknown".to_string(),
            source: "Unknown".to_string(),
            hdr: false,
            hdr_format: None,
            bitrate: 0,
            width: 0,
            height: 0,
            audio_channels: 0,
            data_source: DataSource::Filename,
            rationale: Vec::new(),
        }
    }
}

/// Score one item from its raw name and attribute source.
pub fn score(raw_name: &str, attributes: AttributeSource) -> QualityScore {
    let mut quality = QualityScore::unknown();
    let name_lower = raw_name.to_lowercase();

    match &attributes {
        AttributeSource::Probed(attrs) => {
            quality.data_source = DataSource::Prober;
            score_probed(&mut quality, attrs);
        }
        AttributeSource::FilenameDerived => {
            quality.data_source = DataSource::Filename;
            score_filename(&mut quality, &name_lower);
        }
    }

    score_origin(&mut quality, &name_lower);

    quality
}

fn score_probed(quality: &mut QualityScore, attrs: &TechnicalAttributes) {
    quality.width = attrs.width;
    quality.height = attrs.height;
    quality.bitrate = attrs.bitrate;
    quality.audio_channels = attrs.audio_channels;

    // Resolution from actual pixel height.
    let height = attrs.height;
    if height > 0 {
        let (label, display, points) = if height >= 2160 {
            ("2160p".to_string(), "4K/2160p".to_string(), 100)
        } else if height >= 1080 {
            ("1080p".to_string(), "1080p".to_string(), 80)
        } else if height >= 720 {
            ("720p".to_string(), "720p".to_string(), 60)
        } else if height >= 480 {
            ("480p".to_string(), "480p".to_string(), 40)
        } else {
            let label = format!("{height}p");
            (label.clone(), label, 20)
        };
        quality.score += points;
        quality.rationale.push(if points > 20 {
            format!("{display} [probed: {}x{height}] (+{points})", attrs.width)
        } else {
            format!("{display} [probed] (+{points})")
        });
        quality.resolution = label;
    }

    if let Some(codec) = &attrs.video_codec {
        match PROBER_VIDEO_RULES.iter().find(|r| r.matches(codec)) {
            Some(rule) => {
                quality.video_codec = rule.label.to_string();
                quality.score += rule.points;
                quality.rationale.push(format!(
                    "{} [probed: {codec}] (+{})",
                    rule.label, rule.points
                ));
            }
            None => {
                // Present but unrecognized still beats absent.
                quality.video_codec = codec.clone();
                quality.score += UNRECOGNIZED_CODEC_POINTS;
                quality
                    .rationale
                    .push(format!("{codec} [probed] (+{UNRECOGNIZED_CODEC_POINTS})"));
            }
        }
    }

    if let Some(audio) = &attrs.audio_codec {
        if let Some(rule) = PROBER_AUDIO_RULES.iter().find(|r| r.matches(audio)) {
            let channel_info = if attrs.audio_channels > 0 {
                format!(" {}ch", attrs.audio_channels)
            } else {
                String::new()
            };
            quality.audio_codec = rule.label.to_string();
            quality.score += rule.points;
            quality.rationale.push(format!(
                "{} [probed{channel_info}] (+{})",
                rule.label, rule.points
            ));
        }
    }

    if attrs.hdr_present {
        quality.hdr = true;
        match attrs.hdr_format {
            Some(format) => {
                let points = hdr_points(format);
                quality.hdr_format = Some(format);
                quality.score += points;
                quality
                    .rationale
                    .push(format!("{} [probed] (+{points})", format.label()));
            }
            None => {
                quality.score += UNDETAILED_HDR_POINTS;
                quality
                    .rationale
                    .push(format!("HDR [probed] (+{UNDETAILED_HDR_POINTS})"));
            }
        }
    }

    if let Some((tier, mbps, points)) = bitrate_bonus(attrs.bitrate) {
        quality.score += points;
        quality
            .rationale
            .push(format!("{tier} [{mbps:.1} Mbps] (+{points})"));
    }
}

fn score_filename(quality: &mut QualityScore, name_lower: &str) {
    if let Some(rule) = FILENAME_RESOLUTION_RULES
        .iter()
        .find(|r| r.matches(name_lower))
    {
        quality.resolution = rule.label.to_string();
        quality.score += rule.points;
        quality
            .rationale
            .push(format!("{} (+{})", rule.display(), rule.points));
    }

    if let Some(rule) = FILENAME_VIDEO_RULES.iter().find(|r| r.matches(name_lower)) {
        quality.video_codec = rule.label.to_string();
        quality.score += rule.points;
        quality
            .rationale
            .push(format!("{} (+{})", rule.display(), rule.points));
    }

    if let Some(rule) = FILENAME_AUDIO_RULES.iter().find(|r| r.matches(name_lower)) {
        quality.audio_codec = rule.label.to_string();
        quality.score += rule.points;
        quality
            .rationale
            .push(format!("{} (+{})", rule.display(), rule.points));
    }

    if let Some(rule) = FILENAME_HDR_RULES.iter().find(|r| r.regex.is_match(name_lower)) {
        quality.hdr = true;
        quality.hdr_format = Some(rule.format);
        quality.score += rule.points;
        quality
            .rationale
            .push(format!("{} (+{})", rule.format.label(), rule.points));
    }
}

fn score_origin(quality: &mut QualityScore, name_lower: &str) {
    if let Some(rule) = SOURCE_RULES.iter().find(|r| r.matches(name_lower)) {
        quality.source = rule.label.to_string();
        quality.score += rule.points;
        quality
            .rationale
            .push(format!("{} (+{})", rule.label, rule.points));
    }
}
