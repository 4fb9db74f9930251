//! ffprobe-backed prober.
//!
//! Invokes `ffprobe -print_format json -show_format -show_streams` under a
//! deadline and maps the stream/format JSON onto [`TechnicalAttributes`].

use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{HdrFormat, MediaProber, TechnicalAttributes, DEFAULT_PROBE_TIMEOUT_SECS};
use crate::error::ProbeError;

// Poll interval while waiting for the subprocess.
const WAIT_STEP: Duration = Duration::from_millis(25);

/// Prober that shells out to the `ffprobe` binary.
pub struct FfprobeProber {
    binary: String,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new() -> Self {
        Self {
            binary: "ffprobe".to_string(),
            timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
        }
    }

    /// Override the subprocess deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a binary other than `ffprobe` on PATH.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Run the subprocess, enforcing the deadline by polling and killing.
    fn run(&self, path: &Path) -> Result<Vec<u8>, ProbeError> {
        let mut child = Command::new(&self.binary)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => ProbeError::ToolNotFound {
                    tool: self.binary.clone(),
                },
                _ => ProbeError::LaunchFailed {
                    path: path.to_path_buf(),
                    source,
                },
            })?;

        // Drain stdout on a helper thread so a chatty child never blocks on
        // a full pipe while we poll for exit.
        let mut stdout = child.stdout.take();
        let reader = std::thread::spawn(move || {
            let mut buffer = Vec::new();
            if let Some(out) = stdout.as_mut() {
                let _ = out.read_to_end(&mut buffer);
            }
            buffer
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ProbeError::Timeout {
                            path: path.to_path_buf(),
                            seconds: self.timeout.as_secs(),
                        });
                    }
                    std::thread::sleep(WAIT_STEP);
                }
                Err(source) => {
                    let _ = child.kill();
                    return Err(ProbeError::LaunchFailed {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        };

        let output = reader.join().unwrap_or_default();

        if !status.success() {
            return Err(ProbeError::ExitedWithError {
                path: path.to_path_buf(),
                status: status.to_string(),
            });
        }

        Ok(output)
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaProber for FfprobeProber {
    fn probe(&self, path: &Path) -> Result<TechnicalAttributes, ProbeError> {
        let output = self.run(path)?;
        let attributes = parse_output(path, &output)?;
        debug!(
            path = %path.display(),
            width = attributes.width,
            height = attributes.height,
            codec = attributes.video_codec.as_deref().unwrap_or("unknown"),
            "probed file"
        );
        Ok(attributes)
    }

    fn available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn tool_name(&self) -> &str {
        &self.binary
    }
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: FfprobeFormat,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    profile: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    channels: Option<u32>,
    color_transfer: Option<String>,
    color_primaries: Option<String>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeSideData {
    side_data_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
    bit_rate: Option<String>,
}

/// Map raw ffprobe JSON onto attributes. Split from process handling so
/// parsing is testable without the binary.
fn parse_output(path: &Path, bytes: &[u8]) -> Result<TechnicalAttributes, ProbeError> {
    let parsed: FfprobeOutput =
        serde_json::from_slice(bytes).map_err(|e| ProbeError::MalformedOutput {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ProbeError::MalformedOutput {
            path: path.to_path_buf(),
            reason: "no video stream".to_string(),
        })?;
    let audio = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));

    let hdr_format = detect_hdr(video);

    Ok(TechnicalAttributes {
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        video_codec: video.codec_name.clone(),
        audio_codec: audio.and_then(combined_audio_codec),
        audio_channels: audio.and_then(|s| s.channels).unwrap_or(0),
        bitrate: parsed
            .format
            .bit_rate
            .as_deref()
            .and_then(|b| b.parse().ok())
            .unwrap_or(0),
        duration_ms: parsed
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .map(|secs| (secs * 1000.0) as u64)
            .unwrap_or(0),
        container: parsed.format.format_name.clone(),
        hdr_present: hdr_format.is_some(),
        hdr_format,
    })
}

/// Codec name joined with its profile, when one is reported. Profile text
/// is where ffprobe surfaces Atmos, DTS-HD MA and DTS:X.
fn combined_audio_codec(stream: &FfprobeStream) -> Option<String> {
    match (stream.codec_name.as_deref(), stream.profile.as_deref()) {
        (Some(codec), Some(profile)) => Some(format!("{codec} {profile}")),
        (Some(codec), None) => Some(codec.to_string()),
        (None, Some(profile)) => Some(profile.to_string()),
        (None, None) => None,
    }
}

/// HDR classification from stream colour metadata and side data.
fn detect_hdr(video: &FfprobeStream) -> Option<HdrFormat> {
    let dovi = video.side_data_list.iter().any(|sd| {
        sd.side_data_type
            .as_deref()
            .map(|t| t.to_lowercase().contains("dovi"))
            .unwrap_or(false)
    });
    if dovi {
        return Some(HdrFormat::DolbyVision);
    }

    match video.color_transfer.as_deref() {
        Some("smpte2084") => return Some(HdrFormat::Hdr10),
        Some("arib-std-b67") => return Some(HdrFormat::Hlg),
        _ => {}
    }

    if video.color_primaries.as_deref() == Some("bt2020") {
        return Some(HdrFormat::Generic);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn probe_path() -> PathBuf {
        PathBuf::from("/media/movies/test.mkv")
    }

    #[test]
    fn parses_hdr10_remux_streams() {
        let json = r#"{
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "hevc",
                    "width": 3840,
                    "height": 2160,
                    "color_transfer": "smpte2084",
                    "color_primaries": "bt2020"
                },
                {
                    "codec_type": "audio",
                    "codec_name": "truehd",
                    "profile": "Dolby TrueHD + Dolby Atmos",
                    "channels": 8
                }
            ],
            "format": {
                "format_name": "matroska,webm",
                "duration": "8130.5",
                "bit_rate": "68500000"
            }
        }"#;

        let attrs = parse_output(&probe_path(), json.as_bytes()).unwrap();
        assert_eq!(attrs.width, 3840);
        assert_eq!(attrs.height, 2160);
        assert_eq!(attrs.video_codec.as_deref(), Some("hevc"));
        assert_eq!(
            attrs.audio_codec.as_deref(),
            Some("truehd Dolby TrueHD + Dolby Atmos")
        );
        assert_eq!(attrs.audio_channels, 8);
        assert_eq!(attrs.bitrate, 68_500_000);
        assert_eq!(attrs.duration_ms, 8_130_500);
        assert!(attrs.hdr_present);
        assert_eq!(attrs.hdr_format, Some(HdrFormat::Hdr10));
    }

    #[test]
    fn dovi_side_data_wins_over_transfer() {
        let json = r#"{
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "hevc",
                    "width": 3840,
                    "height": 2160,
                    "color_transfer": "smpte2084",
                    "side_data_list": [
                        { "side_data_type": "DOVI configuration record" }
                    ]
                }
            ],
            "format": { "format_name": "matroska,webm" }
        }"#;

        let attrs = parse_output(&probe_path(), json.as_bytes()).unwrap();
        assert_eq!(attrs.hdr_format, Some(HdrFormat::DolbyVision));
    }

    #[test]
    fn hlg_transfer_is_detected() {
        let json = r#"{
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "hevc",
                    "height": 2160,
                    "color_transfer": "arib-std-b67"
                }
            ],
            "format": {}
        }"#;

        let attrs = parse_output(&probe_path(), json.as_bytes()).unwrap();
        assert_eq!(attrs.hdr_format, Some(HdrFormat::Hlg));
    }

    #[test]
    fn bt2020_primaries_alone_mean_generic_hdr() {
        let json = r#"{
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "vp9",
                    "height": 2160,
                    "color_primaries": "bt2020"
                }
            ],
            "format": {}
        }"#;

        let attrs = parse_output(&probe_path(), json.as_bytes()).unwrap();
        assert_eq!(attrs.hdr_format, Some(HdrFormat::Generic));
    }

    #[test]
    fn sdr_file_has_no_hdr() {
        let json = r#"{
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080
                },
                {
                    "codec_type": "audio",
                    "codec_name": "aac",
                    "channels": 2
                }
            ],
            "format": {
                "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
                "duration": "5400.0",
                "bit_rate": "4200000"
            }
        }"#;

        let attrs = parse_output(&probe_path(), json.as_bytes()).unwrap();
        assert!(!attrs.hdr_present);
        assert_eq!(attrs.hdr_format, None);
        assert_eq!(attrs.audio_codec.as_deref(), Some("aac"));
    }

    #[test]
    fn output_without_video_stream_is_malformed() {
        let json = r#"{ "streams": [], "format": {} }"#;
        let err = parse_output(&probe_path(), json.as_bytes()).unwrap_err();
        assert!(matches!(err, ProbeError::MalformedOutput { .. }));
        assert!(err.to_string().contains("no video stream"));
    }

    #[test]
    fn garbage_output_is_malformed() {
        let err = parse_output(&probe_path(), b"not json at all").unwrap_err();
        assert!(matches!(err, ProbeError::MalformedOutput { .. }));
    }

    #[test]
    fn missing_tool_yields_tool_not_found() {
        let prober = FfprobeProber::new().with_binary("definitely-not-a-real-probe-tool");
        assert!(!prober.available());
        let err = prober.probe(&probe_path()).unwrap_err();
        assert!(matches!(err, ProbeError::ToolNotFound { .. }));
    }
}
