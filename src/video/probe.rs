use std::path::Path;
use std::process::{Command, Stdio};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, VideoError};

/// Video file metadata reported by ffprobe
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub duration: f64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub codec: String,
    pub frame_count: i64,
}

#[derive(Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Thin wrapper over the `ffprobe` binary
pub struct VideoProbe;

impl VideoProbe {
    /// Check that a media binary (`ffmpeg`, `ffprobe`) runs
    pub fn check_available(binary: &str) -> Result<()> {
        let available = Command::new(binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false);

        if available {
            Ok(())
        } else {
            Err(VideoError::FfmpegMissing { binary: binary.to_string() }.into())
        }
    }

    /// Probe a video file for dimensions, frame rate and duration
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<VideoMetadata> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(VideoError::LoadFailed {
                path: path.display().to_string(),
            }.into());
        }

        let output = Command::new("ffprobe")
            .args([
                "-v", "error",
                "-print_format", "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .map_err(|e| VideoError::ProbeFailed {
                path: path.display().to_string(),
                reason: format!("failed to run ffprobe: {}", e),
            })?;

        if !output.status.success() {
            debug!("ffprobe stderr: {}", String::from_utf8_lossy(&output.stderr).trim());
            return Err(VideoError::LoadFailed {
                path: path.display().to_string(),
            }.into());
        }

        let metadata = Self::parse(&output.stdout).map_err(|e| match e {
            crate::error::ReelError::Video(VideoError::InvalidParameters { details }) => {
                VideoError::InvalidParameters {
                    details: format!("{}: {}", path.display(), details),
                }.into()
            }
            other => other,
        })?;

        info!("Video metadata: {}x{} @ {:.2}fps, {:.2}s ({})",
              metadata.width, metadata.height, metadata.fps, metadata.duration, metadata.codec);

        Ok(metadata)
    }

    /// Parse ffprobe JSON output into metadata
    pub fn parse(json: &[u8]) -> Result<VideoMetadata> {
        let parsed: ProbeOutput = serde_json::from_slice(json).map_err(|e| VideoError::ProbeFailed {
            path: "<ffprobe output>".to_string(),
            reason: e.to_string(),
        })?;

        let invalid = |details: &str| VideoError::InvalidParameters { details: details.to_string() };

        let stream = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| invalid("no video stream found"))?;

        let width = stream.width.filter(|&w| w > 0).ok_or_else(|| invalid("missing video width"))?;
        let height = stream.height.filter(|&h| h > 0).ok_or_else(|| invalid("missing video height"))?;

        let fps = [&stream.avg_frame_rate, &stream.r_frame_rate]
            .into_iter()
            .filter_map(|rate| rate.as_deref().and_then(parse_frame_rate))
            .next()
            .ok_or_else(|| invalid("missing video frame rate"))?;

        let duration = parsed
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .or(stream.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| invalid("video has zero or unknown duration"))?;

        Ok(VideoMetadata {
            duration,
            fps,
            width,
            height,
            codec: stream.codec_name.clone().unwrap_or_else(|| "unknown".to_string()),
            frame_count: (duration * fps).round() as i64,
        })
    }

    /// Check if a path looks like a video container we can hand to ffmpeg
    pub fn is_supported<P: AsRef<Path>>(path: P) -> bool {
        matches!(
            path.as_ref().extension().and_then(|ext| ext.to_str()),
            Some(ext) if matches!(
                ext.to_lowercase().as_str(),
                "mp4" | "avi" | "mov" | "mkv" | "webm" | "m4v"
            )
        )
    }
}

/// Parse an ffprobe rational such as "30000/1001"; zero rates are rejected
fn parse_frame_rate(s: &str) -> Option<f64> {
    let (num, den) = s.split_once('/').unwrap_or((s, "1"));
    let num = num.trim().parse::<f64>().ok()?;
    let den = den.trim().parse::<f64>().ok()?;
    if den == 0.0 || num <= 0.0 {
        return None;
    }
    Some(num / den)
}
