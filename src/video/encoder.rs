use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, info};

use crate::config::VideoConfig;
use crate::error::{Result, VideoError};
use crate::video::process::StderrTail;
use crate::video::types::Frame;

/// Everything the encoder needs besides the frames themselves
#[derive(Debug, Clone)]
pub struct EncodeSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate: String,
    pub codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub threads: u32,
    /// Exact output duration in seconds
    pub duration: f64,
}

impl EncodeSettings {
    pub fn from_config(config: &VideoConfig, duration: f64) -> Self {
        Self {
            width: config.width,
            height: config.height,
            fps: config.fps,
            bitrate: config.bitrate.clone(),
            codec: config.codec.clone(),
            audio_codec: config.audio_codec.clone(),
            preset: config.preset.clone(),
            threads: config.threads,
            duration,
        }
    }

    /// Number of frames that cover `duration` at `fps`
    pub fn frame_count(&self) -> u64 {
        (self.duration * self.fps as f64).round().max(1.0) as u64
    }
}

/// Summary of a finished encode
#[derive(Debug, Clone)]
pub struct EncodedVideo {
    pub path: String,
    pub duration: f64,
    pub frame_count: u64,
    pub file_size: u64,
}

/// Feeds raw frames and a prepared audio track into an ffmpeg encoder process
pub struct VideoEncoder {
    settings: EncodeSettings,
    output_path: PathBuf,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<StderrTail>,
    frames_written: u64,
}

impl VideoEncoder {
    /// Spawn the encoder writing to `output_path` with `audio_path` as the only audio.
    ///
    /// Must be called inside a tokio runtime; stderr is drained by a background task.
    pub fn spawn<P: AsRef<Path>>(settings: EncodeSettings, audio_path: P, output_path: P) -> Result<Self> {
        let output_path = output_path.as_ref().to_path_buf();

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let args = Self::encoder_args(&settings, audio_path.as_ref(), &output_path);
        debug!("Spawning encoder: ffmpeg {}", args.join(" "));

        Self::spawn_program("ffmpeg", &args, settings, output_path)
    }

    fn spawn_program(program: &str, args: &[String], settings: EncodeSettings, output_path: PathBuf) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VideoError::EncodingFailed {
                reason: format!("Failed to spawn FFmpeg process: {}", e),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| VideoError::EncodingFailed {
            reason: "FFmpeg encoder has no stdin".to_string(),
        })?;
        let stderr = StderrTail::capture(&mut child);

        Ok(Self {
            settings,
            output_path,
            child,
            stdin: Some(stdin),
            stderr: Some(stderr),
            frames_written: 0,
        })
    }

    /// Command-line arguments for the encoder process.
    ///
    /// Input 0 is raw video on stdin, input 1 the audio file; only those two
    /// streams are mapped into the output.
    pub fn encoder_args(settings: &EncodeSettings, audio_path: &Path, output_path: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-loglevel".into(), "error".into(),
            "-f".into(), "rawvideo".into(),
            "-pix_fmt".into(), "rgb24".into(),
            "-s".into(), format!("{}x{}", settings.width, settings.height),
            "-r".into(), settings.fps.to_string(),
            "-i".into(), "pipe:0".into(),
            "-i".into(), audio_path.display().to_string(),
            "-map".into(), "0:v:0".into(),
            "-map".into(), "1:a:0".into(),
            "-c:v".into(), settings.codec.clone(),
            "-preset".into(), settings.preset.clone(),
            "-b:v".into(), settings.bitrate.clone(),
            "-pix_fmt".into(), "yuv420p".into(),
            "-c:a".into(), settings.audio_codec.clone(),
            "-threads".into(), settings.threads.to_string(),
            "-t".into(), format!("{:.6}", settings.duration),
            "-movflags".into(), "+faststart".into(),
        ];
        args.push(output_path.display().to_string());
        args
    }

    /// Write one frame to the encoder
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.width() != self.settings.width || frame.height() != self.settings.height {
            return Err(VideoError::EncodingFailed {
                reason: format!(
                    "frame size mismatch: got {}x{}, expected {}x{}",
                    frame.width(), frame.height(), self.settings.width, self.settings.height
                ),
            }.into());
        }

        let stdin = self.stdin.as_mut().ok_or_else(|| VideoError::EncodingFailed {
            reason: "encoder is already finished".to_string(),
        })?;

        if let Err(e) = stdin.write_all(frame.as_bytes()).await {
            // ffmpeg usually exits early with the real reason on stderr
            self.stdin = None;
            let _ = self.child.wait().await;
            let stderr = self.take_stderr().await;
            return Err(VideoError::EncodingFailed {
                reason: format!("Failed to write frame {} to FFmpeg: {}: {}", self.frames_written, e, stderr),
            }.into());
        }

        self.frames_written += 1;
        Ok(())
    }

    async fn take_stderr(&mut self) -> String {
        match self.stderr.take() {
            Some(tail) => tail.collect().await,
            None => String::new(),
        }
    }

    /// Close the input and wait for ffmpeg to finish the file
    pub async fn finish(mut self) -> Result<EncodedVideo> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin.shutdown().await.map_err(|e| VideoError::EncodingFailed {
                reason: format!("Failed to close FFmpeg input: {}", e),
            })?;
        }

        let status = self.child.wait().await.map_err(|e| VideoError::EncodingFailed {
            reason: format!("Failed to wait for FFmpeg: {}", e),
        })?;
        let stderr = self.take_stderr().await;

        if !status.success() {
            return Err(VideoError::EncodingFailed {
                reason: format!("FFmpeg failed: {}", stderr),
            }.into());
        }

        let metadata = std::fs::metadata(&self.output_path)?;
        info!("Encoded {} frames into {}", self.frames_written, self.output_path.display());

        Ok(EncodedVideo {
            path: self.output_path.display().to_string(),
            duration: self.settings.duration,
            frame_count: self.frames_written,
            file_size: metadata.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(duration: f64) -> EncodeSettings {
        EncodeSettings::from_config(&VideoConfig::default(), duration)
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        let i = args.iter().position(|a| a == flag).unwrap();
        &args[i + 1]
    }

    #[test]
    fn test_encoder_args_use_fixed_codecs() {
        let args = VideoEncoder::encoder_args(
            &settings(10.0),
            Path::new("/tmp/looped.wav"),
            Path::new("ig_reel_final.mp4"),
        );

        assert_eq!(value_after(&args, "-c:v"), "libx264");
        assert_eq!(value_after(&args, "-c:a"), "aac");
        assert_eq!(value_after(&args, "-preset"), "medium");
        assert_eq!(value_after(&args, "-b:v"), "8M");
        assert_eq!(value_after(&args, "-threads"), "4");
        assert_eq!(value_after(&args, "-s"), "1080x1920");
        assert_eq!(value_after(&args, "-r"), "30");
        assert_eq!(value_after(&args, "-t"), "10.000000");
        assert_eq!(args.last().map(String::as_str), Some("ig_reel_final.mp4"));
    }

    #[test]
    fn test_source_audio_is_never_mapped() {
        let args = VideoEncoder::encoder_args(&settings(3.0), Path::new("a.wav"), Path::new("o.mp4"));
        let maps: Vec<&str> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "-map")
            .map(|(i, _)| args[i + 1].as_str())
            .collect();
        assert_eq!(maps, vec!["0:v:0", "1:a:0"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_early_encoder_exit_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let args = vec![
            "-c".to_string(),
            "echo \"Unknown encoder 'libx999'\" >&2; exit 1".to_string(),
        ];
        let mut encoder = VideoEncoder::spawn_program("sh", &args, settings(1.0), dir.path().join("o.mp4")).unwrap();

        let frame = Frame::new_filled(1080, 1920, [0, 0, 0]);
        let mut failure = None;
        for _ in 0..10 {
            if let Err(e) = encoder.write_frame(&frame).await {
                failure = Some(e.to_string());
                break;
            }
        }

        let message = failure.expect("writing to an exited encoder must fail");
        assert!(message.contains("Unknown encoder 'libx999'"), "{message}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_exit_reports_stderr_on_finish() {
        let dir = tempfile::tempdir().unwrap();
        let args = vec![
            "-c".to_string(),
            "cat > /dev/null; echo 'Conversion failed!' >&2; exit 1".to_string(),
        ];
        let encoder = VideoEncoder::spawn_program("sh", &args, settings(1.0), dir.path().join("o.mp4")).unwrap();

        let message = encoder.finish().await.unwrap_err().to_string();
        assert!(message.contains("Conversion failed!"), "{message}");
    }

    #[test]
    fn test_frame_count_rounds_to_nearest_frame() {
        assert_eq!(settings(10.0).frame_count(), 300);
        assert_eq!(settings(4.99).frame_count(), 150);
        assert_eq!(settings(0.001).frame_count(), 1);
    }
}
