use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info};

use crate::error::{Result, VideoError};
use crate::video::crop::CropGeometry;
use crate::video::process::StderrTail;
use crate::video::types::Frame;

/// Streams cropped RGB24 frames out of an ffmpeg decoder process
pub struct FrameReader {
    child: Child,
    stdout: ChildStdout,
    stderr: StderrTail,
    geometry: CropGeometry,
    frames_read: u64,
}

impl FrameReader {
    /// Start decoding `path`, scaled and cropped per `geometry`, resampled to `fps`.
    ///
    /// Must be called inside a tokio runtime; stderr is drained by a background task.
    pub fn open<P: AsRef<Path>>(path: P, geometry: CropGeometry, fps: u32) -> Result<Self> {
        let path = path.as_ref();
        let args = Self::decoder_args(path, &geometry, fps);
        debug!("Spawning decoder: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VideoError::DecodingFailed {
                reason: format!("Failed to spawn FFmpeg decoder: {}", e),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| VideoError::DecodingFailed {
            reason: "FFmpeg decoder has no stdout".to_string(),
        })?;
        let stderr = StderrTail::capture(&mut child);

        info!("Decoding {} at {}x{} @ {}fps", path.display(), geometry.width, geometry.height, fps);

        Ok(Self {
            child,
            stdout,
            stderr,
            geometry,
            frames_read: 0,
        })
    }

    /// Command-line arguments for the decoder process
    pub fn decoder_args(path: &Path, geometry: &CropGeometry, fps: u32) -> Vec<String> {
        let mut args: Vec<String> = ["-v", "error", "-nostdin", "-i"]
            .into_iter()
            .map(String::from)
            .collect();
        args.push(PathBuf::from(path).display().to_string());
        args.extend(
            [
                "-an".to_string(),
                "-vf".to_string(),
                geometry.filter_chain(fps),
                "-f".to_string(),
                "rawvideo".to_string(),
                "-pix_fmt".to_string(),
                "rgb24".to_string(),
                "pipe:1".to_string(),
            ],
        );
        args
    }

    /// Read the next frame, or `None` once the decoder has no more output
    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut buffer = vec![0u8; self.geometry.frame_len()];
        let mut filled = 0;

        while filled < buffer.len() {
            let n = self.stdout.read(&mut buffer[filled..]).await.map_err(|e| {
                VideoError::DecodingFailed {
                    reason: format!("Failed to read decoded frame: {}", e),
                }
            })?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }
        if filled < buffer.len() {
            return Err(VideoError::DecodingFailed {
                reason: format!(
                    "truncated frame {}: got {} of {} bytes",
                    self.frames_read,
                    filled,
                    buffer.len()
                ),
            }.into());
        }

        self.frames_read += 1;
        let frame = Frame::from_rgb_bytes(self.geometry.width, self.geometry.height, buffer)
            .ok_or_else(|| VideoError::DecodingFailed {
                reason: "decoded frame has unexpected size".to_string(),
            })?;
        Ok(Some(frame))
    }

    /// Frames delivered so far
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Stop the decoder and report a failed exit.
    ///
    /// Frames left unread are discarded; ffmpeg is killed rather than drained.
    pub async fn finish(mut self, drained: bool) -> Result<()> {
        if !drained {
            debug!("Stopping decoder after {} frames", self.frames_read);
            let _ = self.child.start_kill();
            let _ = self.child.wait().await;
            return Ok(());
        }

        drop(self.stdout);
        let status = self.child.wait().await.map_err(|e| VideoError::DecodingFailed {
            reason: format!("Failed to wait for FFmpeg decoder: {}", e),
        })?;
        let stderr = self.stderr.collect().await;

        if !status.success() {
            return Err(VideoError::DecodingFailed {
                reason: format!("FFmpeg failed: {}", stderr),
            }.into());
        }

        Ok(())
    }
}
