use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AudioError, Result};

/// Raw audio data with metadata
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples (interleaved for stereo, mono for single channel)
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Duration in seconds
    pub duration: f64,

    /// Original file path
    pub file_path: PathBuf,

    /// Audio format information
    pub format: AudioFormat,
}

impl AudioData {
    /// Build audio data from interleaved samples, deriving the duration
    pub fn from_samples(
        samples: Vec<f32>,
        sample_rate: u32,
        channels: u16,
        file_path: PathBuf,
        format: AudioFormat,
    ) -> Self {
        let duration = if sample_rate == 0 || channels == 0 {
            0.0
        } else {
            samples.len() as f64 / (sample_rate as f64 * channels as f64)
        };

        Self {
            samples,
            sample_rate,
            channels,
            duration,
            file_path,
            format,
        }
    }

    /// Number of sample frames (one sample per channel)
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Write the samples as a 32-bit float WAV file
    pub fn write_wav<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let write_failed = |e: hound::Error| AudioError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut writer = hound::WavWriter::create(path, spec).map_err(write_failed)?;
        for &sample in &self.samples {
            writer.write_sample(sample).map_err(write_failed)?;
        }
        writer.finalize().map_err(write_failed)?;

        Ok(())
    }
}

/// Audio file format information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFormat {
    /// File extension (wav, mp3, flac, etc.)
    pub extension: String,

    /// Bit depth (16, 24, 32, etc.)
    pub bit_depth: Option<u16>,

    /// Compression type (if any)
    pub compression: Option<String>,
}

impl AudioFormat {
    /// Format descriptor for buffers synthesized in memory
    pub fn pcm_float() -> Self {
        Self {
            extension: "wav".to_string(),
            bit_depth: Some(32),
            compression: None,
        }
    }
}
