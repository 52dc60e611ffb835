//! Repeats a background track end to end until it covers a target duration.

use tracing::debug;

use crate::audio::types::AudioData;
use crate::error::{AudioError, Result};

/// How a track of `native_frames` is stretched to exactly `target_frames`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopPlan {
    /// Sample frames in the source track
    pub native_frames: usize,

    /// Sample frames in the looped result
    pub target_frames: usize,

    /// Whole copies concatenated before trimming (1 means a plain trim)
    pub repeats: usize,
}

impl LoopPlan {
    /// Plan a loop for a track of `native_frames` frames onto `target_secs` seconds.
    ///
    /// The repeat count is the ceiling of `target / native`, so the concatenation
    /// is never shorter than the target before trimming.
    pub fn new(native_frames: usize, sample_rate: u32, target_secs: f64) -> Result<Self> {
        if !target_secs.is_finite() || target_secs <= 0.0 {
            return Err(AudioError::InvalidParameters {
                details: format!("target duration must be positive, got {}", target_secs)
            }.into());
        }
        if native_frames == 0 || sample_rate == 0 {
            return Err(AudioError::InvalidParameters {
                details: "background track has zero duration".to_string()
            }.into());
        }

        let target_frames = (target_secs * sample_rate as f64).round() as usize;
        if native_frames >= target_frames {
            return Ok(Self { native_frames, target_frames, repeats: 1 });
        }

        // Ceiling division in whole frames; a float ratio can overshoot by one copy
        let repeats = target_frames.div_ceil(native_frames);

        Ok(Self { native_frames, target_frames, repeats })
    }

    /// True when the source already covers the target and only needs trimming
    pub fn is_trim_only(&self) -> bool {
        self.repeats == 1
    }
}

/// Loop `audio` so that it lasts exactly `target_secs` (to the nearest sample frame)
pub fn loop_to_duration(audio: &AudioData, target_secs: f64) -> Result<(AudioData, LoopPlan)> {
    let plan = LoopPlan::new(audio.frame_count(), audio.sample_rate, target_secs)?;
    let channels = audio.channels as usize;
    let target_len = plan.target_frames * channels;

    let samples = if plan.is_trim_only() {
        audio.samples[..target_len].to_vec()
    } else {
        let native_len = plan.native_frames * channels;
        let mut looped = audio.samples[..native_len].repeat(plan.repeats);
        looped.truncate(target_len);
        looped
    };

    debug!(
        "Looped {:.2}s track x{} into {} frames ({:.3}s)",
        audio.duration, plan.repeats, plan.target_frames, target_secs
    );

    let looped = AudioData::from_samples(
        samples,
        audio.sample_rate,
        audio.channels,
        audio.file_path.clone(),
        audio.format.clone(),
    );

    Ok((looped, plan))
}
