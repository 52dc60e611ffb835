use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{
    audio::{loop_to_duration, AudioLoader, LoopPlan},
    banner::{BannerKind, BannerRenderer, BannerStyle, FontResolver},
    composition::timeline::{frame_time, BannerSchedule, BannerTimeline, PlacedBanner},
    config::Config,
    error::{CompositionError, Result},
    video::{CropGeometry, EncodeSettings, EncodedVideo, Frame, FrameReader, VideoEncoder, VideoMetadata, VideoProbe},
};

/// What a finished render produced
#[derive(Debug, Clone)]
pub struct RenderSummary {
    pub output_path: PathBuf,
    pub duration: f64,
    pub frames_encoded: u64,
    pub audio_repeats: usize,
    pub file_size: u64,
}

/// Main engine that turns a source clip and a background track into a reel
///
/// The engine follows a clear pipeline:
/// 1. Video Loading - Probe the source and plan the 9:16 crop
/// 2. Banner Rendering - Rasterize the title and CTA panels
/// 3. Audio Looping - Loop the background track to the clip duration
/// 4. Output Generation - Overlay banners per frame and encode with the looped audio
pub struct ReelEngine {
    config: Config,
}

impl ReelEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Main render method - runs the whole pipeline once
    ///
    /// # Arguments
    ///
    /// * `video_path` - Source video (any container ffmpeg can decode)
    /// * `audio_path` - Background track (WAV, MP3, FLAC, OGG, M4A, AAC)
    /// * `output_path` - Path for the final MP4
    pub async fn render<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
        output_path: P,
    ) -> Result<RenderSummary> {
        let video_path = video_path.as_ref();
        let audio_path = audio_path.as_ref();
        let output_path = output_path.as_ref();

        self.config.validate()?;
        VideoProbe::check_available("ffprobe")?;
        VideoProbe::check_available("ffmpeg")?;

        info!("🎬 Starting reel render");
        info!("   Video: {:?}", video_path);
        info!("   Audio: {:?}", audio_path);
        info!("   Output: {:?}", output_path);

        // Pipeline Step 1: Video Loading
        let (metadata, geometry) = self.load_video(video_path)?;
        let duration = metadata.duration;

        // Pipeline Step 2: Banner Rendering
        let timeline = self.render_banners(duration)?;

        // Pipeline Step 3: Audio Looping
        let looped_audio = tempfile::Builder::new()
            .prefix("reel_audio_")
            .suffix(".wav")
            .tempfile()?;
        let plan = self.loop_audio(audio_path, duration, looped_audio.path()).await?;

        // Pipeline Step 4: Output Generation
        let encoded = self
            .generate_output(video_path, geometry, &timeline, looped_audio.path(), output_path, duration)
            .await?;

        info!("🎉 Reel complete! Output saved to: {:?}", output_path);

        Ok(RenderSummary {
            output_path: output_path.to_path_buf(),
            duration,
            frames_encoded: encoded.frame_count,
            audio_repeats: plan.repeats,
            file_size: encoded.file_size,
        })
    }

    // ==========================================
    // PIPELINE STEP 1: VIDEO LOADING
    // ==========================================

    /// Probe the source clip and plan the crop to the output frame
    fn load_video(&self, video_path: &Path) -> Result<(VideoMetadata, CropGeometry)> {
        info!("📹 Step 1: Loading video...");

        if !VideoProbe::is_supported(video_path) {
            warn!("Unrecognized video extension for {:?}, letting ffmpeg try anyway", video_path);
        }

        let metadata = VideoProbe::probe(video_path)?;
        let geometry = CropGeometry::plan(
            metadata.width,
            metadata.height,
            self.config.video.width,
            self.config.video.height,
        )?;

        info!("   ✅ Source {}x{}, {:.2}s -> scale {}x{}, crop at ({}, {})",
              metadata.width, metadata.height, metadata.duration,
              geometry.scaled_width, geometry.scaled_height, geometry.x, geometry.y);

        Ok((metadata, geometry))
    }

    // ==========================================
    // PIPELINE STEP 2: BANNER RENDERING
    // ==========================================

    /// Render both banners and place them on the half/half schedule
    fn render_banners(&self, duration: f64) -> Result<BannerTimeline> {
        info!("🖋️  Step 2: Rendering banners...");

        let banners = &self.config.banners;
        let font = FontResolver::new(banners.font.clone(), banners.font_candidates.clone()).resolve();
        debug!("Resolved font: {:?}", font.origin);

        let renderer = BannerRenderer::new(&font.face);
        let schedule = BannerSchedule::split(duration)?;

        let mut placed = Vec::with_capacity(2);
        for kind in [BannerKind::Title, BannerKind::Cta] {
            let (text, y) = banners.text_and_y(kind);
            let image = renderer.render(text, &BannerStyle::from_config(banners, kind))?;
            let banner = PlacedBanner::centered(kind, image, self.config.video.width, y, schedule.window(kind));

            info!("   ✅ {} banner {:?} at ({}, {}) for {:.2}s-{:.2}s",
                  kind.name(), text, banner.x, banner.y, banner.window.start, banner.window.end);
            placed.push(banner);
        }

        Ok(BannerTimeline::new(placed))
    }

    // ==========================================
    // PIPELINE STEP 3: AUDIO LOOPING
    // ==========================================

    /// Load the background track, loop it to `duration` and write it as WAV
    async fn loop_audio(&self, audio_path: &Path, duration: f64, looped_path: &Path) -> Result<LoopPlan> {
        info!("🎵 Step 3: Looping background audio...");

        let audio = AudioLoader::load(audio_path).await
            .map_err(|e| {
                warn!("Failed to load audio file: {}", e);
                e
            })?;

        info!("   Loaded: {:.2}s, {} Hz, {} channels",
              audio.duration, audio.sample_rate, audio.channels);

        let (looped, plan) = loop_to_duration(&audio, duration)?;
        looped.write_wav(looped_path)?;

        info!("   ✅ Audio {} x{} -> {:.2}s",
              if plan.is_trim_only() { "trimmed" } else { "looped" },
              plan.repeats, looped.duration);

        Ok(plan)
    }

    // ==========================================
    // PIPELINE STEP 4: OUTPUT GENERATION
    // ==========================================

    /// Decode cropped frames, overlay banners, and encode with the looped audio
    async fn generate_output(
        &self,
        video_path: &Path,
        geometry: CropGeometry,
        timeline: &BannerTimeline,
        looped_audio: &Path,
        output_path: &Path,
        duration: f64,
    ) -> Result<EncodedVideo> {
        info!("🎬 Step 4: Compositing and encoding...");

        let fps = self.config.video.fps;
        let settings = EncodeSettings::from_config(&self.config.video, duration);
        let expected_frames = settings.frame_count();

        let mut reader = FrameReader::open(video_path, geometry, fps)?;
        let mut encoder = VideoEncoder::spawn(settings, looped_audio, output_path)?;

        let mut last_frame: Option<Frame> = None;
        let mut drained = false;

        for index in 0..expected_frames {
            let source = if drained {
                None
            } else {
                match reader.next_frame().await? {
                    Some(frame) => Some(frame),
                    None => {
                        drained = true;
                        warn!("Decoder ended after {} of {} frames, holding last frame",
                              reader.frames_read(), expected_frames);
                        None
                    }
                }
            };

            let mut frame = match (source, &last_frame) {
                (Some(frame), _) => frame,
                (None, Some(previous)) => previous.clone(),
                (None, None) => {
                    return Err(CompositionError::OutputFailed {
                        reason: format!("no frames decoded from {}", video_path.display()),
                    }.into());
                }
            };

            // Keep the clean frame for padding, then overlay
            last_frame = Some(frame.clone());
            timeline.apply(&mut frame, frame_time(index, fps));
            encoder.write_frame(&frame).await?;

            if index > 0 && index % (fps as u64 * 5) == 0 {
                debug!("Encoded {}/{} frames", index, expected_frames);
            }
        }

        reader.finish(drained).await?;
        let encoded = encoder.finish().await
            .map_err(|e| CompositionError::OutputFailed {
                reason: format!("Video encoding failed: {}", e)
            })?;

        info!("   ✅ Output generation complete:");
        info!("      File saved: {:?}", output_path);
        info!("      Duration: {:.2}s", encoded.duration);
        info!("      Frame count: {}", encoded.frame_count);
        info!("      File size: {:.1} MB", encoded.file_size as f64 / 1024.0 / 1024.0);

        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_banners_places_both_halves() {
        let mut config = Config::default();
        // Keep the test independent of installed fonts
        config.banners.font_candidates.clear();
        let engine = ReelEngine::new(config);
        assert!(engine.config().banners.font.is_none());

        let timeline = engine.render_banners(10.0).unwrap();
        let banners = timeline.banners();
        assert_eq!(banners.len(), 2);

        assert_eq!(banners[0].kind, BannerKind::Title);
        assert_eq!((banners[0].x, banners[0].y), (40, 200));
        assert_eq!(banners[0].image.dimensions(), (1000, 150));
        assert_eq!((banners[0].window.start, banners[0].window.end), (0.0, 5.0));

        assert_eq!(banners[1].kind, BannerKind::Cta);
        assert_eq!((banners[1].x, banners[1].y), (40, 1600));
        assert_eq!(banners[1].image.dimensions(), (1000, 160));
        assert_eq!((banners[1].window.start, banners[1].window.end), (5.0, 10.0));
    }

    #[test]
    fn test_one_banner_visible_per_frame() {
        let mut config = Config::default();
        config.banners.font_candidates.clear();
        let engine = ReelEngine::new(config);
        let timeline = engine.render_banners(10.0).unwrap();

        for index in 0..300 {
            let visible: Vec<_> = timeline.active_at(frame_time(index, 30)).map(|b| b.kind).collect();
            let expected = if index < 150 { BannerKind::Title } else { BannerKind::Cta };
            assert_eq!(visible, vec![expected]);
        }
    }

    #[tokio::test]
    async fn test_loop_audio_writes_exact_duration() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("jazz.wav");
        let looped = dir.path().join("looped.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&source, spec).unwrap();
        for i in 0..8000 * 4 {
            writer.write_sample((i % 100) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let engine = ReelEngine::new(Config::default());
        let plan = engine.loop_audio(&source, 10.0, &looped).await.unwrap();
        assert_eq!(plan.repeats, 3);

        let reader = hound::WavReader::open(&looped).unwrap();
        assert_eq!(reader.duration(), 80_000);
    }

    #[test]
    fn test_missing_video_is_fatal() {
        let engine = ReelEngine::new(Config::default());
        assert!(engine.load_video(Path::new("/no/such/clip.mov")).is_err());
    }
}
