use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use reel_compositor::{config::Config, ReelEngine, ReelError};

#[derive(Parser, Debug)]
#[command(
    name = "reel-compositor",
    version,
    about = "Render a 9:16 reel with title/CTA banners and looped background audio",
    long_about = "Reel-Compositor crops a video to 1080x1920, overlays a title banner for the first half and a call-to-action banner for the second half, and replaces the audio with a background track looped to the video length."
)]
struct Cli {
    /// Source video file
    #[arg(long)]
    video: PathBuf,

    /// Background audio file (WAV, MP3, FLAC, OGG, M4A, AAC)
    #[arg(long)]
    audio: PathBuf,

    /// Output video file path
    #[arg(long, default_value = "ig_reel_final.mp4")]
    out: PathBuf,

    /// First-half banner text
    #[arg(long)]
    title: Option<String>,

    /// Second-half call-to-action text
    #[arg(long)]
    cta: Option<String>,

    /// Font file for the banners (empty for none)
    #[arg(long)]
    font: Option<String>,

    /// Output frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Output video bitrate (e.g. 8M, 4500k)
    #[arg(long)]
    bitrate: Option<String>,

    /// Title banner vertical position
    #[arg(long = "top_y", alias = "top-y", allow_negative_numbers = true)]
    top_y: Option<i32>,

    /// CTA banner vertical position
    #[arg(long = "bottom_y", alias = "bottom-y", allow_negative_numbers = true)]
    bottom_y: Option<i32>,

    /// Title font size
    #[arg(long = "title_size", alias = "title-size")]
    title_size: Option<f32>,

    /// CTA font size
    #[arg(long = "cta_size", alias = "cta-size")]
    cta_size: Option<f32>,

    /// Banner panel width
    #[arg(long = "box_width", alias = "box-width")]
    box_width: Option<u32>,

    /// Title panel height
    #[arg(long = "title_box_height", alias = "title-box-height")]
    title_box_height: Option<u32>,

    /// CTA panel height
    #[arg(long = "cta_box_height", alias = "cta-box-height")]
    cta_box_height: Option<u32>,

    /// Panel opacity (0-255)
    #[arg(long)]
    opacity: Option<u8>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Apply explicit flags on top of file or default settings
    fn apply_overrides(&self, config: &mut Config) {
        let banners = &mut config.banners;

        if let Some(title) = &self.title {
            banners.title = title.clone();
        }
        if let Some(cta) = &self.cta {
            banners.cta = cta.clone();
        }
        if let Some(font) = &self.font {
            banners.font = if font.is_empty() { None } else { Some(PathBuf::from(font)) };
        }
        if let Some(v) = self.top_y { banners.top_y = v; }
        if let Some(v) = self.bottom_y { banners.bottom_y = v; }
        if let Some(v) = self.title_size { banners.title_size = v; }
        if let Some(v) = self.cta_size { banners.cta_size = v; }
        if let Some(v) = self.box_width { banners.box_width = v; }
        if let Some(v) = self.title_box_height { banners.title_box_height = v; }
        if let Some(v) = self.cta_box_height { banners.cta_box_height = v; }
        if let Some(v) = self.opacity { banners.opacity = v; }

        if let Some(fps) = self.fps {
            config.video.fps = fps;
        }
        if let Some(bitrate) = &self.bitrate {
            config.video.bitrate = bitrate.clone();
        }
    }

    fn load_config(&self) -> reel_compositor::Result<Config> {
        let mut config = match &self.config {
            Some(config_path) => {
                info!("Loading configuration from {:?}", config_path);
                Config::from_file(config_path)?
            }
            None => {
                info!("Using default configuration");
                Config::default()
            }
        };

        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Reel-Compositor v{}", env!("CARGO_PKG_VERSION"));

    match run(&cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("{}", e.user_message());
            Err(e.into())
        }
    }
}

async fn run(cli: &Cli) -> std::result::Result<(), ReelError> {
    let config = cli.load_config()?;
    let engine = ReelEngine::new(config);

    let summary = engine.render(&cli.video, &cli.audio, &cli.out).await?;

    info!("Reel written to {:?} ({:.2}s, {} frames, audio x{}, {} bytes)",
          summary.output_path, summary.duration, summary.frames_encoded,
          summary.audio_repeats, summary.file_size);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["reel-compositor", "--video", "bar.mov", "--audio", "jazz.mp3"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.out, PathBuf::from("ig_reel_final.mp4"));
        assert!(cli.title.is_none());

        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.banners.title, "Premium Drink Menu Available on Sundays!");
        assert_eq!(config.video.fps, 30);
    }

    #[test]
    fn test_video_and_audio_are_required() {
        assert!(Cli::try_parse_from(["reel-compositor", "--video", "bar.mov"]).is_err());
        assert!(Cli::try_parse_from(["reel-compositor", "--audio", "jazz.mp3"]).is_err());
    }

    #[test]
    fn test_underscore_and_kebab_spellings() {
        let cli = parse(&["--top_y", "300", "--bottom-y", "1500", "--title_box_height", "180"]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.banners.top_y, 300);
        assert_eq!(config.banners.bottom_y, 1500);
        assert_eq!(config.banners.title_box_height, 180);
    }

    #[test]
    fn test_overrides_win_over_file_values() {
        let mut config = Config::default();
        config.banners.cta = "From file".to_string();
        config.banners.opacity = 10;

        let cli = parse(&["--cta", "Call Us", "--fps", "25", "--bitrate", "4500k"]);
        cli.apply_overrides(&mut config);

        assert_eq!(config.banners.cta, "Call Us");
        assert_eq!(config.banners.opacity, 10);
        assert_eq!(config.video.fps, 25);
        assert_eq!(config.video.bitrate, "4500k");
    }

    #[test]
    fn test_empty_font_means_none() {
        let mut config = Config::default();
        config.banners.font = Some(PathBuf::from("/fonts/a.ttf"));

        parse(&["--font", ""]).apply_overrides(&mut config);
        assert!(config.banners.font.is_none());

        parse(&["--font", "/fonts/b.ttf"]).apply_overrides(&mut config);
        assert_eq!(config.banners.font, Some(PathBuf::from("/fonts/b.ttf")));
    }

    #[test]
    fn test_opacity_range() {
        assert!(Cli::try_parse_from([
            "reel-compositor", "--video", "a", "--audio", "b", "--opacity", "256",
        ]).is_err());
        assert_eq!(parse(&["--opacity", "255"]).opacity, Some(255));
    }

    #[test]
    fn test_config_file_then_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reel.toml");
        let mut file_config = Config::default();
        file_config.banners.title = "From file".to_string();
        file_config.save_to_file(&path).unwrap();

        let cli = parse(&["--config", path.to_str().unwrap(), "--cta", "Book Today"]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.banners.title, "From file");
        assert_eq!(config.banners.cta, "Book Today");
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = parse(&["--bitrate", "fast"]);
        assert!(cli.load_config().is_err());
    }
}
