use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Largest accepted banner font size in pixels
pub const MAX_FONT_SIZE: f32 = 2000.0;

/// Font files tried, in order, when no usable font override is given
pub const DEFAULT_FONT_CANDIDATES: [&str; 5] = [
    "DejaVuSerif-Bold.ttf",
    "DejaVuSerif.ttf",
    "Arial.ttf",
    "FreeSerifBold.ttf",
    "Times New Roman.ttf",
];

/// Main configuration for the Reel-Compositor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output video and encoder settings
    pub video: VideoConfig,

    /// Banner text and layout settings
    pub banners: BannerConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.video.validate()?;
        self.banners.validate()?;
        Ok(())
    }
}

/// Output video and encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Output frame width in pixels
    pub width: u32,

    /// Output frame height in pixels
    pub height: u32,

    /// Output frame rate
    pub fps: u32,

    /// Video bitrate in ffmpeg notation (e.g. "6M", "8M")
    pub bitrate: String,

    /// Video encoder name
    pub codec: String,

    /// Audio encoder name
    pub audio_codec: String,

    /// x264 speed preset
    pub preset: String,

    /// Encoder worker threads
    pub threads: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            bitrate: "8M".to_string(),
            codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "medium".to_string(),
            threads: 4,
        }
    }
}

impl VideoConfig {
    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(ConfigError::InvalidValue {
                key: "video.resolution".to_string(),
                value: format!("{}x{}", self.width, self.height)
            }.into());
        }

        if self.fps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "video.fps".to_string(),
                value: self.fps.to_string()
            }.into());
        }

        if !is_valid_bitrate(&self.bitrate) {
            return Err(ConfigError::InvalidValue {
                key: "video.bitrate".to_string(),
                value: self.bitrate.clone()
            }.into());
        }

        for (key, value) in [
            ("video.codec", &self.codec),
            ("video.audio_codec", &self.audio_codec),
            ("video.preset", &self.preset),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone()
                }.into());
            }
        }

        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "video.threads".to_string(),
                value: self.threads.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Banner text and layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerConfig {
    /// Text shown during the first half
    pub title: String,

    /// Text shown during the second half
    pub cta: String,

    /// Optional font file tried before the system candidates
    pub font: Option<PathBuf>,

    /// Title font size in pixels
    pub title_size: f32,

    /// CTA font size in pixels
    pub cta_size: f32,

    /// Panel width shared by both banners
    pub box_width: u32,

    /// Title panel height
    pub title_box_height: u32,

    /// CTA panel height
    pub cta_box_height: u32,

    /// Panel background alpha (0-255)
    pub opacity: u8,

    /// Vertical position of the title panel
    pub top_y: i32,

    /// Vertical position of the CTA panel
    pub bottom_y: i32,

    /// Text color (RGBA)
    pub font_color: [u8; 4],

    /// Panel corner radius in pixels
    pub corner_radius: u32,

    /// System font file names tried after the override
    pub font_candidates: Vec<String>,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            title: "Premium Drink Menu Available on Sundays!".to_string(),
            cta: "Book Now".to_string(),
            font: None,
            title_size: 65.0,
            cta_size: 90.0,
            box_width: 1000,
            title_box_height: 150,
            cta_box_height: 160,
            opacity: 160,
            top_y: 200,
            bottom_y: 1600,
            font_color: [255, 255, 255, 255],
            corner_radius: 20,
            font_candidates: DEFAULT_FONT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl BannerConfig {
    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("banners.box_width", self.box_width),
            ("banners.title_box_height", self.title_box_height),
            ("banners.cta_box_height", self.cta_box_height),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string()
                }.into());
            }
        }

        for (key, value) in [("banners.title_size", self.title_size), ("banners.cta_size", self.cta_size)] {
            if !value.is_finite() || value <= 0.0 || value > MAX_FONT_SIZE {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string()
                }.into());
            }
        }

        Ok(())
    }

    /// Background color of both panels: black at the configured opacity
    pub fn background_color(&self) -> [u8; 4] {
        [0, 0, 0, self.opacity]
    }
}

/// Accepts ffmpeg-style bitrates such as "8M", "1.5M", "6000k" or "2500000"
fn is_valid_bitrate(value: &str) -> bool {
    let number = value.trim_end_matches(['k', 'K', 'M', 'G']);
    let suffix_len = value.len() - number.len();
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());

    suffix_len <= 1
        && !whole.is_empty()
        && all_digits(whole)
        && all_digits(fraction)
        && !number.ends_with('.')
}
