//! # Reel-Compositor
//!
//! Turn a landscape clip into a vertical 9:16 reel with text banners and a
//! looped background track.
//!
//! The library crops the source to 1080x1920, shows a title banner during the
//! first half and a call-to-action banner during the second half, replaces the
//! audio with a background track looped to the clip length, and encodes an
//! H.264/AAC MP4 through `ffmpeg`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reel_compositor::{config::Config, ReelEngine};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let mut config = Config::default();
//! config.banners.title = "Live Jazz Every Friday".to_string();
//! config.banners.cta = "Reserve a Table".to_string();
//!
//! let engine = ReelEngine::new(config);
//! let summary = engine.render("bar.mov", "jazz.mp3", "ig_reel_final.mp4").await?;
//! println!("{} frames, audio looped x{}", summary.frames_encoded, summary.audio_repeats);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`video`] - Probing, cropping, frame decoding and encoding via ffmpeg
//! - [`banner`] - Font resolution and banner rasterization
//! - [`audio`] - Audio loading and looping
//! - [`composition`] - Banner timeline and the main render engine
//! - [`config`] - Configuration management

pub mod audio;
pub mod banner;
pub mod composition;
pub mod config;
pub mod error;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    composition::{ReelEngine, RenderSummary},
    config::Config,
    error::{ReelError, Result},
};
