//! # Audio Module
//!
//! Decodes the background track and loops it to the length of the video.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use reel_compositor::audio::{loop_to_duration, AudioLoader};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let jazz = AudioLoader::load("jazz.mp3").await?;
//! let (looped, plan) = loop_to_duration(&jazz, 10.0)?;
//!
//! println!("Repeated {} times, {:.2}s", plan.repeats, looped.duration);
//! looped.write_wav("jazz_looped.wav")?;
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod looper;
pub mod types;
pub use loader::AudioLoader;
pub use looper::{loop_to_duration, LoopPlan};
pub use types::{AudioData, AudioFormat};
