//! # Composition Engine
//!
//! The composition engine coordinates video cropping, banner rendering and
//! audio looping, then drives the encoder to produce the final reel.

pub mod engine;
pub mod timeline;

// Re-exports for convenience
pub use engine::{ReelEngine, RenderSummary};
pub use timeline::{BannerSchedule, BannerTimeline, BannerWindow, PlacedBanner};
