//! # Video Processing Module
//!
//! Probes the source, plans the 9:16 crop, and drives the ffmpeg decoder and
//! encoder processes frame by frame.

pub mod crop;
pub mod decoder;
pub mod encoder;
pub mod probe;
pub(crate) mod process;
pub mod types;

pub use crop::CropGeometry;
pub use decoder::FrameReader;
pub use encoder::{EncodeSettings, EncodedVideo, VideoEncoder};
pub use probe::{VideoMetadata, VideoProbe};
pub use types::Frame;
