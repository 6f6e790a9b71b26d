//! External frame-decoder boundary.
//!
//! Video decoding lives outside the core: the ingestion pipeline only
//! needs a duration and the ability to pull one decoded raster at a
//! given time offset. The same implementation must be used for every
//! frame of a unit so fingerprints stay deterministic. The CLI provides
//! an ffmpeg-subprocess implementation; tests use synthetic in-memory
//! sources.

use std::path::Path;

use image::DynamicImage;

use crate::error::Result;

/// Opens media units for frame extraction.
pub trait FrameSource: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoStream>>;
}

/// One opened media unit.
pub trait VideoStream: Send {
    /// Total duration in seconds; zero or negative means the unit is
    /// unreadable and must be skipped.
    fn duration_seconds(&self) -> f64;

    /// Decode the frame nearest to `offset_seconds`. A failure here
    /// skips the frame, not the unit.
    fn frame_at(&mut self, offset_seconds: f64) -> Result<DynamicImage>;
}
