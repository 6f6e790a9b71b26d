//! ffmpeg/ffprobe subprocess implementation of the decoder boundary.
//!
//! The decode subprocess is an external collaborator: ffprobe supplies
//! the unit duration, and each sampled frame is extracted with a
//! single-frame seek piped back as PNG. Both ingestion and preview
//! tooling call the same binaries, keeping decoded rasters consistent.

use std::path::{Path, PathBuf};
use std::process::Command;

use framefind_core::{FrameSource, FramefindError, VideoStream};
use image::DynamicImage;

pub struct FfmpegSource;

impl FrameSource for FfmpegSource {
    fn open(&self, path: &Path) -> framefind_core::Result<Box<dyn VideoStream>> {
        let duration = probe_duration(path)?;
        Ok(Box::new(FfmpegStream {
            path: path.to_path_buf(),
            duration,
        }))
    }
}

struct FfmpegStream {
    path: PathBuf,
    duration: f64,
}

impl VideoStream for FfmpegStream {
    fn duration_seconds(&self) -> f64 {
        self.duration
    }

    fn frame_at(&mut self, offset_seconds: f64) -> framefind_core::Result<DynamicImage> {
        let output = Command::new("ffmpeg")
            .args([
                "-loglevel",
                "error",
                "-ss",
                &format!("{:.3}", offset_seconds),
                "-i",
            ])
            .arg(&self.path)
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .output()?;

        if !output.status.success() || output.stdout.is_empty() {
            return Err(FramefindError::Decode(format!(
                "ffmpeg produced no frame at {:.3}s: {}",
                offset_seconds,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        image::load_from_memory(&output.stdout)
            .map_err(|e| FramefindError::Decode(e.to_string()))
    }
}

fn probe_duration(path: &Path) -> framefind_core::Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .map_err(|e| FramefindError::IngestUnit {
            unit: path.display().to_string(),
            reason: format!("ffprobe failed to start: {}", e),
        })?;

    if !output.status.success() {
        return Err(FramefindError::IngestUnit {
            unit: path.display().to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse::<f64>()
        .map_err(|e| FramefindError::IngestUnit {
            unit: path.display().to_string(),
            reason: format!("unparseable duration: {}", e),
        })
}
