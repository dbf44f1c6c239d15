//! # Frame counting for companion movies
//!
//! Each acquisition may have a raw movie next to its metadata file. The frame
//! count is recovered from container structure only (TIFF directory chain or
//! MRC header) so scanning stays cheap for multi-gigabyte EER files.
//!
//! Scanning is best-effort: a missing, truncated or unrecognized movie yields
//! [`FrameInfo::Unknown`], never an error.

mod error;
mod mrc;
mod tiff;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::metadata::{CompanionFile, MovieFormat};

pub use error::ScanError;

/// Frame information for one movie
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FrameInfo {
    /// Frame count recovered from the container
    Known {
        /// Number of frames (IFDs or MRC sections)
        frame_count: u32,
        /// Exposure time divided by the frame count (s)
        exposure_per_frame: f64,
    },
    /// Scan disabled, movie missing, or container unreadable
    Unknown,
}

impl FrameInfo {
    /// Build from a frame count and the total exposure time (s)
    pub fn from_count(frame_count: u32, exposure_time: f64) -> Self {
        if frame_count == 0 {
            return FrameInfo::Unknown;
        }
        FrameInfo::Known {
            frame_count,
            exposure_per_frame: exposure_time / f64::from(frame_count),
        }
    }

    /// Frame count, if known
    pub fn frame_count(&self) -> Option<u32> {
        match self {
            FrameInfo::Known { frame_count, .. } => Some(*frame_count),
            FrameInfo::Unknown => None,
        }
    }

    /// Per-frame exposure (s), if known
    pub fn exposure_per_frame(&self) -> Option<f64> {
        match self {
            FrameInfo::Known {
                exposure_per_frame, ..
            } => Some(*exposure_per_frame),
            FrameInfo::Unknown => None,
        }
    }
}

/// Capability to recover frame information for a companion movie
pub trait FrameScanner {
    /// Inspect `companion`; `exposure_time` is the total exposure in seconds
    fn scan(&self, companion: &CompanionFile, exposure_time: f64) -> FrameInfo;
}

/// Scanner reading TIFF/EER directory chains and MRC headers
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerScanner;

impl FrameScanner for ContainerScanner {
    fn scan(&self, companion: &CompanionFile, exposure_time: f64) -> FrameInfo {
        match count_frames(&companion.path, companion.format) {
            Ok(frames) => {
                debug!("  {} frames in {}", frames, companion.path.display());
                FrameInfo::from_count(frames, exposure_time)
            }
            Err(e) => {
                debug!(
                    "Frame scan of {} failed, frame count unknown: {}",
                    companion.path.display(),
                    e
                );
                FrameInfo::Unknown
            }
        }
    }
}

/// Count the frames of a movie without reading pixel data
pub fn count_frames(path: &Path, format: MovieFormat) -> Result<u32, ScanError> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    let reader = BufReader::new(file);

    let frames = match format {
        MovieFormat::Eer | MovieFormat::Tiff => tiff::count_directories(reader, len)?,
        MovieFormat::Mrc => mrc::section_count(reader)?,
    };
    if frames == 0 {
        return Err(ScanError::NoFrames);
    }
    Ok(frames)
}
