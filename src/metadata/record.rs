use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Stage position at acquisition time.
///
/// Linear axes are in micrometres, the alpha tilt in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StagePosition {
    /// Stage X (µm)
    pub x: f64,
    /// Stage Y (µm)
    pub y: f64,
    /// Stage Z (µm)
    pub z: f64,
    /// Alpha tilt (degrees), when reported
    pub alpha: Option<f64>,
}

/// Container format of a companion movie file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MovieFormat {
    /// Electron-event representation (TIFF container)
    Eer,
    /// Multi-page TIFF of dose fractions
    Tiff,
    /// MRC stack of dose fractions
    Mrc,
}

impl MovieFormat {
    /// Lower-case label used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            MovieFormat::Eer => "eer",
            MovieFormat::Tiff => "tiff",
            MovieFormat::Mrc => "mrc",
        }
    }
}

impl fmt::Display for MovieFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw detector movie stored next to a metadata file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionFile {
    /// Path of the movie
    pub path: PathBuf,
    /// Container format, derived from the file name suffix
    pub format: MovieFormat,
}

/// Sibling suffixes probed for a companion movie, in priority order
const COMPANION_SUFFIXES: &[(&str, MovieFormat)] = &[
    ("_EER.eer", MovieFormat::Eer),
    ("_Fractions.tiff", MovieFormat::Tiff),
    ("_Fractions.tif", MovieFormat::Tiff),
    ("_Fractions.mrc", MovieFormat::Mrc),
];

impl CompanionFile {
    /// Locate the movie belonging to `xml_path`.
    ///
    /// EPU writes `<stem>.xml` next to `<stem>_EER.eer` or `<stem>_Fractions.*`.
    pub fn locate(xml_path: &Path) -> Option<Self> {
        let stem = xml_path.file_stem()?.to_str()?;
        COMPANION_SUFFIXES.iter().find_map(|(suffix, format)| {
            let candidate = xml_path.with_file_name(format!("{stem}{suffix}"));
            candidate.is_file().then(|| CompanionFile {
                path: candidate,
                format: *format,
            })
        })
    }
}

/// Metadata extracted from one per-image XML document.
///
/// Units are normalized at parse time so that every record of a session is
/// directly comparable:
///
/// | Field | Unit |
/// |-------|------|
/// | `exposure_time` | s |
/// | `pixel_spacing` | Å |
/// | `stage` x/y/z, `defocus` | µm |
/// | `stage.alpha` | degrees |
/// | `voltage` | kV |
/// | `energy_slit_width` | eV |
/// | `total_dose` | e/Å² |
/// | `frame_rate` | Hz |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadataRecord {
    /// Metadata file this record was parsed from
    pub source: PathBuf,
    /// Acquisition timestamp
    pub timestamp: DateTime<FixedOffset>,
    /// Instrument-reported magnification
    pub nominal_magnification: f64,
    /// Detector name
    pub detector: String,
    /// Exposure time
    pub exposure_time: f64,
    /// Stage position
    pub stage: StagePosition,
    /// Instrument-reported pixel spacing
    pub pixel_spacing: f64,
    /// Accelerating voltage
    pub voltage: Option<f64>,
    /// Condenser spot index
    pub spot_index: Option<u32>,
    /// Condenser aperture names (C1, C2, C3)
    pub apertures: [Option<String>; 3],
    /// Energy filter slit width
    pub energy_slit_width: Option<f64>,
    /// Applied defocus
    pub defocus: Option<f64>,
    /// Total dose reported by the detector
    pub total_dose: Option<f64>,
    /// Detector frame rate
    pub frame_rate: Option<f64>,
    /// Acquisition software name
    pub software: Option<String>,
    /// Acquisition software version
    pub software_version: Option<String>,
    /// Microscope model
    pub instrument_model: Option<String>,
    /// Companion movie, if one exists next to the metadata file
    pub companion: Option<CompanionFile>,
}

impl ImageMetadataRecord {
    /// Software name with a three-component version, e.g. `EPU v 3.6.0`
    pub fn software_label(&self) -> Option<String> {
        let name = self.software.as_deref()?;
        Some(match self.software_version.as_deref() {
            Some(version) => {
                let short: Vec<&str> = version.splitn(4, '.').take(3).collect();
                format!("{} v {}", name, short.join("."))
            }
            None => name.to_string(),
        })
    }

    /// Aperture names joined as `C1, C2, C3`, `N/A` for each unknown entry
    pub fn aperture_label(&self) -> String {
        self.apertures
            .iter()
            .map(|a| a.as_deref().unwrap_or("N/A"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
