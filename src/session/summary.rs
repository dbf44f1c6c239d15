use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::frames::FrameInfo;
use crate::metadata::ImageMetadataRecord;

/// A parsed record with calibration and frame information applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRecord {
    /// Record as parsed from its metadata file
    pub record: ImageMetadataRecord,
    /// Acquisition run (grid square) the record belongs to
    pub run_group: String,
    /// Pixel spacing after calibration (Å)
    pub pixel_spacing: f64,
    /// True if `pixel_spacing` came from the calibration table
    pub calibrated: bool,
    /// Frame information of the companion movie
    pub frames: FrameInfo,
}

impl ResolvedRecord {
    /// Dose rate on the specimen (e/Å²/s), from total dose over exposure time
    pub fn dose_rate(&self) -> Option<f64> {
        let exposure = self.record.exposure_time;
        self.record
            .total_dose
            .filter(|_| exposure > 0.0)
            .map(|dose| dose / exposure)
    }

    /// Dose rate per detector pixel (e/px/s) at the resolved pixel spacing
    pub fn pixel_dose_rate(&self) -> Option<f64> {
        self.dose_rate()
            .map(|rate| rate * self.pixel_spacing * self.pixel_spacing)
    }
}

/// A discovered file that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    /// Metadata file path
    pub path: PathBuf,
    /// Parse error message
    pub reason: String,
}

/// Minimum, maximum and mean of a numeric field over a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericRange {
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Number of values
    pub count: usize,
}

impl NumericRange {
    /// Range over `values`, `None` when there are none
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;

        for value in values.into_iter().filter(|v| v.is_finite()) {
            min = min.min(value);
            max = max.max(value);
            sum += value;
            count += 1;
        }

        (count > 0).then(|| NumericRange {
            min,
            max,
            mean: sum / count as f64,
            count,
        })
    }

    /// True if every value is the same
    pub fn is_constant(&self) -> bool {
        self.min == self.max
    }
}

/// One acquisition run (EPU grid square)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunGroup {
    /// Directory of the run relative to the session root
    pub name: String,
    /// Number of records in the run
    pub images: usize,
    /// Earliest acquisition
    pub first: DateTime<FixedOffset>,
    /// Latest acquisition
    pub last: DateTime<FixedOffset>,
}

/// Aggregate values over all kept records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    /// Exposure time (s)
    pub exposure_time: Option<NumericRange>,
    /// Nominal magnification
    pub magnification: Option<NumericRange>,
    /// Resolved pixel spacing (Å)
    pub pixel_spacing: Option<NumericRange>,
    /// Applied defocus (µm)
    pub defocus: Option<NumericRange>,
    /// Total dose (e/Å²)
    pub total_dose: Option<NumericRange>,
    /// Dose rate (e/Å²/s)
    pub dose_rate: Option<NumericRange>,
    /// Dose rate per pixel (e/px/s)
    pub pixel_dose_rate: Option<NumericRange>,
    /// Detector frame rate (Hz)
    pub frame_rate: Option<NumericRange>,
    /// Accelerating voltage (kV)
    pub voltage: Option<NumericRange>,
    /// Energy filter slit width (eV)
    pub energy_slit_width: Option<NumericRange>,
    /// Frames per movie
    pub frame_count: Option<NumericRange>,
    /// Exposure per frame (s)
    pub exposure_per_frame: Option<NumericRange>,
    /// Stage alpha tilt (degrees)
    pub tilt: Option<NumericRange>,
    /// Earliest acquisition
    pub first_acquisition: Option<DateTime<FixedOffset>>,
    /// Latest acquisition
    pub last_acquisition: Option<DateTime<FixedOffset>>,
    /// Distinct detector names
    pub detectors: BTreeSet<String>,
    /// Distinct software labels
    pub software: BTreeSet<String>,
    /// Distinct instrument models
    pub instrument_models: BTreeSet<String>,
    /// Distinct aperture settings (`C1, C2, C3`)
    pub apertures: BTreeSet<String>,
    /// Distinct condenser spot indices
    pub spot_sizes: BTreeSet<u32>,
    /// Distinct companion movie formats
    pub movie_formats: BTreeSet<String>,
    /// Records whose pixel spacing came from the calibration table
    pub calibrated_records: usize,
    /// Records with a companion movie
    pub movies: usize,
}

impl SessionStats {
    /// Compute statistics over `records`
    pub fn from_records(records: &[ResolvedRecord]) -> Self {
        let field = |f: fn(&ResolvedRecord) -> Option<f64>| {
            NumericRange::from_values(records.iter().filter_map(f))
        };

        SessionStats {
            exposure_time: field(|r| Some(r.record.exposure_time)),
            magnification: field(|r| Some(r.record.nominal_magnification)),
            pixel_spacing: field(|r| Some(r.pixel_spacing)),
            defocus: field(|r| r.record.defocus),
            total_dose: field(|r| r.record.total_dose),
            dose_rate: field(ResolvedRecord::dose_rate),
            pixel_dose_rate: field(ResolvedRecord::pixel_dose_rate),
            frame_rate: field(|r| r.record.frame_rate),
            voltage: field(|r| r.record.voltage),
            energy_slit_width: field(|r| r.record.energy_slit_width),
            frame_count: field(|r| r.frames.frame_count().map(f64::from)),
            exposure_per_frame: field(|r| r.frames.exposure_per_frame()),
            tilt: field(|r| r.record.stage.alpha),
            first_acquisition: records.iter().map(|r| r.record.timestamp).min(),
            last_acquisition: records.iter().map(|r| r.record.timestamp).max(),
            detectors: records.iter().map(|r| r.record.detector.clone()).collect(),
            software: records
                .iter()
                .filter_map(|r| r.record.software_label())
                .collect(),
            instrument_models: records
                .iter()
                .filter_map(|r| r.record.instrument_model.clone())
                .collect(),
            apertures: records
                .iter()
                .filter(|r| r.record.apertures.iter().any(Option::is_some))
                .map(|r| r.record.aperture_label())
                .collect(),
            spot_sizes: records.iter().filter_map(|r| r.record.spot_index).collect(),
            movie_formats: records
                .iter()
                .filter_map(|r| r.record.companion.as_ref())
                .map(|c| c.format.to_string())
                .collect(),
            calibrated_records: records.iter().filter(|r| r.calibrated).count(),
            movies: records
                .iter()
                .filter(|r| r.record.companion.is_some())
                .count(),
        }
    }
}

/// Immutable result of aggregating one session directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    /// Session root directory
    pub root: PathBuf,
    /// Kept records in ascending source path order
    pub records: Vec<ResolvedRecord>,
    /// Files that failed to parse, in discovery order
    pub skipped: Vec<SkippedFile>,
    /// Acquisition runs ordered by name
    pub groups: Vec<RunGroup>,
    /// Number of directories holding metadata files
    pub directories: usize,
    /// Whether companion movies were scanned
    pub scan_enabled: bool,
    /// Aggregate values over `records`
    pub stats: SessionStats,
}

impl SessionSummary {
    /// Build a summary, deriving run groups and statistics from `records`
    pub fn new(
        root: PathBuf,
        records: Vec<ResolvedRecord>,
        skipped: Vec<SkippedFile>,
        directories: usize,
        scan_enabled: bool,
    ) -> Self {
        let groups = run_groups(&records);
        let stats = SessionStats::from_records(&records);
        SessionSummary {
            root,
            records,
            skipped,
            groups,
            directories,
            scan_enabled,
            stats,
        }
    }

    /// Number of metadata files discovered, parsed or not
    pub fn discovered(&self) -> usize {
        self.records.len() + self.skipped.len()
    }
}

fn run_groups(records: &[ResolvedRecord]) -> Vec<RunGroup> {
    let mut groups: BTreeMap<&str, RunGroup> = BTreeMap::new();

    for resolved in records {
        let timestamp = resolved.record.timestamp;
        groups
            .entry(resolved.run_group.as_str())
            .and_modify(|group| {
                group.images += 1;
                group.first = group.first.min(timestamp);
                group.last = group.last.max(timestamp);
            })
            .or_insert_with(|| RunGroup {
                name: resolved.run_group.clone(),
                images: 1,
                first: timestamp,
                last: timestamp,
            });
    }

    groups.into_values().collect()
}
