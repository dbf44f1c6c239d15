use std::collections::BTreeSet;
use std::fmt::Display;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::rtf::{Cell, RtfDocument, Table};
use crate::session::{NumericRange, ResolvedRecord, SessionSummary};

const NOT_AVAILABLE: &str = "N/A";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Report values the metadata files do not carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Document title
    pub title: String,
    /// Microscope name; falls back to the instrument model in the metadata
    pub microscope: Option<String>,
    /// Collection method, e.g. `AFIS`
    pub collection_method: Option<String>,
    /// Spherical aberration (mm)
    pub spherical_aberration: Option<f64>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: "Data acquisition parameters".to_string(),
            microscope: None,
            collection_method: None,
            spherical_aberration: None,
        }
    }
}

/// Renders a [`SessionSummary`] as an RTF report.
///
/// Rendering is a pure function of the summary and options: no clock reads,
/// no environment, so the same input always gives the same bytes.
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    options: ReportOptions,
}

impl ReportRenderer {
    /// Renderer with the given options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Render the full document
    pub fn render(&self, summary: &SessionSummary) -> String {
        let mut doc = RtfDocument::new();
        doc.title(&self.options.title);
        for line in session_header(summary) {
            doc.paragraph(&line);
        }

        doc.heading("Parameters").table(&self.parameter_table(summary));
        doc.heading("Acquisition runs").table(&run_table(summary));
        doc.heading("Images").table(&detail_table(summary));

        if !summary.skipped.is_empty() {
            let mut table = Table::new(&[3, 2], &["File", "Reason"]);
            for skipped in &summary.skipped {
                table.row([display_path(summary, &skipped.path), skipped.reason.clone()]);
            }
            doc.heading("Skipped files").table(&table);
        }

        doc.finish()
    }

    /// Hardware on the left, acquisition settings on the right
    fn parameter_table(&self, summary: &SessionSummary) -> Table {
        let stats = &summary.stats;
        let frames_scanned = |range: Option<NumericRange>, precision: usize| {
            if summary.scan_enabled {
                format_range(range, precision)
            } else {
                NOT_AVAILABLE.to_string()
            }
        };

        let microscope = self
            .options
            .microscope
            .clone()
            .unwrap_or_else(|| join_distinct(&stats.instrument_models));

        let hardware = vec![
            ("Microscope", microscope),
            ("Detector", join_distinct(&stats.detectors)),
            ("Detector frame rate (Hz)", format_range(stats.frame_rate, 0)),
            ("Accelerating voltage (kV)", format_range(stats.voltage, 0)),
            (
                "Spherical aberration (mm)",
                self.options
                    .spherical_aberration
                    .map(|cs| format!("{cs}"))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            ("Apertures (C1, C2, C3)", join_distinct(&stats.apertures)),
            ("Energy filter slit (eV)", format_range(stats.energy_slit_width, 0)),
            ("Spot size", join_distinct(&stats.spot_sizes)),
            ("Nominal magnification", format_magnification(stats.magnification)),
            ("Pixel size (Å)", format_range(stats.pixel_spacing, 3)),
            ("Tilt angle (°)", format_range(stats.tilt, 1)),
        ];

        let acquisition = vec![
            ("Data collection", join_distinct(&stats.software)),
            (
                "Collection method",
                self.options
                    .collection_method
                    .clone()
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            ("Movie format", join_distinct(&stats.movie_formats)),
            ("Defocus range (µm)", format_defocus(stats.defocus)),
            ("Exposure time (s)", format_range(stats.exposure_time, 2)),
            ("Total dose (e/Å²)", format_range(stats.total_dose, 2)),
            ("Dose (e/Å²/s)", format_range(stats.dose_rate, 2)),
            ("Dose (e/px/s)", format_range(stats.pixel_dose_rate, 2)),
            ("Total frames (#)", frames_scanned(stats.frame_count, 0)),
            ("Exposure per frame (s)", frames_scanned(stats.exposure_per_frame, 4)),
            ("Images", summary.records.len().to_string()),
            ("Calibrated pixel size", calibration_note(summary)),
        ];

        let mut table = Table::new(&[3, 2, 3, 2], &["Hardware", "", "Acquisition", ""]);
        let labelled = |entry: Option<&(&str, String)>| match entry {
            Some((label, value)) => [Cell::bold(*label), Cell::new(value.clone())],
            None => [Cell::empty(), Cell::empty()],
        };
        for i in 0..hardware.len().max(acquisition.len()) {
            let [left_label, left] = labelled(hardware.get(i));
            let [right_label, right] = labelled(acquisition.get(i));
            table.row([left_label, left, right_label, right]);
        }
        table
    }
}

fn session_header(summary: &SessionSummary) -> Vec<String> {
    let stats = &summary.stats;
    let mut lines = vec![
        format!("Session directory: {}", summary.root.display()),
        format!(
            "Metadata files: {} found, {} parsed, {} skipped in {} directories",
            summary.discovered(),
            summary.records.len(),
            summary.skipped.len(),
            summary.directories
        ),
    ];
    if let (Some(first), Some(last)) = (stats.first_acquisition, stats.last_acquisition) {
        lines.push(format!(
            "Acquired: {} to {}",
            format_time(&first),
            format_time(&last)
        ));
    }
    if !summary.scan_enabled {
        lines.push("Movie scanning disabled; frame counts not determined".to_string());
    }
    lines
}

fn run_table(summary: &SessionSummary) -> Table {
    let mut table = Table::new(&[4, 1, 2, 2], &["Run", "Images", "First", "Last"]);
    for group in &summary.groups {
        table.row([
            group.name.clone(),
            group.images.to_string(),
            format_time(&group.first),
            format_time(&group.last),
        ]);
    }
    table
}

fn detail_table(summary: &SessionSummary) -> Table {
    let mut table = Table::new(
        &[5, 3, 2, 2, 1, 2, 2],
        &[
            "File",
            "Acquired",
            "Defocus (µm)",
            "Exposure (s)",
            "Frames",
            "Exp./frame (s)",
            "Pixel (Å)",
        ],
    );
    for resolved in &summary.records {
        table.row(detail_row(summary, resolved));
    }
    table
}

fn detail_row(summary: &SessionSummary, resolved: &ResolvedRecord) -> [String; 7] {
    let record = &resolved.record;
    let pixel = if resolved.calibrated {
        format!("{:.3}*", resolved.pixel_spacing)
    } else {
        format!("{:.3}", resolved.pixel_spacing)
    };
    [
        display_path(summary, &record.source),
        format_time(&record.timestamp),
        format_option(record.defocus, 1),
        format!("{:.2}", record.exposure_time),
        format_option(resolved.frames.frame_count().map(f64::from), 0),
        format_option(resolved.frames.exposure_per_frame(), 4),
        pixel,
    ]
}

fn calibration_note(summary: &SessionSummary) -> String {
    match summary.stats.calibrated_records {
        0 => "no".to_string(),
        n if n == summary.records.len() => "yes".to_string(),
        n => format!("{} of {} images (marked *)", n, summary.records.len()),
    }
}

fn display_path(summary: &SessionSummary, path: &std::path::Path) -> String {
    path.strip_prefix(&summary.root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn format_time(time: &DateTime<FixedOffset>) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn format_option(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{v:.precision$}"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Single value when constant, otherwise `min to max`
pub(crate) fn format_range(range: Option<NumericRange>, precision: usize) -> String {
    match range {
        None => NOT_AVAILABLE.to_string(),
        Some(r) if r.is_constant() => format!("{:.precision$}", r.min),
        Some(r) => format!("{:.precision$} to {:.precision$}", r.min, r.max),
    }
}

/// Defocus reads from closest to focus to furthest: `-0.8 to -2.0`
pub(crate) fn format_defocus(range: Option<NumericRange>) -> String {
    match range {
        None => NOT_AVAILABLE.to_string(),
        Some(r) if r.is_constant() => format!("{:.1}", r.min),
        Some(r) => format!("{:.1} to {:.1}", r.max, r.min),
    }
}

/// Magnification grouped in thousands: `130 000 x`
pub(crate) fn format_magnification(range: Option<NumericRange>) -> String {
    let group = |m: f64| format!("{} x", group_thousands(m.round() as u64));
    match range {
        None => NOT_AVAILABLE.to_string(),
        Some(r) if r.is_constant() => group(r.min),
        Some(r) => format!("{} to {}", group(r.min), group(r.max)),
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Distinct values joined with `; `, `N/A` when there are none
pub(crate) fn join_distinct<T: Display>(values: &BTreeSet<T>) -> String {
    if values.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
