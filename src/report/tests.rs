use super::render::{format_defocus, format_magnification, format_range, join_distinct};
use super::*;
use crate::frames::FrameInfo;
use crate::metadata::{CompanionFile, ImageMetadataRecord, MovieFormat, StagePosition};
use crate::session::{NumericRange, ResolvedRecord, SessionSummary, SkippedFile};
use chrono::DateTime;
use std::collections::BTreeSet;
use std::path::PathBuf;

fn record(name: &str, minute: u32, defocus: f64) -> ImageMetadataRecord {
    let source = PathBuf::from(format!("/session/GridSquare_1/Data/{name}.xml"));
    ImageMetadataRecord {
        companion: Some(CompanionFile {
            path: source.with_file_name(format!("{name}_EER.eer")),
            format: MovieFormat::Eer,
        }),
        source,
        timestamp: DateTime::parse_from_rfc3339(&format!("2024-11-05T14:{minute:02}:00+01:00"))
            .unwrap(),
        nominal_magnification: 130000.0,
        detector: "Falcon 4i".to_string(),
        exposure_time: 2.72,
        stage: StagePosition {
            x: 12.5,
            y: -3.5,
            z: 0.2,
            alpha: Some(0.0),
        },
        pixel_spacing: 0.93,
        voltage: Some(300.0),
        spot_index: Some(5),
        apertures: [Some("2000".to_string()), Some("50".to_string()), None],
        energy_slit_width: Some(10.0),
        defocus: Some(defocus),
        total_dose: Some(50.0),
        frame_rate: Some(250.0),
        software: Some("EPU".to_string()),
        software_version: Some("3.6.0.7203REL".to_string()),
        instrument_model: Some("TITAN52336320".to_string()),
    }
}

fn summary(scan_enabled: bool, skipped: Vec<SkippedFile>) -> SessionSummary {
    let records = [("FoilHole_1", 5, -0.8), ("FoilHole_2", 10, -2.0), ("FoilHole_3", 15, -1.5)]
        .into_iter()
        .map(|(name, minute, defocus)| {
            let record = record(name, minute, defocus);
            ResolvedRecord {
                run_group: "GridSquare_1".to_string(),
                pixel_spacing: record.pixel_spacing,
                calibrated: false,
                frames: if scan_enabled {
                    FrameInfo::from_count(40, record.exposure_time)
                } else {
                    FrameInfo::Unknown
                },
                record,
            }
        })
        .collect();
    SessionSummary::new(PathBuf::from("/session"), records, skipped, 1, scan_enabled)
}

/// Body cell as written by the table builder
fn cell(text: &str) -> String {
    format!("\\pard\\intbl\\ql{{\\fs20 {}}}\\cell", escape(text))
}

fn labelled(label: &str, value: &str) -> String {
    format!(
        "\\pard\\intbl\\ql{{\\fs20\\b {}}}\\cell\n{}",
        escape(label),
        cell(value)
    )
}

#[test]
fn test_parameter_values() {
    let options = ReportOptions {
        collection_method: Some("AFIS".to_string()),
        spherical_aberration: Some(2.7),
        ..ReportOptions::default()
    };
    let rtf = ReportRenderer::new(options).render(&summary(true, Vec::new()));

    assert!(rtf.contains(&labelled("Microscope", "TITAN52336320")));
    assert!(rtf.contains(&labelled("Detector", "Falcon 4i")));
    assert!(rtf.contains(&labelled("Accelerating voltage (kV)", "300")));
    assert!(rtf.contains(&labelled("Spherical aberration (mm)", "2.7")));
    assert!(rtf.contains(&labelled("Apertures (C1, C2, C3)", "2000, 50, N/A")));
    assert!(rtf.contains(&labelled("Spot size", "5")));
    assert!(rtf.contains(&labelled("Nominal magnification", "130 000 x")));
    assert!(rtf.contains(&labelled("Pixel size (Å)", "0.930")));
    assert!(rtf.contains(&labelled("Data collection", "EPU v 3.6.0")));
    assert!(rtf.contains(&labelled("Collection method", "AFIS")));
    assert!(rtf.contains(&labelled("Movie format", "eer")));
    assert!(rtf.contains(&labelled("Defocus range (µm)", "-0.8 to -2.0")));
    assert!(rtf.contains(&labelled("Exposure time (s)", "2.72")));
    assert!(rtf.contains(&labelled("Total dose (e/Å²)", "50.00")));
    assert!(rtf.contains(&labelled("Total frames (#)", "40")));
    assert!(rtf.contains(&labelled("Exposure per frame (s)", "0.0680")));
    assert!(rtf.contains(&labelled("Detector frame rate (Hz)", "250")));
}

#[test]
fn test_dose_rates() {
    let summary = summary(true, Vec::new());
    let resolved = &summary.records[0];
    assert!((resolved.dose_rate().unwrap() - 50.0 / 2.72).abs() < 1e-9);
    assert!((resolved.pixel_dose_rate().unwrap() - 50.0 / 2.72 * 0.93 * 0.93).abs() < 1e-9);

    let rtf = ReportRenderer::default().render(&summary);
    assert!(rtf.contains(&labelled("Dose (e/Å²/s)", "18.38")));
    assert!(rtf.contains(&labelled("Dose (e/px/s)", "15.90")));
}

#[test]
fn test_dose_rate_needs_dose_and_exposure() {
    let mut summary = summary(true, Vec::new());
    let resolved = &mut summary.records[0];
    resolved.record.exposure_time = 0.0;
    assert_eq!(resolved.dose_rate(), None);
    resolved.record.exposure_time = 2.0;
    resolved.record.total_dose = None;
    assert_eq!(resolved.pixel_dose_rate(), None);
}

#[test]
fn test_parameter_columns_padded() {
    let rtf = ReportRenderer::default().render(&summary(true, Vec::new()));

    // The acquisition column is longer; its last rows sit beside empty cells
    assert!(rtf.contains(&format!(
        "{}\n{}\n{}",
        cell(""),
        cell(""),
        labelled("Calibrated pixel size", "no")
    )));
}

#[test]
fn test_detail_and_run_tables() {
    let rtf = ReportRenderer::default().render(&summary(true, Vec::new()));

    assert!(rtf.contains(&cell("GridSquare_1/Data/FoilHole_2.xml")));
    assert!(rtf.contains(&cell("2024-11-05 14:10:00")));
    assert!(rtf.contains(&cell("-2.0")));
    assert!(rtf.contains(&cell("0.930")));

    // One run spanning all three images
    assert!(rtf.contains(&format!(
        "{}\n{}\n{}\n{}",
        cell("GridSquare_1"),
        cell("3"),
        cell("2024-11-05 14:05:00"),
        cell("2024-11-05 14:15:00")
    )));
    assert!(!rtf.contains("Skipped files"));
}

#[test]
fn test_scan_disabled_frames_not_available() {
    let rtf = ReportRenderer::default().render(&summary(false, Vec::new()));

    assert!(rtf.contains(&labelled("Total frames (#)", "N/A")));
    assert!(rtf.contains(&labelled("Exposure per frame (s)", "N/A")));
    assert!(rtf.contains("Movie scanning disabled"));
    assert!(!rtf.contains(&cell("40")));
}

#[test]
fn test_skipped_files_section() {
    let skipped = vec![SkippedFile {
        path: PathBuf::from("/session/GridSquare_1/Data/FoilHole_9.xml"),
        reason: "missing exposure".to_string(),
    }];
    let rtf = ReportRenderer::default().render(&summary(true, skipped));

    assert!(rtf.contains("Skipped files"));
    assert!(rtf.contains(&format!(
        "{}\n{}",
        cell("GridSquare_1/Data/FoilHole_9.xml"),
        cell("missing exposure")
    )));
    assert!(rtf.contains("4 found, 3 parsed, 1 skipped"));
}

#[test]
fn test_render_is_deterministic() {
    let renderer = ReportRenderer::default();
    let first = renderer.render(&summary(true, Vec::new()));
    let second = renderer.render(&summary(true, Vec::new()));
    assert_eq!(first, second);
}

#[test]
fn test_defaults_without_options() {
    let mut summary = summary(true, Vec::new());
    for resolved in &mut summary.records {
        resolved.record.instrument_model = None;
    }
    let summary = SessionSummary::new(
        summary.root,
        summary.records,
        summary.skipped,
        summary.directories,
        summary.scan_enabled,
    );
    let rtf = ReportRenderer::default().render(&summary);

    assert!(rtf.contains(&labelled("Microscope", "N/A")));
    assert!(rtf.contains(&labelled("Collection method", "N/A")));
    assert!(rtf.contains(&labelled("Spherical aberration (mm)", "N/A")));
}

#[test]
fn test_value_formatting() {
    let range = |values: &[f64]| NumericRange::from_values(values.iter().copied());

    assert_eq!(format_magnification(range(&[130000.0])), "130 000 x");
    assert_eq!(format_magnification(range(&[1050000.0])), "1 050 000 x");
    assert_eq!(format_magnification(range(&[500.0])), "500 x");
    assert_eq!(
        format_magnification(range(&[105000.0, 130000.0])),
        "105 000 x to 130 000 x"
    );

    assert_eq!(format_range(range(&[2.72]), 2), "2.72");
    assert_eq!(format_range(range(&[1.0, 3.0]), 2), "1.00 to 3.00");
    assert_eq!(format_range(None, 2), "N/A");
    assert_eq!(format_defocus(range(&[-1.5])), "-1.5");

    assert_eq!(join_distinct(&BTreeSet::<String>::new()), "N/A");
    let set: BTreeSet<&str> = ["Falcon 4i", "K3"].into_iter().collect();
    assert_eq!(join_distinct(&set), "Falcon 4i; K3");
}
