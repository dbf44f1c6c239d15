use std::collections::BTreeSet;
use std::path::Path;

use log::{debug, info, warn};

use super::discovery::{discover, DiscoveryRule};
use super::progress::Progress;
use super::{ResolvedRecord, SessionError, SessionSummary, SkippedFile};
use crate::calibration::CalibrationTable;
use crate::frames::{ContainerScanner, FrameInfo, FrameScanner};
use crate::metadata::{parse_file, ImageMetadataRecord};

static CONTAINER_SCANNER: ContainerScanner = ContainerScanner;

/// Builds a [`SessionSummary`] from a session directory.
///
/// # Example
///
/// ```rust,no_run
/// use epu_report::calibration::CalibrationTable;
/// use epu_report::session::SessionAggregator;
///
/// let calibration = CalibrationTable::new();
/// let summary = SessionAggregator::new(&calibration)
///     .with_progress(true)
///     .aggregate("Images-Disc1".as_ref())?;
/// println!("{} images", summary.records.len());
/// # Ok::<(), epu_report::session::SessionError>(())
/// ```
pub struct SessionAggregator<'a> {
    rule: DiscoveryRule,
    calibration: &'a CalibrationTable,
    scanner: Option<&'a dyn FrameScanner>,
    progress: bool,
    dump_records: bool,
}

impl<'a> SessionAggregator<'a> {
    /// Aggregator using the default discovery rule and container scanner
    pub fn new(calibration: &'a CalibrationTable) -> Self {
        Self {
            rule: DiscoveryRule::default(),
            calibration,
            scanner: Some(&CONTAINER_SCANNER),
            progress: false,
            dump_records: false,
        }
    }

    /// Set the discovery rule
    pub fn with_rule(mut self, rule: DiscoveryRule) -> Self {
        self.rule = rule;
        self
    }

    /// Set the frame scanner; `None` disables movie scanning
    pub fn with_scanner(mut self, scanner: Option<&'a dyn FrameScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Show a progress bar while parsing
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    /// Log every parsed record as JSON at debug level
    pub fn with_record_dump(mut self, enabled: bool) -> Self {
        self.dump_records = enabled;
        self
    }

    /// Discover, parse and resolve every metadata file under `root`
    pub fn aggregate(&self, root: &Path) -> Result<SessionSummary, SessionError> {
        let discovery = discover(root, &self.rule)?;
        info!(
            "Found {} metadata files in {} directories under {}",
            discovery.files.len(),
            discovery.directories,
            root.display()
        );

        let mut records = Vec::with_capacity(discovery.files.len());
        let mut skipped = Vec::new();
        let mut missing_movies = 0usize;

        let progress = Progress::bar(discovery.files.len() as u64, self.progress);
        for (index, path) in discovery.files.iter().enumerate() {
            debug!("XML file [{}]: {}", index + 1, path.display());

            match parse_file(path) {
                Ok(record) => {
                    if self.scanner.is_some() && record.companion.is_none() {
                        debug!("No movie file next to {}", path.display());
                        missing_movies += 1;
                    }
                    records.push(self.resolve(root, record));
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    skipped.push(SkippedFile {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            progress.inc();
        }
        progress.finish();

        if records.is_empty() {
            return Err(SessionError::NoData {
                root: root.to_path_buf(),
                discovered: discovery.files.len(),
                skipped: skipped.len(),
            });
        }

        if missing_movies > 0 {
            warn!(
                "{} of {} images have no movie file (EER, TIFF or MRC); frame counts unknown",
                missing_movies,
                records.len()
            );
        }
        check_frame_counts(&records);

        info!(
            "Parsed {} of {} metadata files ({} skipped)",
            records.len(),
            discovery.files.len(),
            skipped.len()
        );

        Ok(SessionSummary::new(
            root.to_path_buf(),
            records,
            skipped,
            discovery.directories,
            self.scanner.is_some(),
        ))
    }

    fn resolve(&self, root: &Path, record: ImageMetadataRecord) -> ResolvedRecord {
        if self.dump_records {
            match serde_json::to_string_pretty(&record) {
                Ok(json) => debug!("{}", json),
                Err(e) => debug!("Cannot serialize {}: {}", record.source.display(), e),
            }
        }

        let calibrated = self.calibration.lookup(record.nominal_magnification);
        let pixel_spacing = calibrated.unwrap_or(record.pixel_spacing);

        let frames = match (self.scanner, &record.companion) {
            (Some(scanner), Some(companion)) => scanner.scan(companion, record.exposure_time),
            _ => FrameInfo::Unknown,
        };

        ResolvedRecord {
            run_group: self.rule.run_group(root, &record.source),
            pixel_spacing,
            calibrated: calibrated.is_some(),
            frames,
            record,
        }
    }
}

/// Warn when movies of one session were recorded with different frame counts
fn check_frame_counts(records: &[ResolvedRecord]) {
    let counts: BTreeSet<u32> = records
        .iter()
        .filter_map(|r| r.frames.frame_count())
        .collect();
    if counts.len() > 1 {
        let listed: Vec<String> = counts.iter().map(u32::to_string).collect();
        warn!(
            "Movies have different numbers of frames: {}",
            listed.join(", ")
        );
    }
}
