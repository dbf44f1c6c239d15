//! Run configuration shared by the library pipeline and the command line.

use std::path::PathBuf;

use crate::report::ReportOptions;
use crate::session::DiscoveryRule;

/// Default session root, as written by EPU
pub const DEFAULT_DIRECTORY: &str = "Images-Disc1";
/// Default report path
pub const DEFAULT_OUTPUT: &str = "report.rtf";

/// Everything one report run needs; built once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    /// Session root directory
    pub directory: PathBuf,
    /// Optional magnification calibration table
    pub calibration: Option<PathBuf>,
    /// Report destination
    pub output: PathBuf,
    /// Count frames in companion movies
    pub scan_movies: bool,
    /// Show a progress bar while parsing
    pub progress: bool,
    /// Extra diagnostics: every parsed record is logged as JSON
    pub debug: bool,
    /// Which files count as per-image metadata
    pub discovery: DiscoveryRule,
    /// Report values not present in the metadata
    pub report: ReportOptions,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            calibration: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            scan_movies: true,
            progress: false,
            debug: false,
            discovery: DiscoveryRule::default(),
            report: ReportOptions::default(),
        }
    }
}

impl ReportConfig {
    /// Progress bar is shown only when requested and debug output is off
    pub fn show_progress(&self) -> bool {
        self.progress && !self.debug
    }
}
