//! # epu-report - Session reports from EPU metadata
//!
//! `epu_report` reads the per-image XML metadata that Thermo Fisher EPU writes
//! during single-particle cryo-EM data collection and summarizes a whole
//! session in one RTF document: microscope and detector, optics, dose,
//! magnification and pixel size, defocus range, exposure and frame counts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use epu_report::config::ReportConfig;
//! use epu_report::pipeline;
//!
//! let config = ReportConfig {
//!     directory: "Images-Disc1".into(),
//!     calibration: Some("calibration.csv".into()),
//!     ..ReportConfig::default()
//! };
//!
//! let outcome = pipeline::run(&config)?;
//! println!("{}", outcome);
//! # Ok::<(), epu_report::pipeline::PipelineError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`]: one XML document to an [`ImageMetadataRecord`](metadata::ImageMetadataRecord)
//! - [`calibration`]: magnification to calibrated pixel spacing
//! - [`frames`]: frame counts of companion EER/TIFF/MRC movies
//! - [`session`]: discovery and aggregation into a [`SessionSummary`](session::SessionSummary)
//! - [`report`]: RTF rendering and atomic output
//! - [`pipeline`]: the end-to-end run driven by a [`ReportConfig`](config::ReportConfig)
//!
//! ## Units
//!
//! Values are normalized when parsed, whatever unit EPU stored them in:
//!
//! | Quantity | Unit |
//! |----------|------|
//! | Stage position, defocus | µm |
//! | Pixel spacing | Å |
//! | Exposure time | s |
//! | Accelerating voltage | kV |
//! | Stage tilt | degrees |
//! | Total dose | e/Å² |

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod calibration;
pub mod config;
pub mod frames;
pub mod metadata;
pub mod pipeline;
pub mod report;
pub mod session;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::calibration::{CalibrationError, CalibrationTable};
    pub use crate::config::ReportConfig;
    pub use crate::frames::{ContainerScanner, FrameInfo, FrameScanner};
    pub use crate::metadata::{
        parse_file, parse_reader, CompanionFile, ImageMetadataRecord, MovieFormat, ParseError,
        StagePosition,
    };
    pub use crate::pipeline::{run, PipelineError, RunOutcome};
    pub use crate::report::{write_atomic, ReportError, ReportOptions, ReportRenderer};
    pub use crate::session::{
        DiscoveryRule, SessionAggregator, SessionError, SessionStats, SessionSummary,
    };
}
