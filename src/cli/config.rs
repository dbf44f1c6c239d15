//! TOML configuration file support.
//!
//! Settings that rarely change between sessions of one facility can live in a
//! config file instead of on the command line:
//!
//! ```toml
//! # epu-report.toml
//! [session]
//! calibration = "/facility/krios2/calibration.csv"
//! no_scan = false
//!
//! [discovery]
//! data_dir = "Data"      # "" accepts any directory
//! file_prefix = "FoilHole"
//!
//! [report]
//! microscope = "Titan Krios G4"
//! collection_method = "AFIS"
//! spherical_aberration = 2.7
//! ```
//!
//! Command-line values override file values, which override defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure for epu-report.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Session input and output.
    #[serde(default)]
    pub session: SessionConfig,

    /// Metadata file discovery.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Values printed in the report that the metadata does not carry.
    #[serde(default)]
    pub report: ReportSection,
}

/// `[session]` table.
#[derive(Debug, Default, Deserialize)]
pub struct SessionConfig {
    /// Top-level images directory.
    pub directory: Option<PathBuf>,

    /// Magnification calibration table.
    pub calibration: Option<PathBuf>,

    /// Output RTF report.
    pub output: Option<PathBuf>,

    /// Skip counting frames in movie files.
    pub no_scan: Option<bool>,

    /// Show a progress bar.
    pub progress: Option<bool>,
}

/// `[discovery]` table.
#[derive(Debug, Default, Deserialize)]
pub struct DiscoveryConfig {
    /// Directory name holding per-image files; empty accepts any directory.
    pub data_dir: Option<String>,

    /// Required file name prefix.
    pub file_prefix: Option<String>,
}

/// `[report]` table.
#[derive(Debug, Default, Deserialize)]
pub struct ReportSection {
    /// Document title.
    pub title: Option<String>,

    /// Microscope name.
    pub microscope: Option<String>,

    /// Collection method, e.g. AFIS.
    pub collection_method: Option<String>,

    /// Spherical aberration in mm.
    pub spherical_aberration: Option<f64>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
