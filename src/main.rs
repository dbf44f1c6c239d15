//! # epu-report
//!
//! Command-line tool summarizing an EPU data collection session as an RTF
//! report.
//!
//! ## Usage
//!
//! ```bash
//! # Report on ./Images-Disc1, written to ./report.rtf
//! epu-report
//!
//! # Apply a calibration table, skip movie scanning
//! epu-report -d /data/session_42/Images-Disc1 -c calibration.csv -n -o session_42.rtf
//! ```
//!
//! Exits non-zero when no metadata file could be parsed, the calibration
//! table is invalid, or the report cannot be written.

mod cli;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity
    cli::init_logging(cli.verbosity(), cli.debug());

    cli::dispatch(cli)
}
