//! Straight-line report run: load calibration, aggregate the session, render
//! and write the report.
//!
//! Nothing is written unless every step before the write succeeded.

use std::fmt;
use std::path::PathBuf;

#[cfg(feature = "colorized_output")]
use console::style;
use log::info;

use crate::calibration::{CalibrationError, CalibrationTable};
use crate::config::ReportConfig;
use crate::frames::{ContainerScanner, FrameScanner};
use crate::report::{write_atomic, ReportError, ReportRenderer};
use crate::session::{SessionAggregator, SessionError, SessionSummary};

/// Fatal errors of a report run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The calibration table cannot be used
    #[error("invalid calibration table: {0}")]
    Calibration(#[from] CalibrationError),

    /// The session yields no usable metadata
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The report cannot be written
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Result of a successful run
#[derive(Debug)]
pub struct RunOutcome {
    /// Where the report was written
    pub output: PathBuf,
    /// Size of the report in bytes
    pub bytes: usize,
    /// Aggregated session
    pub summary: SessionSummary,
}

/// Run with the built-in movie scanner
pub fn run(config: &ReportConfig) -> Result<RunOutcome, PipelineError> {
    run_with_scanner(config, &ContainerScanner)
}

/// Run with a caller-supplied movie scanner; it is never invoked when
/// `config.scan_movies` is false
pub fn run_with_scanner(
    config: &ReportConfig,
    scanner: &dyn FrameScanner,
) -> Result<RunOutcome, PipelineError> {
    let calibration = CalibrationTable::load(config.calibration.as_deref())?;

    let summary = SessionAggregator::new(&calibration)
        .with_rule(config.discovery.clone())
        .with_scanner(config.scan_movies.then_some(scanner))
        .with_progress(config.show_progress())
        .with_record_dump(config.debug)
        .aggregate(&config.directory)?;

    let contents = ReportRenderer::new(config.report.clone()).render(&summary);
    write_atomic(&config.output, &contents)?;
    info!("Report written to {}", config.output.display());

    Ok(RunOutcome {
        output: config.output.clone(),
        bytes: contents.len(),
        summary,
    })
}

impl RunOutcome {
    /// Format the run summary with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            let summary = &self.summary;
            let mut output = String::new();

            output.push_str(&format!("{}\n", style("EPU Session Report").bold().cyan()));
            output.push_str(&format!("{}\n", style("==================").cyan()));
            output.push_str(&format!(
                "{}: {}\n",
                style("Session").bold(),
                summary.root.display()
            ));
            output.push_str(&format!(
                "{}: {} ({} bytes)\n\n",
                style("Report").bold(),
                self.output.display(),
                self.bytes
            ));

            output.push_str(&format!(
                "{}: {} parsed, {} skipped, {} runs\n",
                style("Images").bold(),
                style(summary.records.len()).green(),
                if summary.skipped.is_empty() {
                    style(summary.skipped.len()).green()
                } else {
                    style(summary.skipped.len()).yellow()
                },
                summary.groups.len()
            ));
            output.push_str(&format!("{}: {}\n", style("Frames").bold(), frames_line(summary)));

            for skipped in &summary.skipped {
                output.push_str(&format!(
                    " - {}: {}: {}\n",
                    style("SKIPPED").yellow().bold(),
                    skipped.path.display(),
                    skipped.reason
                ));
            }

            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

fn frames_line(summary: &SessionSummary) -> String {
    if !summary.scan_enabled {
        return "not scanned".to_string();
    }
    match summary.stats.frame_count {
        Some(r) if r.is_constant() => format!("{:.0} per movie", r.min),
        Some(r) => format!("{:.0} to {:.0} per movie", r.min, r.max),
        None => "unknown".to_string(),
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = &self.summary;
        writeln!(f, "EPU Session Report")?;
        writeln!(f, "==================")?;
        writeln!(f, "Session: {}", summary.root.display())?;
        writeln!(f, "Report: {} ({} bytes)", self.output.display(), self.bytes)?;
        writeln!(f)?;
        writeln!(
            f,
            "Images: {} parsed, {} skipped, {} runs",
            summary.records.len(),
            summary.skipped.len(),
            summary.groups.len()
        )?;
        writeln!(f, "Frames: {}", frames_line(summary))?;

        for skipped in &summary.skipped {
            writeln!(f, " - SKIPPED: {}: {}", skipped.path.display(), skipped.reason)?;
        }
        Ok(())
    }
}
