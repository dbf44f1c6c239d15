use std::path::PathBuf;

/// Errors raised while writing a report
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The output file cannot be created or replaced
    #[error("cannot write report to {}: {source}", .path.display())]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}
