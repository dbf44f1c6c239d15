/// Errors that can occur while loading a magnification calibration table
#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    /// I/O error reading the table
    #[error("failed to read calibration table: {0}")]
    Io(#[from] std::io::Error),

    /// CSV/TSV parsing error
    #[error("calibration table parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// The same magnification appears on more than one line
    #[error("duplicate magnification {magnification} on lines {first_line} and {line}")]
    DuplicateMagnification {
        /// Normalized magnification key
        magnification: u64,
        /// Line of the first occurrence
        first_line: u64,
        /// Line of the repeated occurrence
        line: u64,
    },

    /// A row does not hold a usable magnification/pixel spacing pair
    #[error("invalid calibration row on line {line}: {message}")]
    InvalidRow {
        /// 1-based line number
        line: u64,
        /// What was wrong with the row
        message: String,
    },

    /// The table holds no entries
    #[error("calibration table contains no entries")]
    Empty,
}
