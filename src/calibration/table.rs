use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{debug, info};

use super::CalibrationError;

/// Normalize a magnification to its lookup key.
///
/// Instrument-reported magnifications are whole numbers that may carry
/// floating-point noise after unit handling, so keys are rounded to the
/// nearest integer magnification before comparison. Values that round to
/// zero have no key.
pub fn magnification_key(magnification: f64) -> Option<u64> {
    let rounded = magnification.round();
    (rounded.is_finite() && rounded >= 1.0).then_some(rounded as u64)
}

/// Mapping from nominal magnification to calibrated pixel spacing (Å)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationTable {
    entries: BTreeMap<u64, f64>,
}

impl CalibrationTable {
    /// Create an empty table (no overrides)
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the table at `path`, or an empty table when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, CalibrationError> {
        match path {
            Some(path) => {
                let table = Self::from_path(path)?;
                info!(
                    "Loaded {} calibration entries from {}",
                    table.len(),
                    path.display()
                );
                Ok(table)
            }
            None => Ok(Self::new()),
        }
    }

    /// Parse a calibration table from a CSV/TSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CalibrationError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a calibration table from a reader
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, CalibrationError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::parse(&content)
    }

    /// Parse a calibration table.
    ///
    /// Two columns, magnification then pixel spacing in Å, separated by commas
    /// or tabs. A leading header row and `#` comment lines are skipped.
    pub fn parse(content: &str) -> Result<Self, CalibrationError> {
        let delimiter = sniff_delimiter(content);
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut seen: BTreeMap<u64, (f64, u64)> = BTreeMap::new();
        let mut first_row = true;

        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(index as u64 + 1);
            let is_first = std::mem::replace(&mut first_row, false);

            let mag_text = record.get(0).unwrap_or_default();
            let Ok(magnification) = mag_text.parse::<f64>() else {
                // A header names both columns; a numeric spacing means a mistyped data row
                let spacing_is_number = record
                    .get(1)
                    .is_some_and(|s| s.parse::<f64>().is_ok());
                if is_first && !spacing_is_number {
                    debug!("Skipping calibration header row: {:?}", record);
                    continue;
                }
                return Err(invalid_row(line, format!("magnification '{mag_text}' is not a number")));
            };

            let key = magnification_key(magnification).ok_or_else(|| {
                invalid_row(line, format!("magnification '{mag_text}' must be at least 1"))
            })?;

            let spacing_text = record
                .get(1)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| invalid_row(line, "expected magnification and pixel spacing columns".to_string()))?;
            let spacing = spacing_text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v > 0.0)
                .ok_or_else(|| {
                    invalid_row(line, format!("pixel spacing '{spacing_text}' must be a positive number"))
                })?;

            if let Some((_, first_line)) = seen.get(&key) {
                return Err(CalibrationError::DuplicateMagnification {
                    magnification: key,
                    first_line: *first_line,
                    line,
                });
            }
            seen.insert(key, (spacing, line));
        }

        if seen.is_empty() {
            return Err(CalibrationError::Empty);
        }

        Ok(Self {
            entries: seen.into_iter().map(|(k, (v, _))| (k, v)).collect(),
        })
    }

    /// Calibrated pixel spacing for an exact magnification match
    pub fn lookup(&self, magnification: f64) -> Option<f64> {
        magnification_key(magnification).and_then(|key| self.entries.get(&key).copied())
    }

    /// Calibrated pixel spacing if the table has one, else `instrument_value`
    pub fn resolve(&self, magnification: f64, instrument_value: f64) -> f64 {
        self.lookup(magnification).unwrap_or(instrument_value)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table holds no overrides
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending magnification order
    pub fn iter(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }
}

fn invalid_row(line: u64, message: String) -> CalibrationError {
    CalibrationError::InvalidRow { line, message }
}

/// Tab if the first data line contains one, comma otherwise
fn sniff_delimiter(content: &str) -> u8 {
    let first = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'));
    match first {
        Some(line) if line.contains('\t') => b'\t',
        _ => b',',
    }
}
