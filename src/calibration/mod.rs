//! # Magnification calibration
//!
//! The pixel spacing EPU records is the nominal value for the magnification
//! step. Facilities usually calibrate each step against a standard sample and
//! keep the results in a small two-column table:
//!
//! ```text
//! # magnification, pixel size (Å)
//! 105000, 0.83
//! 130000, 0.654
//! ```
//!
//! [`CalibrationTable::resolve`] substitutes the calibrated value for an
//! exact magnification match and otherwise returns the instrument value.

mod error;
mod table;

pub use error::CalibrationError;
pub use table::{magnification_key, CalibrationTable};
