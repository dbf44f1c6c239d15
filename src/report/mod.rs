//! # RTF session report
//!
//! [`ReportRenderer`] turns a [`SessionSummary`](crate::session::SessionSummary)
//! into an RTF document with four parts:
//!
//! 1. Title and session header
//! 2. Parameter table (hardware and acquisition settings, aggregated over
//!    all images: one value, a `min to max` range, or distinct values)
//! 3. Acquisition runs and per-image details
//! 4. Skipped files, when any metadata file failed to parse
//!
//! [`write_atomic`] puts the result in place without ever leaving a partial
//! file behind.

mod error;
mod render;
mod rtf;
mod writer;

#[cfg(test)]
mod tests;

pub use error::ReportError;
pub use render::{ReportOptions, ReportRenderer};
pub use rtf::{escape, Cell, RtfDocument, Table};
pub use writer::write_atomic;
