//! # Per-image metadata parsing
//!
//! Every image EPU acquires is accompanied by an XML document describing the
//! microscope, optics, detector and stage state at acquisition time. This
//! module turns one such document into an [`ImageMetadataRecord`].
//!
//! Required fields (timestamp, magnification, detector, exposure, stage
//! position, pixel spacing) must be present or parsing fails with a
//! [`ParseError`] naming the field. Optics, dose and software fields are
//! optional and come back as `None` when absent.

mod document;
mod error;
mod parser;
mod record;


pub use error::ParseError;
pub use parser::{parse_file, parse_reader};
pub use record::{CompanionFile, ImageMetadataRecord, MovieFormat, StagePosition};
