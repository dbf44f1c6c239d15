//! # Session aggregation
//!
//! A session is a directory tree written by EPU during one data collection.
//! Aggregation walks the tree, parses every per-image metadata file, applies
//! the calibration table, counts movie frames and folds the result into an
//! immutable [`SessionSummary`].
//!
//! ## Layout
//!
//! ```text
//! Images-Disc1/
//! ├── GridSquare_8473121/
//! │   ├── GridSquare_20241105_142011.xml      (ignored)
//! │   └── Data/
//! │       ├── FoilHole_8480127_Data_8474421_6_20241105_143210.xml
//! │       └── FoilHole_8480127_Data_8474421_6_20241105_143210_EER.eer
//! └── GridSquare_8473189/
//!     └── Data/
//!         └── ...
//! ```
//!
//! Files that fail to parse are kept in a skip list with the reason; a
//! session with no parsable file at all is an error.

mod aggregator;
mod discovery;
mod error;
mod progress;
mod summary;


pub use aggregator::SessionAggregator;
pub use discovery::{discover, Discovery, DiscoveryRule};
pub use error::SessionError;
pub use progress::Progress;
pub use summary::{
    NumericRange, ResolvedRecord, RunGroup, SessionStats, SessionSummary, SkippedFile,
};
