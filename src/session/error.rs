use std::path::PathBuf;

/// Fatal errors raised while aggregating a session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session root cannot be read
    #[error("cannot read session directory {}: {source}", .path.display())]
    Root {
        /// Configured root directory
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Not a single metadata file could be parsed
    #[error(
        "no metadata could be parsed under {} ({discovered} files found, {skipped} skipped)",
        .root.display()
    )]
    NoData {
        /// Configured root directory
        root: PathBuf,
        /// Number of metadata files discovered
        discovered: usize,
        /// Number of discovered files that failed to parse
        skipped: usize,
    },
}
