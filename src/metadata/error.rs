/// Errors that can occur while parsing a per-image metadata document
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// I/O error reading the metadata file
    #[error("failed to read metadata file: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by the XML tokenizer
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Document is structurally broken (truncated, no root element, ...)
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// A required field is absent from the document
    #[error("missing {0}")]
    MissingField(&'static str),

    /// A field is present but its text cannot be interpreted
    #[error("invalid {field} value '{value}'")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Raw text found in the document
        value: String,
    },

    /// Pixel size differs between the x and y axes
    #[error("pixel size differs in x ({x}) and y ({y})")]
    AnisotropicPixel {
        /// Reported x pixel size in metres
        x: f64,
        /// Reported y pixel size in metres
        y: f64,
    },
}
