/*!
 * Error types for the xform-editions application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * The split follows the failure semantics of the tool: `InputFormat` and
 * `Registry` errors are fatal and raised before any site is processed, while
 * per-site conditions (missing SID, duplicate archive member, unreadable
 * media file) are warnings that travel through the `Reporter` interface and
 * never abort sibling sites.
 */

use thiserror::Error;

/// Main application error type for the editions builder
#[derive(Error, Debug)]
pub enum EditionsError {
    /// A top-level input failed validation (wrong extension, missing column,
    /// non-numeric site code). Fatal, raised before processing starts.
    #[error("Expected {expected} for {resource}, got {actual}. Please check the file path and correct it.")]
    InputFormat {
        /// Human-readable name of the input (e.g. "XForm", "Site languages")
        resource: String,
        /// What the input was expected to be
        expected: String,
        /// What was actually found
        actual: String,
    },

    /// The site-languages workbook could not be opened or read
    #[error("Registry error: {0}")]
    Registry(String),

    /// The XForm document could not be parsed or rewritten
    #[error("XForm error: {0}")]
    Xml(String),

    /// The zip container could not be opened, created or appended to
    #[error("Archive error: {0}")]
    Archive(String),

    /// Error from a file operation
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditionsError {
    /// Build an `InputFormat` error from the three message parts.
    pub fn input_format(resource: &str, expected: &str, actual: &str) -> Self {
        Self::InputFormat {
            resource: resource.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

impl From<quick_xml::Error> for EditionsError {
    fn from(error: quick_xml::Error) -> Self {
        Self::Xml(error.to_string())
    }
}

impl From<calamine::XlsxError> for EditionsError {
    fn from(error: calamine::XlsxError) -> Self {
        Self::Registry(error.to_string())
    }
}

impl From<zip::result::ZipError> for EditionsError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Archive(error.to_string())
    }
}
