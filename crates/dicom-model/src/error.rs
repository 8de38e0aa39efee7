//! Error types shared across the DICOM toolkit.

use thiserror::Error;

use crate::tag::Tag;

/// Errors that can occur while decoding or manipulating DICOM data sets.
#[derive(Debug, Error)]
pub enum DicomError {
    /// Malformed input data (bad hex or numeric literal, invalid base64 group,
    /// unparsable date/time text).
    #[error("malformed input: {message}")]
    MalformedInput { message: String },

    /// No dictionary entry for the tag and no explicit VR supplied.
    #[error("cannot resolve VR of {tag}")]
    UnresolvedVr { tag: Tag },

    /// A close event arrived without a matching open context.
    #[error("structural error: {message}")]
    Structural { message: String },

    /// Invalid configuration, detected before any data is processed.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for DICOM operations.
pub type Result<T> = std::result::Result<T, DicomError>;

impl DicomError {
    /// Create a MalformedInput error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    /// Create a Structural error.
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
        }
    }

    /// Create a Configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an UnresolvedVr error.
    pub fn unresolved_vr(tag: Tag) -> Self {
        Self::UnresolvedVr { tag }
    }
}
