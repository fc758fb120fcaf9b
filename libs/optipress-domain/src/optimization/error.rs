//! Domain errors for optimization operations
//!
//! This module defines all possible errors that can occur while validating
//! and re-encoding an upload. These are domain-level errors; the HTTP layer
//! decides how each one is reported.

use thiserror::Error;

use super::format::ImageFormat;

/// Errors that can occur during image optimization
///
/// Validation variants describe the caller's mistake and are safe to show.
/// `EncodingFailed` and `Internal` carry infrastructure detail that must only
/// be logged.
#[derive(Error, Debug)]
pub enum OptimizationError {
    /// The request did not contain an image file
    #[error("No image file was provided")]
    MissingFile,

    /// The image file contained no bytes
    #[error("The uploaded file is empty")]
    EmptyFile,

    /// The declared MIME type is not in the allow-list
    #[error("File type '{mime}' is not allowed. Only {} images are accepted", ImageFormat::allowed_list())]
    UnsupportedType { mime: String },

    /// The image file exceeds the configured byte ceiling
    #[error("File size ({size} bytes) exceeds maximum allowed ({max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    /// The quality value is not an integer within range
    #[error("Quality must be an integer between 10 and 100 (got '{value}')")]
    QualityOutOfRange { value: String },

    /// The request itself is malformed (bad multipart body, duplicate fields)
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// The encoder could not decode or re-encode the image
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// An unexpected internal error occurred
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OptimizationError {
    /// Create an unsupported type error
    pub fn unsupported_type(mime: impl Into<String>) -> Self {
        Self::UnsupportedType { mime: mime.into() }
    }

    /// Create a file too large error
    pub fn file_too_large(size: usize, max: usize) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create a quality out of range error
    pub fn quality_out_of_range(value: impl Into<String>) -> Self {
        Self::QualityOutOfRange {
            value: value.into(),
        }
    }

    /// Create an invalid upload error with a message
    pub fn invalid_upload(msg: impl Into<String>) -> Self {
        Self::InvalidUpload(msg.into())
    }

    /// Create an encoding failure with a message
    pub fn encoding_failed(msg: impl Into<String>) -> Self {
        Self::EncodingFailed(msg.into())
    }

    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::EncodingFailed(_) | Self::Internal(_))
    }
}

/// Result type alias for optimization operations
pub type Result<T> = std::result::Result<T, OptimizationError>;
