//! Local checks run before anything is sent to the server

use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

use super::display::format_file_size;
use crate::optimization::{ImageFormat, Quality, DEFAULT_MAX_UPLOAD_SIZE};

/// Largest file the uploader will send (10 MiB, same as the server)
pub const MAX_FILE_SIZE: usize = DEFAULT_MAX_UPLOAD_SIZE;

/// How long an error notice stays visible
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

/// How long an optimized result stays available for download
pub const RESULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Uploader settings
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub max_file_size: usize,
    pub default_quality: Quality,
    pub notice_ttl: Duration,
    pub result_ttl: Duration,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            default_quality: Quality::DEFAULT,
            notice_ttl: NOTICE_TTL,
            result_ttl: RESULT_TTL,
        }
    }
}

/// Errors raised by the uploader before or around a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploaderError {
    #[error("Invalid file type '{mime}'. Only JPEG, PNG and WebP images are allowed")]
    InvalidType { mime: String },

    #[error("The file is too large. Maximum size: {}", format_file_size(*max as u64))]
    TooLarge { size: usize, max: usize },

    #[error("The selected file is empty")]
    Empty,

    #[error("No file selected")]
    NothingSelected,

    #[error("An optimization is already in progress")]
    Busy,

    #[error("No optimization is in progress")]
    NotSubmitting,
}

/// A file picked by the user, held entirely in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    mime: String,
    data: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared MIME type
    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Check a file against the allow-list and the size ceiling
///
/// Runs before any request is built; a failing file is never sent.
pub fn validate_file(file: &SelectedFile, config: &UploaderConfig) -> Result<ImageFormat, UploaderError> {
    let format = ImageFormat::from_mime(file.mime()).ok_or_else(|| UploaderError::InvalidType {
        mime: file.mime().to_string(),
    })?;

    if file.size() == 0 {
        return Err(UploaderError::Empty);
    }

    if file.size() > config.max_file_size {
        return Err(UploaderError::TooLarge {
            size: file.size(),
            max: config.max_file_size,
        });
    }

    Ok(format)
}
