//! Optimization service - Business logic orchestration
//!
//! This module contains the core business logic for re-encoding uploads.
//! The service validates requests and coordinates with the encoder port.

use bytes::Bytes;

use super::{
    ImageFormat, OptimizationError, OptimizedImage, Quality, UploadRequest, ValidatedUpload,
};
use crate::ports::ImageEncoder;

/// Default upload ceiling: 10 MiB
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Configuration for the optimization service
#[derive(Debug, Clone)]
pub struct OptimizationConfig {
    /// Maximum accepted upload size in bytes (default: 10MiB)
    pub max_upload_size: usize,
    /// Quality used when the request carries none (default: 80)
    pub default_quality: Quality,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            default_quality: Quality::DEFAULT,
        }
    }
}

/// Service for optimizing uploaded images
///
/// This service encapsulates the business rules for re-encoding:
/// - Checks the declared MIME type against the allow-list
/// - Enforces the size ceiling and rejects empty files
/// - Resolves the quality, applying the default when absent
/// - Delegates the actual encoding to the encoder port
///
/// The service holds no per-request state and can be shared freely between
/// concurrent requests.
pub struct OptimizationService<E> {
    encoder: E,
    config: OptimizationConfig,
}

impl<E> OptimizationService<E>
where
    E: ImageEncoder,
{
    /// Create a new OptimizationService with the given encoder and configuration
    pub fn new(encoder: E, config: OptimizationConfig) -> Self {
        Self { encoder, config }
    }

    /// Create a new OptimizationService with default configuration
    pub fn with_encoder(encoder: E) -> Self {
        Self::new(encoder, OptimizationConfig::default())
    }

    /// Apply every business rule to a raw upload
    ///
    /// # Errors
    ///
    /// - `OptimizationError::UnsupportedType` if the MIME type is missing or not allowed
    /// - `OptimizationError::EmptyFile` if the payload is empty
    /// - `OptimizationError::FileTooLarge` if the payload exceeds the ceiling
    pub fn validate(&self, request: UploadRequest) -> Result<ValidatedUpload, OptimizationError> {
        // Business rule: only allow-listed formats
        let mime = request.content_type().unwrap_or_default();
        let format = ImageFormat::from_mime(mime)
            .ok_or_else(|| OptimizationError::unsupported_type(mime))?;

        // Business rule: cannot optimize nothing
        if request.size() == 0 {
            return Err(OptimizationError::EmptyFile);
        }

        // Business rule: enforce the size ceiling
        if request.size() > self.config.max_upload_size {
            return Err(OptimizationError::file_too_large(
                request.size(),
                self.config.max_upload_size,
            ));
        }

        let quality = request.quality().unwrap_or(self.config.default_quality);

        Ok(ValidatedUpload::new(request, format, quality))
    }

    /// Validate and re-encode an upload
    ///
    /// This is the main entry point. It:
    /// 1. Validates the upload according to business rules
    /// 2. Hands the validated upload to the encoder port
    /// 3. Wraps the output with the metadata the caller reports
    ///
    /// # Errors
    ///
    /// Any error from [`validate`](Self::validate), plus
    /// `OptimizationError::EncodingFailed` if the encoder fails
    pub async fn optimize(&self, request: UploadRequest) -> Result<OptimizedImage, OptimizationError> {
        let upload = self.validate(request)?;
        self.encode(&upload).await
    }

    /// Re-encode an upload that has already been validated
    pub async fn encode(&self, upload: &ValidatedUpload) -> Result<OptimizedImage, OptimizationError> {
        let encoded = self.encoder.encode(upload).await?;

        if encoded.is_empty() {
            return Err(OptimizationError::encoding_failed(
                "encoder produced no output",
            ));
        }

        Ok(OptimizedImage::new(upload, Bytes::from(encoded)))
    }

    /// Get the service configuration
    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }
}
