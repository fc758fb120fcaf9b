//! Ports (trait definitions) for external dependencies
//!
//! This module defines the contracts (ports) that external adapters must implement.
//! Following hexagonal architecture, the domain defines what it needs, and the
//! infrastructure provides implementations.
//!
//! ## Static Dispatch
//!
//! We use native Rust async traits with `impl Future` return types instead of
//! `async_trait` so each adapter is monomorphized into the service.

use std::future::Future;

use crate::optimization::{OptimizationError, ValidatedUpload};

/// Port for the image encoder
///
/// This trait abstracts away the codec library. Implementations must:
/// - Decode the upload's bytes (sniffing the real format from the content)
/// - Produce a JPEG at the upload's resolved quality
/// - Convert any codec error to `OptimizationError::EncodingFailed`
///
/// Implementations should be deterministic: the same bytes at the same
/// quality must produce byte-identical output.
pub trait ImageEncoder: Send + Sync {
    /// Re-encode a validated upload as JPEG
    ///
    /// # Arguments
    ///
    /// * `upload` - The validated upload, carrying bytes and quality
    ///
    /// # Returns
    ///
    /// The encoded JPEG bytes
    ///
    /// # Errors
    ///
    /// Returns `OptimizationError::EncodingFailed` if the image cannot be
    /// decoded or encoded, `OptimizationError::Internal` for runtime failures
    fn encode(
        &self,
        upload: &ValidatedUpload,
    ) -> impl Future<Output = Result<Vec<u8>, OptimizationError>> + Send;
}
